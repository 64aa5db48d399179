//! Configuration for research runs
//!
//! Loads configuration from, in increasing priority:
//! 1. Default values
//! 2. A TOML file (`--config PATH`, or `./research-assistant.toml` if present)
//! 3. `RESEARCH_*` environment variables
//! 4. Command-line flags
//!
//! ```toml
//! topic = "Impact of generative AI on higher education"
//! tags = ["research_workflow", "generative_ai_education"]
//! max_transitions = 25
//! interactive_approval = false
//! log_level = "warn"
//!
//! [pacing]
//! enabled = true
//! delay_scale = 1.0
//!
//! [diagram]
//! enabled = true
//! path = "research_assistant_mockup.png"
//! ```

use crate::error::ConfigError;
use crate::state::DEFAULT_TOPIC;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Project-level config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "research-assistant.toml";

pub const ENV_TOPIC: &str = "RESEARCH_TOPIC";
pub const ENV_TAGS: &str = "RESEARCH_TAGS";
pub const ENV_MAX_TRANSITIONS: &str = "RESEARCH_MAX_TRANSITIONS";
pub const ENV_DELAY_SCALE: &str = "RESEARCH_DELAY_SCALE";
pub const ENV_INTERACTIVE: &str = "RESEARCH_INTERACTIVE";
pub const ENV_LOG_LEVEL: &str = "RESEARCH_LOG_LEVEL";
pub const ENV_DIAGRAM_PATH: &str = "RESEARCH_DIAGRAM_PATH";

/// Main research assistant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Research topic
    pub topic: String,

    /// Tags attached to the run
    pub tags: Vec<String>,

    /// Maximum step executions per run; 0 disables the guard
    pub max_transitions: usize,

    /// Ask a human to approve the draft instead of auto-approving
    pub interactive_approval: bool,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Simulated load pacing
    pub pacing: PacingConfig,

    /// Diagram export
    pub diagram: DiagramConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            tags: vec![
                "research_workflow".to_string(),
                "generative_ai_education".to_string(),
            ],
            max_transitions: 25,
            interactive_approval: false,
            log_level: "warn".to_string(),
            pacing: PacingConfig::default(),
            diagram: DiagramConfig::default(),
            source: None,
        }
    }
}

/// Simulated load pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Draw progress bars and sleep at all
    pub enabled: bool,

    /// Multiplier applied to every simulated duration
    pub delay_scale: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_scale: 1.0,
        }
    }
}

/// Diagram export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub enabled: bool,

    /// Output file; the extension selects the format
    pub path: PathBuf,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("research_assistant_mockup.png"),
        }
    }
}

/// Overrides collected from command-line flags
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub topic: Option<String>,
    pub tags: Vec<String>,
    pub max_transitions: Option<usize>,
    pub interactive: bool,
    pub fast: bool,
    pub diagram_path: Option<PathBuf>,
    pub no_diagram: bool,
}

impl AppConfig {
    /// Parse configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Apply `RESEARCH_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(get_env)
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        if let Some(topic) = lookup(ENV_TOPIC)? {
            self.topic = topic;
        }
        if let Some(tags) = lookup(ENV_TAGS)? {
            self.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(max) = parse_var::<usize, _>(&lookup, ENV_MAX_TRANSITIONS)? {
            self.max_transitions = max;
        }
        if let Some(scale) = parse_var::<f64, _>(&lookup, ENV_DELAY_SCALE)? {
            self.pacing.delay_scale = scale;
        }
        if let Some(value) = lookup(ENV_INTERACTIVE)? {
            self.interactive_approval = parse_bool(ENV_INTERACTIVE, &value)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL)? {
            self.log_level = level;
        }
        if let Some(path) = lookup(ENV_DIAGRAM_PATH)? {
            self.diagram.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Apply command-line flags
    pub fn apply_cli(&mut self, overrides: ConfigOverrides) {
        if let Some(topic) = overrides.topic {
            self.topic = topic;
        }
        if !overrides.tags.is_empty() {
            self.tags = overrides.tags;
        }
        if let Some(max) = overrides.max_transitions {
            self.max_transitions = max;
        }
        if overrides.interactive {
            self.interactive_approval = true;
        }
        if overrides.fast {
            self.pacing.enabled = false;
        }
        if let Some(path) = overrides.diagram_path {
            self.diagram.path = path;
        }
        if overrides.no_diagram {
            self.diagram.enabled = false;
        }
    }

    /// Reject values the workflow cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::invalid("topic", "must not be empty"));
        }
        let scale = self.pacing.delay_scale;
        if !scale.is_finite() || scale < 0.0 {
            return Err(ConfigError::invalid(
                "pacing.delay_scale",
                format!("must be a finite, non-negative number (got {})", scale),
            ));
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.log_level) {
            return Err(ConfigError::invalid("log_level", e.to_string()));
        }
        Ok(())
    }

    /// Log where the configuration came from
    ///
    /// Called once the subscriber is installed, since loading happens first.
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => info!(path = %path.display(), "Loaded configuration file"),
            None => debug!("No configuration file found, using defaults"),
        }
    }

    /// Engine recursion limit derived from `max_transitions`
    pub fn recursion_limit(&self) -> Option<usize> {
        (self.max_transitions > 0).then_some(self.max_transitions)
    }
}

/// Configuration loader for file, environment and defaults
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    /// Loader reading `path` if given, else the project config file if present
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            explicit_path: path,
            project_config_path: PathBuf::from(PROJECT_CONFIG_FILE),
        }
    }

    /// Load defaults, then the config file, then environment overrides
    pub async fn load(&self) -> Result<AppConfig> {
        let mut config = match &self.explicit_path {
            Some(path) => self.load_from_path(path).await?,
            None => match self.load_from_path(&self.project_config_path).await {
                Ok(config) => config,
                Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                    AppConfig::default()
                }
                Err(e) => return Err(e),
            },
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    async fn load_from_path(&self, path: &Path) -> Result<AppConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = AppConfig::from_toml_str(&content, path)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }
}

/// Load an environment variable as a string
///
/// Returns `Ok(None)` when unset and an error when set to invalid UTF-8.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::invalid(key, "contains invalid UTF-8")),
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<Option<String>>,
{
    match lookup(key)? {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, format!("'{}': {}", val, e))),
        None => Ok(None),
    }
}

/// Parse a boolean flag: true/1/yes/on or false/0/no/off
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("'{}' is not a boolean", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| Ok(vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.topic, DEFAULT_TOPIC);
        assert_eq!(config.tags, vec!["research_workflow", "generative_ai_education"]);
        assert_eq!(config.recursion_limit(), Some(25));
        assert!(!config.interactive_approval);
        assert_eq!(config.diagram.path, PathBuf::from("research_assistant_mockup.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            "topic = \"Rust in embedded systems\"\n[pacing]\ndelay_scale = 0.1\n",
            Path::new("inline.toml"),
        )
        .unwrap();

        assert_eq!(config.topic, "Rust in embedded systems");
        assert_eq!(config.pacing.delay_scale, 0.1);
        assert!(config.pacing.enabled);
        assert_eq!(config.max_transitions, 25);
        assert!(config.diagram.enabled);
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let err = AppConfig::from_toml_str("topic = [", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides_from(lookup_from(&[
                (ENV_TOPIC, "Quantum error correction"),
                (ENV_TAGS, "physics, survey ,"),
                (ENV_MAX_TRANSITIONS, "0"),
                (ENV_DELAY_SCALE, "0.2"),
                (ENV_INTERACTIVE, "yes"),
            ]))
            .unwrap();

        assert_eq!(config.topic, "Quantum error correction");
        assert_eq!(config.tags, vec!["physics", "survey"]);
        assert_eq!(config.recursion_limit(), None);
        assert_eq!(config.pacing.delay_scale, 0.2);
        assert!(config.interactive_approval);
    }

    #[test]
    fn test_env_parse_errors() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides_from(lookup_from(&[(ENV_MAX_TRANSITIONS, "many")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_TRANSITIONS));

        let err = config
            .apply_overrides_from(lookup_from(&[(ENV_INTERACTIVE, "sometimes")]))
            .unwrap_err();
        assert!(err.to_string().contains("not a boolean"));
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(lookup_from(&[(ENV_TOPIC, "from env")])).unwrap();
        config.apply_cli(ConfigOverrides {
            topic: Some("from cli".to_string()),
            tags: vec!["cli".to_string()],
            max_transitions: Some(8),
            fast: true,
            no_diagram: true,
            ..Default::default()
        });

        assert_eq!(config.topic, "from cli");
        assert_eq!(config.tags, vec!["cli"]);
        assert_eq!(config.recursion_limit(), Some(8));
        assert!(!config.pacing.enabled);
        assert!(!config.diagram.enabled);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.topic = "   ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { ref key, .. }) if key == "topic"));

        let mut config = AppConfig::default();
        config.pacing.delay_scale = -1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pacing.delay_scale = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        for value in ["true", "1", "YES", " on "] {
            assert!(parse_bool("K", value).unwrap());
        }
        for value in ["false", "0", "no", "Off"] {
            assert!(!parse_bool("K", value).unwrap());
        }
    }

    #[tokio::test]
    async fn test_loader_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "topic = \"Soil microbiomes\"\nmax_transitions = 12\n").unwrap();

        let config = ConfigLoader::new(Some(path.clone())).load().await.unwrap();

        assert_eq!(config.max_transitions, 12);
        assert_eq!(config.source, Some(path));
        if env::var(ENV_TOPIC).is_err() {
            assert_eq!(config.topic, "Soil microbiomes");
        }
    }

    #[tokio::test]
    async fn test_loader_without_project_file_has_no_source() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader {
            explicit_path: None,
            project_config_path: dir.path().join(PROJECT_CONFIG_FILE),
        };

        let config = loader.load().await.unwrap();

        assert_eq!(config.source, None);
        config.log_source();
    }

    #[tokio::test]
    async fn test_loader_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new(Some(dir.path().join("absent.toml")))
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

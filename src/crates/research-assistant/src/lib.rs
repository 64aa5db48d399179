//! # research-assistant
//!
//! A simulated research assistant built on `stepgraph-core`. Six mock steps
//! generate queries, search, evaluate, refine, draft a report and ask for
//! approval; two routers decide whether to refine again and whether the
//! draft is accepted.
//!
//! ## Modules
//!
//! - [`state`] - [`ResearchState`] and its partial [`ResearchUpdate`]
//! - [`steps`] - The [`ResearchStep`] registry and mock step functions
//! - [`routers`] - Routing decisions and their declared destinations
//! - [`workflow`] - Graph assembly and the suspend/resume review loop
//! - [`progress`] - Simulated load with a console progress bar
//! - [`diagram`] - Diagram export (Mermaid, DOT, ASCII, Graphviz images)
//! - [`config`] - TOML, environment and CLI configuration
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Application error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use research_assistant::{ResearchState, ResearchWorkflow, StepContext};
//!
//! # async fn example() -> research_assistant::Result<()> {
//! let workflow = ResearchWorkflow::new(StepContext::quiet())?;
//! let final_state = workflow.graph().invoke(ResearchState::new("Soil microbiomes")).await?;
//! assert!(final_state.is_approved());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagram;
pub mod error;
pub mod logging;
pub mod progress;
pub mod routers;
pub mod state;
pub mod steps;
pub mod workflow;

pub use config::{AppConfig, ConfigLoader, ConfigOverrides};
pub use diagram::{export_diagram, save_graph_image, DiagramExporter, RenderError};
pub use error::{AppError, ConfigError, Result, StepError};
pub use progress::Pacer;
pub use state::{ResearchState, ResearchUpdate};
pub use steps::{ResearchStep, StepContext};
pub use workflow::{build_graph, run_config, ApprovalPrompt, Decision, ResearchGraph, ResearchWorkflow};

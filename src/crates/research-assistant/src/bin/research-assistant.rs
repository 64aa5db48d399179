//! Research Assistant CLI - simulated research workflow on the stepgraph engine
//!
//! Main entry point for the research-assistant command-line tool.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::Select;
use research_assistant::logging::init_tracing;
use research_assistant::{
    export_diagram, run_config, save_graph_image, AppConfig, AppError, ApprovalPrompt, ConfigLoader, ConfigOverrides, Decision,
    DiagramExporter, Pacer, ResearchState, ResearchWorkflow, StepContext,
};
use std::path::PathBuf;
use stepgraph_core::VisualizationOptions;

#[derive(Parser)]
#[command(name = "research-assistant")]
#[command(about = "Research Assistant - simulated research workflow with human review", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (defaults to ./research-assistant.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the research workflow (default)
    Run(RunArgs),

    /// Print or export the workflow diagram
    Diagram(DiagramArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// Research topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Run tag; repeat for several
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Diagram output file; the extension selects the format
    #[arg(long, conflicts_with = "no_diagram")]
    diagram: Option<PathBuf>,

    /// Skip diagram export
    #[arg(long)]
    no_diagram: bool,

    /// Ask for approval instead of auto-approving the draft
    #[arg(short, long)]
    interactive: bool,

    /// Maximum step executions per run (0 disables the guard)
    #[arg(long)]
    max_transitions: Option<usize>,

    /// Skip simulated delays and progress bars
    #[arg(long)]
    fast: bool,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            topic: self.topic.clone(),
            tags: self.tags.clone(),
            max_transitions: self.max_transitions,
            interactive: self.interactive,
            fast: self.fast,
            diagram_path: self.diagram.clone(),
            no_diagram: self.no_diagram,
        }
    }
}

#[derive(Args)]
struct DiagramArgs {
    /// Format printed to stdout when no output file is given
    #[arg(short, long, value_enum, default_value_t = DiagramFormatArg::Mermaid)]
    format: DiagramFormatArg,

    /// Output file; the extension selects the format
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagramFormatArg {
    Mermaid,
    Dot,
    Ascii,
}

impl DiagramFormatArg {
    fn options(self) -> VisualizationOptions {
        match self {
            DiagramFormatArg::Mermaid => VisualizationOptions::mermaid(),
            DiagramFormatArg::Dot => VisualizationOptions::dot(),
            DiagramFormatArg::Ascii => VisualizationOptions::ascii(),
        }
    }
}

/// Review decisions read from the terminal
struct TerminalApproval;

impl ApprovalPrompt for TerminalApproval {
    fn decide(&mut self, _draft: &str) -> research_assistant::Result<Decision> {
        let choice = Select::new()
            .with_prompt("Approve this report?")
            .items(&["Approve", "Retry research"])
            .default(0)
            .interact()
            .map_err(|e| AppError::Prompt(e.to_string()))?;

        Ok(if choice == 0 { Decision::Approve } else { Decision::Retry })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new(cli.config)
        .load()
        .await
        .context("Failed to load configuration")?;

    let command = cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default()));
    if let Commands::Run(args) = &command {
        config.apply_cli(args.overrides());
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.log_level);
    config.log_source();

    match command {
        Commands::Run(_) => run(config).await,
        Commands::Diagram(args) => diagram(config, args).await,
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("{}", "Starting Research Assistant".bold().cyan());
    println!("   Topic: {}", config.topic);
    if config.interactive_approval {
        println!("   Review: {}", "interactive".yellow());
    }

    let ctx = StepContext::new(Pacer::from_config(&config.pacing), config.interactive_approval);
    let workflow = ResearchWorkflow::new(ctx).context("Failed to build research workflow")?;

    if config.diagram.enabled {
        save_graph_image(&DiagramExporter::new(), workflow.graph(), &config.diagram.path).await;
    }

    let summary = workflow
        .run(
            ResearchState::new(config.topic.clone()),
            run_config(&config),
            &mut TerminalApproval,
        )
        .await
        .context("Research run failed")?;

    println!("\n{}", "Process finished successfully.".green().bold());
    println!("\n{}\n{}", "Final report:".bold(), summary.state.report_draft);
    println!(
        "\n{} {} iterations, {} step executions (run {})",
        "Summary:".bold(),
        summary.state.iteration_count,
        summary.steps,
        summary.run_id
    );
    Ok(())
}

async fn diagram(config: AppConfig, args: DiagramArgs) -> anyhow::Result<()> {
    let workflow = ResearchWorkflow::new(StepContext::quiet().with_interactive_approval(config.interactive_approval))
        .context("Failed to build research workflow")?;

    match args.output {
        Some(path) => {
            let written = export_diagram(workflow.graph(), &path)
                .await
                .with_context(|| format!("Failed to export diagram to {}", path.display()))?;
            println!("{} {}", "✓ Diagram written to".green(), written.display());
        }
        None => {
            let options = args.format.options().with_title("Research Assistant");
            println!("{}", workflow.graph().visualize(&options));
        }
    }
    Ok(())
}

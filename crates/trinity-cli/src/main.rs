use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use trinity_agents::{AgentSettings, ProviderFactory, TrinityOrchestrator};
use trinity_core::reflexion::TemplateGenerator;
use trinity_core::{AppSpecification, ConceptInput, RefleXionLoop, TrinityConfig};

mod output;
mod report;

/// Trinity - three-agent concept review and iterative app generation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); defaults are used when absent
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a product concept with the Innovation, Ethics and Security agents
    Analyze {
        /// Concept description (at least 10 characters)
        description: String,

        /// Optional concept category
        #[arg(long)]
        category: Option<String>,

        /// Output in JSON format for integrations
        #[arg(long)]
        json: bool,
    },

    /// Generate, reflect on and improve a task-manager scaffold
    Reflexion {
        /// Application name
        #[arg(long)]
        name: String,

        /// Application description
        #[arg(long)]
        description: Option<String>,

        /// Iteration budget
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Overall score at which generation stops
        #[arg(long)]
        threshold: Option<f64>,

        /// Directory for the history file and the final app
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output in JSON format for integrations
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    InitConfig {
        #[arg(long, default_value = "trinity.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TrinityConfig::from_file(path)
            .with_context(|| format!("cannot load configuration from {}", path.display()))?,
        None => TrinityConfig::default(),
    };
    init_tracing(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Analyze {
            description,
            category,
            json,
        } => {
            let mut builder = ConceptInput::builder(description);
            if let Some(category) = category {
                builder = builder.category(category);
            }
            let concept = builder.build().context("invalid concept")?;

            let provider = ProviderFactory::from_settings(&config.llm);
            let orchestrator = TrinityOrchestrator::new(provider, AgentSettings::from_config(&config));
            let report = orchestrator.analyze_concept(&concept).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::render_trinity(&report));
            }
        }
        Commands::Reflexion {
            name,
            description,
            max_iterations,
            threshold,
            output,
            json,
        } => {
            let mut settings = config.reflexion.clone();
            if let Some(max_iterations) = max_iterations {
                settings.max_iterations = max_iterations;
            }
            if let Some(threshold) = threshold {
                settings.quality_threshold = threshold;
            }
            if let Some(dir) = &output {
                settings.output_dir = Some(dir.clone());
            }

            let description = description
                .unwrap_or_else(|| format!("{}: task management with users and tasks", name));
            let spec = AppSpecification::task_manager(name, description);

            let generator = Arc::new(TemplateGenerator::new());
            let reflexion = RefleXionLoop::new(generator, settings)?;
            let outcome = reflexion.run(spec).await?;

            if let Some(dir) = &output {
                let written = output::write_app(&outcome.app, dir).await?;
                tracing::info!("Final app written to {}", written.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.history)?);
            } else {
                print!("{}", report::render_outcome(&outcome));
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            TrinityConfig::default().to_file(&path)?;
            println!("Configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Logs go to stderr so `--json` output stays machine readable
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

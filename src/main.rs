use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use uavcoord::providers::{demo_provider, AnthropicProvider, LLMProvider, OpenAIProvider};
use uavcoord::{report, Config, RoundScheduler, RunState};

const EXAMPLE_REQUIREMENTS: &str = "Design a surveillance UAV with these requirements:
- Range: 50 km
- Payload: 2 kg camera system
- Flight time: 1.5 hours
- Altitude: 1000-2000 m
- Budget: $25,000
- Must be manufacturable and cost-effective
- Weather resistance for light rain
- Autonomous operation capability";

#[derive(Parser)]
#[command(name = "uavcoord")]
#[command(about = "Iterative multi-agent UAV design coordination", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a design project to completion or the iteration cap
    Run {
        #[arg(help = "Free-text requirements (defaults to a surveillance UAV)")]
        requirements: Option<String>,
        #[arg(long, conflicts_with = "requirements")]
        requirements_file: Option<PathBuf>,
        #[arg(long, help = "TOML configuration file")]
        config: Option<PathBuf>,
        #[arg(long)]
        max_iterations: Option<u32>,
        #[arg(long)]
        stability_threshold: Option<u32>,
        #[arg(long, help = "Use canned answers instead of an inference backend")]
        offline: bool,
        #[arg(long, help = "Print the final run state as JSON")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            requirements,
            requirements_file,
            config,
            max_iterations,
            stability_threshold,
            offline,
            json,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(path)?,
                None => Config::from_env(),
            };
            if let Some(n) = max_iterations {
                config.run.max_iterations = n;
            }
            if let Some(n) = stability_threshold {
                config.run.stability_threshold = n;
            }

            let requirements = match (requirements, requirements_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => EXAMPLE_REQUIREMENTS.to_string(),
            };

            let provider = select_provider(&config, offline)?;
            let state = run_project(provider, &config, &requirements).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_report(&state);
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn select_provider(config: &Config, offline: bool) -> Result<Arc<dyn LLMProvider>> {
    if offline {
        return Ok(Arc::new(demo_provider()));
    }
    if let Some(key) = &config.openai_api_key {
        return Ok(Arc::new(OpenAIProvider::from_config(key.clone(), config)));
    }
    if let Some(key) = &config.anthropic_api_key {
        return Ok(Arc::new(AnthropicProvider::from_config(key.clone(), config)));
    }
    anyhow::bail!("No API key configured: set OPENROUTER_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --offline")
}

async fn run_project(
    provider: Arc<dyn LLMProvider>,
    config: &Config,
    requirements: &str,
) -> Result<RunState> {
    let scheduler = RoundScheduler::new(provider, config.run.clone())?;
    eprintln!("Requirements: {}", requirements.trim());
    let state = scheduler.run(requirements).await?;
    Ok(state)
}

fn print_report(state: &RunState) {
    if state.project_complete {
        println!("Project completed after {} iterations\n", state.current_iteration);
    } else {
        println!(
            "Stopped at iteration {} without completing\n",
            state.current_iteration
        );
    }
    println!("{}", report::final_design(state));
    println!("{}", report::iteration_summary(state));
    print!("{}", report::statistics(state).render());
}

//! mini-cursor - command-line entry point
//!
//! Runs one task through the agent loop and prints the final response.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mini_cursor::{
    agent::{Agent, Termination},
    config::Config,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mini-cursor")]
#[command(about = "Run a task through a tool-using chat model")]
#[command(version)]
struct Cli {
    /// Task description for the agent
    #[arg(required_unless_present = "task_file")]
    task: Option<String>,

    /// Read the task description from a file instead
    #[arg(long, conflicts_with = "task")]
    task_file: Option<PathBuf>,

    /// Override MODEL_NAME
    #[arg(long)]
    model: Option<String>,

    /// Override MAX_ITERATIONS
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Override WORKSPACE_PATH
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cursor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let task = match (&cli.task, &cli.task_file) {
        (Some(task), _) => task.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read task file {}", path.display()))?,
        (None, None) => anyhow::bail!("no task given"),
    };

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.default_model = model;
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(workspace) = cli.workspace {
        config.workspace_path = workspace;
    }
    info!(
        "Loaded configuration: model={} workspace={}",
        config.default_model,
        config.workspace_path.display()
    );

    let agent = Agent::from_config(config)?;
    let outcome = agent.run_task(&task).await?;

    match outcome.termination {
        Termination::Final => info!(iterations = outcome.iterations, "Task finished"),
        Termination::IterationLimit => tracing::warn!(
            iterations = outcome.iterations,
            "Iteration budget exhausted; showing the last assistant message"
        ),
    }
    println!("{}", outcome.response);

    Ok(())
}

//! Rawgraph CLI - compile image pipelines and inspect module kinds.

mod commands;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rawgraph")]
#[command(author, version, about = "Rawgraph pipeline compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pipeline and print the node graph
    Compile(commands::compile::CompileArgs),

    /// List available module kinds and their parameters
    Modules(commands::modules::ModulesArgs),

    /// List or export the bundled pipelines
    Pipelines(commands::pipelines::PipelinesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile(args) => commands::compile::run(args),
        Commands::Modules(args) => commands::modules::run(args),
        Commands::Pipelines(args) => commands::pipelines::run(args),
    }
}

//! Compile a pipeline file and dump the resulting node graph.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use rawgraph_config::{PipelineConfig, get_factory_pipeline};
use rawgraph_modules::ModuleRegistry;

use crate::report::GraphReport;

/// Dump format.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Pipeline file (TOML)
    #[arg(value_name = "PIPELINE", required_unless_present = "factory")]
    file: Option<PathBuf>,

    /// Compile a bundled pipeline instead of a file
    #[arg(long, value_name = "NAME", conflicts_with = "file")]
    factory: Option<String>,

    /// Override the node ceiling
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    let mut config = match (&args.file, &args.factory) {
        (Some(path), _) => PipelineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(name)) => get_factory_pipeline(name)?,
        (None, None) => anyhow::bail!("no pipeline given"),
    };
    if let Some(max) = args.max_nodes {
        config.max_nodes = max;
    }

    let registry = ModuleRegistry::new();
    let mut pipe = config
        .build(&registry)
        .with_context(|| format!("building pipeline '{}'", config.name))?;
    let compiled = pipe
        .compile()
        .with_context(|| format!("compiling pipeline '{}'", config.name))?;
    tracing::info!(
        pipeline = %config.name,
        nodes = compiled.nodes().len(),
        edges = compiled.edges().len(),
        "compiled"
    );

    let report = GraphReport::new(&config.name, &pipe, &compiled);
    let mut out = std::io::stdout().lock();
    match args.format {
        OutputFormat::Text => report.write_text(&mut out)?,
        OutputFormat::Json => report.write_json(&mut out)?,
    }
    Ok(())
}

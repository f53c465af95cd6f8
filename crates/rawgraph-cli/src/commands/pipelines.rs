//! Bundled pipeline listing and export.

use std::path::PathBuf;

use clap::Args;
use rawgraph_config::{factory_pipeline_names, get_factory_pipeline};

#[derive(Args)]
pub struct PipelinesArgs {
    /// Print a specific bundled pipeline as TOML
    #[arg(value_name = "NAME")]
    name: Option<String>,

    /// Write the pipeline to a file instead of printing it
    #[arg(long, value_name = "PATH", requires = "name")]
    write: Option<PathBuf>,
}

pub fn run(args: PipelinesArgs) -> anyhow::Result<()> {
    let Some(name) = &args.name else {
        println!("Factory Pipelines");
        println!("=================");
        println!();
        for name in factory_pipeline_names() {
            let config = get_factory_pipeline(name)?;
            println!(
                "  {:12} - {}",
                name,
                config.description.as_deref().unwrap_or(&config.name)
            );
        }
        println!();
        println!("Use 'rawgraph pipelines <name> --write <path>' to export one.");
        return Ok(());
    };

    let config = get_factory_pipeline(name)?;
    if let Some(path) = &args.write {
        config.save(path)?;
        tracing::info!(pipeline = %name, path = %path.display(), "wrote pipeline");
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

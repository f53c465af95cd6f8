//! Module listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use rawgraph_modules::ModuleRegistry;

#[derive(Args)]
pub struct ModulesArgs {
    /// Show details for a specific module kind
    #[arg(value_name = "KIND")]
    kind: Option<String>,
}

fn format_values(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    parts.join(",")
}

pub fn run(args: ModulesArgs) -> anyhow::Result<()> {
    let registry = ModuleRegistry::new();

    let Some(kind) = &args.kind else {
        println!("Available Modules");
        println!("=================");
        println!();
        for desc in registry.all_modules() {
            println!("  {:10} - {}", desc.id, desc.description);
        }
        println!();
        println!("Use 'rawgraph modules <kind>' for detailed parameter info.");
        return Ok(());
    };

    let desc = registry
        .all_modules()
        .iter()
        .find(|d| d.id.eq_ignore_ascii_case(kind))
        .ok_or_else(|| anyhow::anyhow!("Unknown module kind: {}", kind))?;

    println!("{}", desc.id);
    println!("{}", "=".repeat(desc.id.len()));
    println!();
    println!("{}", desc.description);
    println!();
    println!("Connectors: {}", desc.connectors.join(", "));
    println!("Committed block: {} floats", desc.committed_len);
    println!();

    if desc.params.is_empty() {
        println!("No parameters.");
        return Ok(());
    }

    println!("Parameters:");
    println!();
    println!(
        "  {:10}  {:36}  {:24}  {}",
        "Name", "Description", "Default", "Range"
    );
    println!(
        "  {:10}  {:36}  {:24}  {}",
        "----", "-----------", "-------", "-----"
    );
    for p in desc.params {
        println!(
            "  {:10}  {:36}  {:24}  [{}, {}]",
            p.name,
            p.description,
            format_values(p.default),
            p.min,
            p.max
        );
    }
    Ok(())
}

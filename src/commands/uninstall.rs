use aom::Manager;
use clap::Parser;
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
pub struct Args {
    /// Addon name as recorded (catalog name or git URL)
    pub name: String,
}

pub async fn run(args: Args, manager: &Manager) -> Result<(), String> {
    let record = manager
        .uninstall(&args.name)
        .await
        .map_err(|e| format!("Failed to uninstall '{}': {}", args.name, e))?;

    println!(
        "{} Addon '{}' uninstalled successfully.",
        "✓".green(),
        args.name
    );
    if !record.folders.is_empty() {
        println!(
            "  Removed {} folder(s): {}",
            record.folders.len(),
            record.folders.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "uninstall_test.rs"]
mod tests;

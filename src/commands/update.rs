//! aom update コマンド
//!
//! 記録済みアドオンの更新を確認し、新しいバージョンがあれば再インストールする。

use crate::output::{short_version, CommandSummary};
use aom::{BatchCheck, Manager, UpdateCheck};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Table};
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
pub struct Args {
    /// Addon name to update
    #[arg(conflicts_with = "all")]
    pub name: Option<String>,

    /// Update all installed addons
    #[arg(long, conflicts_with = "name")]
    pub all: bool,

    /// Only report available updates without installing them
    #[arg(long)]
    pub check: bool,
}

pub async fn run(args: Args, manager: &Manager) -> Result<(), String> {
    // 排他チェック（どちらも未指定の場合）
    if args.name.is_none() && !args.all {
        return Err("Specify addon name or --all".to_string());
    }

    if let Some(name) = &args.name {
        return update_one(manager, name, args.check).await;
    }

    let batch = manager.check_all_updates().await.map_err(|e| e.to_string())?;
    display_failures(&batch);

    if batch.checked > 0 && batch.failed.len() == batch.checked {
        return Err("All update checks failed".to_string());
    }

    if args.check {
        display_available(&batch);
        return Ok(());
    }

    let mut updated = 0;
    let mut failed = 0;
    for check in &batch.available {
        match manager.install(check.platform, &check.name, None).await {
            Ok(record) => {
                updated += 1;
                println!("Updated: {} ({})", check.name, transition(check, &record.version));
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: Failed to update '{}'", check.name);
                eprintln!("  {}", e);
                eprintln!("  Previous version retained.");
            }
        }
    }

    CommandSummary::format(updated, failed + batch.failed.len()).print();

    // 全失敗時のみエラー終了
    if failed > 0 && updated == 0 {
        return Err("All updates failed".to_string());
    }
    Ok(())
}

async fn update_one(manager: &Manager, name: &str, check_only: bool) -> Result<(), String> {
    let check = manager
        .check_update(name, None)
        .await
        .map_err(|e| format!("Failed to check '{}': {}", name, e))?;

    if !check.is_new {
        println!("{}: Already up to date ({})", name, short_version(&check.version));
        return Ok(());
    }

    if check_only {
        println!(
            "{} {}: update available ({})",
            "↑".cyan(),
            name,
            transition(&check, &check.version)
        );
        return Ok(());
    }

    let record = manager
        .install(check.platform, &check.name, None)
        .await
        .map_err(|e| format!("Failed to update '{}': {}\n  Previous version retained.", name, e))?;
    println!("Updated: {} ({})", name, transition(&check, &record.version));
    Ok(())
}

/// `旧 -> 新` 形式のバージョン表示
fn transition(check: &UpdateCheck, to: &str) -> String {
    let from = check
        .installed_version
        .as_deref()
        .map(short_version)
        .unwrap_or("unknown");
    format!("{} -> {}", from, short_version(to))
}

fn display_failures(batch: &BatchCheck) {
    for failure in &batch.failed {
        eprintln!("Warning: Could not check '{}': {}", failure.name, failure.error);
    }
}

fn display_available(batch: &BatchCheck) {
    if batch.available.is_empty() {
        if batch.checked == 0 {
            println!("No addons installed");
        } else {
            println!("All addons are up to date");
        }
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Platform", "Installed", "Latest"]);
    for check in &batch.available {
        table.add_row(vec![
            check.name.as_str(),
            check.platform.as_str(),
            check
                .installed_version
                .as_deref()
                .map(short_version)
                .unwrap_or("unknown"),
            short_version(&check.version),
        ]);
    }

    println!("{table}");
    println!("{} addon(s) have updates available", batch.available.len());
}

#[cfg(test)]
#[path = "update_test.rs"]
mod tests;

//! aom list コマンド
//!
//! 記録済みアドオンの一覧を表示する。

use crate::output::short_version;
use aom::{AddonRecord, Manager};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(after_help = "OUTPUT FORMATS:
  (default)   table of name, platform, version, folders and install time
  --json      JSON array including the full version and folder list
  --simple    addon names only, one per line")]
pub struct Args {
    /// Output in JSON format
    #[arg(long, conflicts_with = "simple")]
    pub json: bool,

    /// Output only addon names
    #[arg(long, conflicts_with = "json")]
    pub simple: bool,
}

/// JSON出力用
#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    #[serde(flatten)]
    record: &'a AddonRecord,
}

pub async fn run(args: Args, manager: &Manager) -> Result<(), String> {
    let addons = manager.list().map_err(|e| e.to_string())?;

    if args.json {
        print_json(&addons)
    } else if args.simple {
        print_simple(&addons);
        Ok(())
    } else {
        print_table(&addons);
        Ok(())
    }
}

fn print_json(addons: &[(String, AddonRecord)]) -> Result<(), String> {
    to_json(addons)
        .map(|json| println!("{json}"))
        .map_err(|e| format!("Failed to serialize addons: {}", e))
}

fn to_json(addons: &[(String, AddonRecord)]) -> serde_json::Result<String> {
    let entries: Vec<ListEntry> = addons
        .iter()
        .map(|(name, record)| ListEntry { name, record })
        .collect();
    serde_json::to_string_pretty(&entries)
}

fn print_simple(addons: &[(String, AddonRecord)]) {
    for (name, _) in addons {
        println!("{name}");
    }
}

fn print_table(addons: &[(String, AddonRecord)]) {
    if addons.is_empty() {
        println!("No addons installed");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Platform", "Version", "Folders", "Installed"]);
    for (name, record) in addons {
        table.add_row(vec![
            name.clone(),
            record.platform.to_string(),
            short_version(&record.version).to_string(),
            record.folders.join(", "),
            record.installed_at.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
    println!("{} addon(s) installed", addons.len());
}

#[cfg(test)]
#[path = "list_test.rs"]
mod tests;

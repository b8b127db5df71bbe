//! aom install コマンド
//!
//! アドオンを解決・取得して配置し、記録する。

use crate::output::short_version;
use aom::source::infer_platform;
use aom::{Manager, Platform};
use clap::Parser;
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
#[command(after_help = "SOURCE FORMATS:
  Ace3                                    catalog addon name
  https://git.tukui.org/elvui/elvui.git   git repository (version scraped from the web UI)
  https://example.com/owner/addon.git     git repository (cloned)
  git@example.com:owner/addon.git         git repository over SSH")]
pub struct Args {
    /// Catalog addon name or git repository URL
    pub name: String,

    /// Distribution platform (inferred from the name when omitted)
    #[arg(long, short = 'p', value_enum)]
    pub platform: Option<Platform>,

    /// Version hint passed to the catalog (ignored for git)
    #[arg(long = "version", value_name = "HINT")]
    pub version_hint: Option<String>,
}

impl Args {
    fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(|| infer_platform(&self.name))
    }
}

pub async fn run(args: Args, manager: &Manager) -> Result<(), String> {
    let platform = args.platform();
    let record = manager
        .install(platform, &args.name, args.version_hint.as_deref())
        .await
        .map_err(|e| format!("Failed to install '{}': {}", args.name, e))?;

    println!(
        "{} Installed {} {} ({})",
        "✓".green(),
        args.name.bold(),
        short_version(&record.version),
        platform
    );
    println!("  Folders: {}", record.folders.join(", "));
    Ok(())
}

#[cfg(test)]
#[path = "install_test.rs"]
mod tests;

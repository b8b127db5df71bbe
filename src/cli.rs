use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{install, list, uninstall, update};

#[derive(Debug, Parser)]
#[command(name = "aom")]
#[command(version, about = "Addon manager CLI", long_about = None)]
pub struct Cli {
    /// Path to config.toml (default: $AOM_CONFIG or ~/.aom/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Addons directory to manage (overrides $AOM_ADDONS_DIR and config.toml)
    #[arg(long, global = true, value_name = "DIR")]
    pub addons_dir: Option<PathBuf>,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install or reinstall an addon
    Install(install::Args),

    /// Remove an installed addon
    Uninstall(uninstall::Args),

    /// Check installed addons for new versions and update them
    Update(update::Args),

    /// List installed addons
    List(list::Args),
}

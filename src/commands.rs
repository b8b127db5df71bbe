use crate::cli::{Cli, Command};
use aom::config::Settings;
use aom::Manager;

pub mod install;
pub mod list;
pub mod uninstall;
pub mod update;

pub async fn dispatch(cli: Cli) -> Result<(), String> {
    let settings = Settings::load(cli.config.as_deref(), cli.addons_dir.as_deref())
        .map_err(|e| e.to_string())?;
    let manager = Manager::from_settings(settings).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Install(args) => install::run(args, &manager).await,
        Command::Uninstall(args) => uninstall::run(args, &manager).await,
        Command::Update(args) => update::run(args, &manager).await,
        Command::List(args) => list::run(args, &manager).await,
    }
}

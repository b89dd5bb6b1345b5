use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Subcommand};
use std::path::PathBuf;

use crate::commands::common;
use crate::config::LauncherConfig;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,

    /// Merge a partial settings document from a JSON file
    Set { file: PathBuf },

    /// Restore default settings
    Reset,
}

pub async fn execute(args: Args, config: LauncherConfig) -> Result<()> {
    let mut store = common::open_settings_store(&config)?;

    match args.command {
        SettingsCommand::Show => common::print_json(store.settings())?,
        SettingsCommand::Set { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let patch: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {:?}", file))?;
            store.update(patch)?;
            common::print_json(store.settings())?;
        }
        SettingsCommand::Reset => {
            store.reset()?;
            println!("Settings reset to defaults");
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Args as ClapArgs, Subcommand};

use crate::commands::common;
use crate::config::LauncherConfig;
use crate::store::PresetCatalog;
use crate::utils::truncate_str;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: PresetsCommand,
}

#[derive(Subcommand)]
pub enum PresetsCommand {
    /// List the built-in presets
    List,

    /// Apply a preset to the stored flags
    Apply { id: String },
}

pub async fn execute(args: Args, config: LauncherConfig) -> Result<()> {
    let catalog = PresetCatalog::new();

    match args.command {
        PresetsCommand::List => {
            let current = common::open_settings_store(&config)?
                .settings()
                .performance
                .current_preset
                .clone();
            for preset in catalog.list() {
                let marker = if current.as_deref() == Some(preset.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {:<12} {:<14} {}",
                    marker,
                    preset.id,
                    preset.name,
                    truncate_str(&preset.description, 60)
                );
            }
        }
        PresetsCommand::Apply { id } => {
            let mut flags = common::open_flag_store(&config)?;
            let mut settings = common::open_settings_store(&config)?;
            catalog.apply(&id, &mut flags, &mut settings)?;
            println!("Applied preset {}", id);
        }
    }

    Ok(())
}

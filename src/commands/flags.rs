use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Subcommand};
use std::path::{Path, PathBuf};

use crate::commands::common;
use crate::config::LauncherConfig;
use crate::models::FlagValue;
use crate::store::FlagStore;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: FlagsCommand,
}

#[derive(Subcommand)]
pub enum FlagsCommand {
    /// Show the stored flag configuration
    Show,

    /// Show the flags a launch would pass to the client
    Effective,

    /// Set a flag value (catalog flags keep their type)
    Set { name: String, value: String },

    /// Enable a catalog flag
    Enable { name: String },

    /// Disable a catalog flag
    Disable { name: String },

    /// Add a custom flag
    Add {
        name: String,
        value: String,
        /// Also list the flag in the catalog with this description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a custom flag
    Remove { name: String },

    /// Replace custom flags with a JSON object read from a file
    Import { file: PathBuf },

    /// Write the effective flags as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether a file contains valid JSON
    Validate { file: PathBuf },

    /// Restore the default catalog and drop custom flags
    Reset,
}

pub async fn execute(args: Args, config: LauncherConfig) -> Result<()> {
    if let FlagsCommand::Validate { file } = &args.command {
        let text = read_file(file)?;
        if FlagStore::validate_json(&text) {
            println!("{}: valid JSON", file.display());
            return Ok(());
        }
        bail!("{}: invalid JSON", file.display());
    }

    let mut store = common::open_flag_store(&config)?;

    match args.command {
        FlagsCommand::Show => common::print_json(&store.config())?,
        FlagsCommand::Effective => common::print_json(&store.effective_flags())?,
        FlagsCommand::Set { name, value } => {
            store.set_flag_value(&name, FlagValue::parse_loose(&value))?;
            println!("{} = {}", name, value);
        }
        FlagsCommand::Enable { name } => {
            store.enable_flag(&name)?;
            println!("Enabled {}", name);
        }
        FlagsCommand::Disable { name } => {
            store.disable_flag(&name)?;
            println!("Disabled {}", name);
        }
        FlagsCommand::Add {
            name,
            value,
            description,
        } => {
            store.add_custom_flag(&name, FlagValue::parse_loose(&value), description.as_deref())?;
            println!("Added {}", name);
        }
        FlagsCommand::Remove { name } => {
            if store.remove_custom_flag(&name)? {
                println!("Removed {}", name);
            } else {
                println!("{} is not a custom flag", name);
            }
        }
        FlagsCommand::Import { file } => {
            store.import_json(&read_file(&file)?)?;
            println!(
                "Imported {} custom flags",
                store.config().custom_flags.len()
            );
        }
        FlagsCommand::Export { output } => {
            let json = store.export_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        FlagsCommand::Reset => {
            store.reset()?;
            println!("Flags reset to defaults");
        }
        FlagsCommand::Validate { .. } => {}
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

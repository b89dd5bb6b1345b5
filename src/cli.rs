use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{flags, launch, open, presets, serve, settings};

#[derive(Parser)]
#[command(name = "bloxlaunch")]
#[command(about = "Game client launcher with FastFlag management and multi-instance support")]
#[command(version)]
pub struct Cli {
    /// Custom launcher config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding settings.json and fflags.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the game client
    Launch(launch::Args),

    /// Run the JSON-lines command loop on stdin/stdout
    Serve(serve::Args),

    /// Inspect and edit FastFlags
    Flags(flags::Args),

    /// Inspect and edit launcher settings
    Settings(settings::Args),

    /// List or apply performance presets
    Presets(presets::Args),

    /// Print the launcher version
    Version,

    /// Open a web link in the default browser
    Open(open::Args),
}

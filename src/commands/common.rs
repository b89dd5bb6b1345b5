use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::config::LauncherConfig;
use crate::models::ProcessStatus;
use crate::store::{FlagStore, JsonFileStore, SettingsStore};
use crate::utils::{format_uptime, truncate_str};

const FLAGS_COLUMN_WIDTH: usize = 48;

pub fn open_flag_store(config: &LauncherConfig) -> Result<FlagStore> {
    let path = config.flags_path();
    FlagStore::load(Arc::new(JsonFileStore::new(path.clone())))
        .with_context(|| format!("Failed to load flags from {:?}", path))
}

pub fn open_settings_store(config: &LauncherConfig) -> Result<SettingsStore> {
    let path = config.settings_path();
    SettingsStore::load(Arc::new(JsonFileStore::new(path.clone())))
        .with_context(|| format!("Failed to load settings from {:?}", path))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_status(status: &ProcessStatus) {
    if !status.is_running {
        println!("No instances running");
        return;
    }

    println!("Instances ({}):", status.instances.len());
    for instance in &status.instances {
        let flags = instance
            .flags
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {:<32} pid {:<8} up {:<12} {}",
            instance.id,
            instance.pid,
            format_uptime(instance.uptime()),
            truncate_str(&flags, FLAGS_COLUMN_WIDTH)
        );
    }
}

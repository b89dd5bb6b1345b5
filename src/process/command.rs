use std::path::PathBuf;

use crate::models::{FlagSet, FlagValue, LaunchSettings};

pub const FLAG_ENV_PREFIX: &str = "FFLAG_";

/// Everything needed to start one client process.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    pub fn build(settings: &LaunchSettings, flags: &FlagSet) -> Self {
        Self {
            program: resolve_executable(settings),
            args: build_args(&settings.launch_args, flags),
            env: build_env(flags),
        }
    }

    #[cfg(test)]
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The configured path wins; no existence check is made either way, a
/// missing binary surfaces as a spawn error.
pub fn resolve_executable(settings: &LaunchSettings) -> PathBuf {
    let configured = settings.executable_path.trim();
    if configured.is_empty() {
        default_executable()
    } else {
        PathBuf::from(configured)
    }
}

#[cfg(target_os = "windows")]
pub fn default_executable() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("C:\\"))
        .join("Roblox")
        .join("Versions")
        .join("RobloxPlayerBeta.exe")
}

#[cfg(target_os = "macos")]
pub fn default_executable() -> PathBuf {
    PathBuf::from("/Applications/Roblox.app/Contents/MacOS/RobloxPlayer")
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn default_executable() -> PathBuf {
    PathBuf::from("roblox")
}

fn build_args(base: &[String], flags: &FlagSet) -> Vec<String> {
    let mut args = base.to_vec();
    for (name, value) in flags {
        match value {
            FlagValue::Bool(true) => args.push(format!("--{}", name)),
            FlagValue::Bool(false) => {}
            other => args.push(format!("--{}={}", name, other)),
        }
    }
    args
}

fn build_env(flags: &FlagSet) -> Vec<(String, String)> {
    flags
        .iter()
        .map(|(name, value)| (format!("{}{}", FLAG_ENV_PREFIX, name), value.to_string()))
        .collect()
}

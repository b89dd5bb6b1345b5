use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";
const FLAGS_FILE: &str = "fflags.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub monitor_interval_ms: u64,
    pub kill_grace_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ms: 5000,
            kill_grace_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub client_id: String,
    pub reconnect_interval_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            client_id: "1200000000000000000".to_string(),
            reconnect_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory holding the settings and flags documents.
    pub data_dir: Option<PathBuf>,
    pub process: ProcessConfig,
    pub presence: PresenceConfig,
    /// Also write daily-rolling log files here when set.
    pub log_dir: Option<PathBuf>,
}

impl LauncherConfig {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: LauncherConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(LauncherConfig::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("BLOXLAUNCH_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bloxlaunch")
                .join("config.yaml")
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bloxlaunch")
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(SETTINGS_FILE)
    }

    pub fn flags_path(&self) -> PathBuf {
        self.data_dir().join(FLAGS_FILE)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.process.monitor_interval_ms.max(1))
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.process.kill_grace_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.presence.reconnect_interval_secs.max(1))
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::FlagValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub auto_launch: bool,
    pub minimize_to_tray: bool,
    pub close_to_tray: bool,
    pub check_updates: bool,
    pub theme: Theme,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            auto_launch: false,
            minimize_to_tray: true,
            close_to_tray: false,
            check_updates: true,
            theme: Theme::Dark,
        }
    }
}

/// How the game client executable is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSettings {
    /// Empty means "use the platform default".
    pub executable_path: String,
    pub launch_args: Vec<String>,
    pub enable_multi_instance: bool,
    pub max_instances: u32,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            executable_path: String::new(),
            launch_args: Vec::new(),
            enable_multi_instance: false,
            max_instances: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSettings {
    pub enabled: bool,
    pub show_game_details: bool,
    pub show_elapsed_time: bool,
    pub custom_status: String,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_game_details: true,
            show_elapsed_time: true,
            custom_status: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSettings {
    pub current_preset: Option<String>,
    pub custom_flags: BTreeMap<String, FlagValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub launch: LaunchSettings,
    pub presence: PresenceSettings,
    pub performance: PerformanceSettings,
}

impl AppSettings {
    pub const GROUPS: [&'static str; 4] = ["general", "launch", "presence", "performance"];
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Failed to launch game client: {0}")]
    SpawnFailure(String),

    #[error("Game client is already running. Enable multi-instance in settings to launch multiple windows.")]
    AlreadyRunning,

    #[error("Maximum number of instances ({0}) reached.")]
    MaxInstancesReached(u32),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid JSON: {0}")]
    MalformedImport(String),

    #[error("Parse error: {0}")]
    ParseFailure(String),

    #[error("Invalid flag {name}: {reason}")]
    InvalidFlag { name: String, reason: String },

    #[error("Storage error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl LauncherError {
    pub fn invalid_flag(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFlag {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Both admission-control rejections report `capacity_exceeded`.
    pub fn kind(&self) -> &'static str {
        match self {
            LauncherError::SpawnFailure(_) => "spawn_failure",
            LauncherError::AlreadyRunning | LauncherError::MaxInstancesReached(_) => {
                "capacity_exceeded"
            }
            LauncherError::PresetNotFound(_) => "preset_not_found",
            LauncherError::MalformedImport(_) => "malformed_import",
            LauncherError::ParseFailure(_) => "parse_failure",
            LauncherError::InvalidFlag { .. } => "invalid_flag",
            LauncherError::Persistence(_) => "persistence",
        }
    }
}

pub type LauncherResult<T> = std::result::Result<T, LauncherError>;

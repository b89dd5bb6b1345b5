mod loader;

pub use loader::{LauncherConfig, PresenceConfig, ProcessConfig};

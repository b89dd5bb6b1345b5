mod flags;
mod kv;
mod presets;
mod settings;

pub use flags::{ensure_valid_name, is_valid_flag_name, FlagStore, FLAGS_KEY};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use presets::PresetCatalog;
pub use settings::{SettingsStore, SETTINGS_KEY};

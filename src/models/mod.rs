mod flag;
mod instance;
mod preset;
mod response;
mod settings;

pub use flag::{default_catalog, FastFlag, FlagCategory, FlagKind, FlagValue, FlagsConfig};
pub use instance::{FlagSet, Instance, InstanceId, InstanceIdGenerator, ProcessStatus};
pub use preset::{builtin_presets, Preset};
pub use response::ApiResponse;
pub use settings::{
    AppSettings, GeneralSettings, LaunchSettings, PerformanceSettings, PresenceSettings, Theme,
};

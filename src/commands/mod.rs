pub mod common;
pub mod flags;
pub mod launch;
pub mod open;
pub mod presets;
pub mod serve;
pub mod settings;
pub mod version;

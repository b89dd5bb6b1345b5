use super::{FlagStore, SettingsStore};
use crate::error::{LauncherError, LauncherResult};
use crate::models::{builtin_presets, Preset};

/// Read-only table of the built-in presets.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }
}

impl PresetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Merge the preset's flags and remember it as the current preset.
    pub fn apply(
        &self,
        id: &str,
        flags: &mut FlagStore,
        settings: &mut SettingsStore,
    ) -> LauncherResult<()> {
        let preset = self
            .find(id)
            .ok_or_else(|| LauncherError::PresetNotFound(id.to_string()))?;

        flags.apply_preset(preset)?;
        settings.set_current_preset(Some(preset.id.clone()))?;

        tracing::info!("Applied preset {} ({})", preset.id, preset.name);
        Ok(())
    }
}

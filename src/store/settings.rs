use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::KeyValueStore;
use crate::error::{LauncherError, LauncherResult};
use crate::models::AppSettings;

pub const SETTINGS_KEY: &str = "settings";

/// User preferences, persisted on every mutation.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: AppSettings,
}

impl SettingsStore {
    /// Load persisted settings, backfill anything missing from the defaults
    /// and write the merged document straight back.
    pub fn load(store: Arc<dyn KeyValueStore>) -> LauncherResult<Self> {
        let persisted = store.get(SETTINGS_KEY)?;
        let settings = migrate(persisted);
        let this = Self { store, settings };
        this.save()?;
        Ok(this)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn get(&self) -> AppSettings {
        self.settings.clone()
    }

    pub fn set(&mut self, settings: AppSettings) -> LauncherResult<()> {
        self.settings = settings;
        self.save()
    }

    /// Merge a partial document into the current settings. Each top-level key
    /// must name a settings group; the fields it carries overwrite that
    /// group's fields and untouched groups stay as they are.
    pub fn update(&mut self, patch: Value) -> LauncherResult<()> {
        let Value::Object(patch) = patch else {
            return Err(LauncherError::ParseFailure(
                "settings update must be a JSON object".to_string(),
            ));
        };

        if let Some(unknown) = patch
            .keys()
            .find(|k| !AppSettings::GROUPS.contains(&k.as_str()))
        {
            return Err(LauncherError::ParseFailure(format!(
                "unknown settings group: {}",
                unknown
            )));
        }

        let current = to_object(&self.settings)?;
        let merged = merge_groups(current, patch);
        let updated: AppSettings = serde_json::from_value(Value::Object(merged))
            .map_err(|e| LauncherError::ParseFailure(e.to_string()))?;

        self.settings = updated;
        self.save()
    }

    pub fn set_current_preset(&mut self, preset_id: Option<String>) -> LauncherResult<()> {
        self.settings.performance.current_preset = preset_id;
        self.save()
    }

    pub fn reset(&mut self) -> LauncherResult<()> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn save(&self) -> LauncherResult<()> {
        let value = serde_json::to_value(&self.settings)
            .map_err(|e| LauncherError::ParseFailure(e.to_string()))?;
        self.store.set(SETTINGS_KEY, &value)?;
        Ok(())
    }
}

fn to_object(settings: &AppSettings) -> LauncherResult<Map<String, Value>> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(LauncherError::ParseFailure(
            "settings did not serialize to an object".to_string(),
        )),
        Err(e) => Err(LauncherError::ParseFailure(e.to_string())),
    }
}

/// Overlay `patch` onto `base` one group at a time: fields present in a
/// patch group win, fields it omits keep their base value.
fn merge_groups(mut base: Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
    for (group, patch_value) in patch {
        match patch_value {
            Value::Object(patch_group) => {
                if let Some(Value::Object(base_group)) = base.get_mut(&group) {
                    for (field, value) in patch_group {
                        base_group.insert(field, value);
                    }
                } else {
                    base.insert(group, Value::Object(patch_group));
                }
            }
            other => {
                base.insert(group, other);
            }
        }
    }
    base
}

fn migrate(persisted: Option<Value>) -> AppSettings {
    let defaults = AppSettings::default();
    let Ok(Value::Object(default_map)) = serde_json::to_value(&defaults) else {
        return defaults;
    };

    let persisted = match persisted {
        Some(Value::Object(map)) => map,
        Some(other) => {
            tracing::warn!("Persisted settings are not an object ({}), using defaults", other);
            Map::new()
        }
        None => Map::new(),
    };

    let persisted_groups: Map<String, Value> = persisted
        .into_iter()
        .filter(|(k, _)| AppSettings::GROUPS.contains(&k.as_str()))
        .collect();
    let merged = merge_groups(default_map, persisted_groups);

    AppSettings {
        general: group_or_default(&merged, "general"),
        launch: group_or_default(&merged, "launch"),
        presence: group_or_default(&merged, "presence"),
        performance: group_or_default(&merged, "performance"),
    }
}

fn group_or_default<T: DeserializeOwned + Default>(merged: &Map<String, Value>, name: &str) -> T {
    let Some(value) = merged.get(name) else {
        return T::default();
    };
    match serde_json::from_value(value.clone()) {
        Ok(group) => group,
        Err(e) => {
            tracing::warn!("Settings group '{}' is invalid ({}), using defaults", name, e);
            T::default()
        }
    }
}

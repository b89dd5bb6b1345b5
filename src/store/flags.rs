use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use super::KeyValueStore;
use crate::error::{LauncherError, LauncherResult};
use crate::models::{default_catalog, FastFlag, FlagCategory, FlagSet, FlagValue, FlagsConfig, Preset};

pub const FLAGS_KEY: &str = "config";

fn flag_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Flag names end up in `--name=value` arguments and `FFLAG_<name>`
/// environment variables, so only identifier characters are allowed.
pub fn is_valid_flag_name(name: &str) -> bool {
    flag_name_pattern().is_match(name)
}

pub struct FlagStore {
    store: Arc<dyn KeyValueStore>,
    config: FlagsConfig,
}

impl FlagStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> LauncherResult<Self> {
        let persisted = store.get(FLAGS_KEY)?;
        let config = migrate(persisted);
        let this = Self { store, config };
        this.save()?;
        Ok(this)
    }

    pub fn config(&self) -> FlagsConfig {
        self.config.clone()
    }

    /// Replace the whole configuration in memory; `save` persists it.
    pub fn set_config(&mut self, config: FlagsConfig) -> LauncherResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn save(&self) -> LauncherResult<()> {
        let value = serde_json::to_value(&self.config)
            .map_err(|e| LauncherError::ParseFailure(e.to_string()))?;
        self.store.set(FLAGS_KEY, &value)?;
        Ok(())
    }

    pub fn reset(&mut self) -> LauncherResult<()> {
        self.config = FlagsConfig::default();
        self.save()
    }

    /// Enabled catalog flags first, then every custom flag; a custom flag
    /// shadows a catalog flag of the same name.
    pub fn effective_flags(&self) -> FlagSet {
        let mut effective = FlagSet::new();

        for name in &self.config.enabled {
            if let Some(flag) = self.config.flags.get(name) {
                effective.insert(name.clone(), flag.value.clone());
            }
        }

        for (name, value) in &self.config.custom_flags {
            effective.insert(name.clone(), value.clone());
        }

        effective
    }

    pub fn set_flag_value(&mut self, name: &str, value: FlagValue) -> LauncherResult<()> {
        match self.config.flags.get_mut(name) {
            Some(flag) => flag.set_value(value)?,
            None => {
                ensure_valid_name(name)?;
                self.config.custom_flags.insert(name.to_string(), value);
            }
        }
        self.save()
    }

    pub fn enable_flag(&mut self, name: &str) -> LauncherResult<()> {
        if !self.config.flags.contains_key(name) {
            return Err(LauncherError::invalid_flag(name, "not in the flag catalog"));
        }
        if !self.config.is_enabled(name) {
            self.config.enabled.push(name.to_string());
        }
        self.save()
    }

    pub fn disable_flag(&mut self, name: &str) -> LauncherResult<()> {
        self.config.enabled.retain(|n| n != name);
        self.save()
    }

    /// With a description the flag also gets an experimental catalog entry.
    pub fn add_custom_flag(
        &mut self,
        name: &str,
        value: FlagValue,
        description: Option<&str>,
    ) -> LauncherResult<()> {
        ensure_valid_name(name)?;
        self.config
            .custom_flags
            .insert(name.to_string(), value.clone());

        if let Some(description) = description {
            self.config.flags.insert(
                name.to_string(),
                FastFlag {
                    name: name.to_string(),
                    value: value.clone(),
                    description: description.to_string(),
                    category: FlagCategory::Experimental,
                    default_value: value,
                },
            );
        }

        self.save()
    }

    pub fn remove_custom_flag(&mut self, name: &str) -> LauncherResult<bool> {
        let removed = self.config.custom_flags.remove(name).is_some();

        let builtin = default_catalog().contains_key(name);
        if !builtin {
            self.config.flags.remove(name);
            self.config.enabled.retain(|n| n != name);
        }

        self.save()?;
        Ok(removed)
    }

    /// Merge a preset into the configuration. Catalog flags are overwritten
    /// and enabled; anything else, including a value whose type does not fit
    /// the catalog entry, lands in the custom flags.
    pub fn apply_preset(&mut self, preset: &Preset) -> LauncherResult<()> {
        for (name, value) in &preset.flags {
            let fits_catalog = self
                .config
                .flags
                .get(name)
                .is_some_and(|flag| flag.default_value.kind() == value.kind());

            if fits_catalog {
                if let Some(flag) = self.config.flags.get_mut(name) {
                    flag.value = value.clone();
                }
                if !self.config.is_enabled(name) {
                    self.config.enabled.push(name.clone());
                }
            } else {
                tracing::debug!("Preset {} sets {} as a custom flag", preset.id, name);
                self.config.custom_flags.insert(name.clone(), value.clone());
            }
        }

        self.save()
    }

    pub fn export_json(&self) -> LauncherResult<String> {
        serde_json::to_string_pretty(&self.effective_flags())
            .map_err(|e| LauncherError::ParseFailure(e.to_string()))
    }

    /// Replace the custom flags with the object in `json`. Previously set
    /// custom flags that are absent from the import are discarded.
    pub fn import_json(&mut self, json: &str) -> LauncherResult<()> {
        let imported = parse_flag_object(json)?;
        self.config.custom_flags = imported;
        self.save()
    }

    pub fn validate_json(json: &str) -> bool {
        serde_json::from_str::<Value>(json).is_ok()
    }
}

pub fn ensure_valid_name(name: &str) -> LauncherResult<()> {
    if is_valid_flag_name(name) {
        Ok(())
    } else {
        Err(LauncherError::invalid_flag(
            name,
            "names may only contain letters, digits and underscores",
        ))
    }
}

fn parse_flag_object(json: &str) -> LauncherResult<FlagSet> {
    let parsed: Value =
        serde_json::from_str(json).map_err(|e| LauncherError::MalformedImport(e.to_string()))?;

    let Value::Object(map) = parsed else {
        return Err(LauncherError::MalformedImport(
            "must be an object".to_string(),
        ));
    };

    let mut flags = FlagSet::new();
    for (name, value) in map {
        if !is_valid_flag_name(&name) {
            return Err(LauncherError::MalformedImport(format!(
                "invalid flag name: {}",
                name
            )));
        }
        let value = FlagValue::from_json(value).ok_or_else(|| {
            LauncherError::MalformedImport(format!("{} must be a boolean, number or string", name))
        })?;
        flags.insert(name, value);
    }
    Ok(flags)
}

fn migrate(persisted: Option<Value>) -> FlagsConfig {
    let document = match persisted {
        Some(Value::Object(map)) => map,
        Some(other) => {
            tracing::warn!("Persisted flags config is not an object ({}), using defaults", other);
            return FlagsConfig::default();
        }
        None => return FlagsConfig::default(),
    };

    let defaults = default_catalog();
    let persisted_flags = section_object(&document, "flags");
    let persisted_names: BTreeSet<String> = persisted_flags.keys().cloned().collect();

    let mut flags = defaults.clone();
    for (name, raw) in persisted_flags {
        match serde_json::from_value::<FastFlag>(raw) {
            Ok(flag) if flag.name == name && flag.is_consistent() => {
                flags.insert(name, flag);
            }
            Ok(_) => tracing::warn!("Dropping inconsistent persisted flag {}", name),
            Err(e) => tracing::warn!("Dropping unreadable persisted flag {} ({})", name, e),
        }
    }

    let mut enabled: Vec<String> = Vec::new();
    match document.get("enabled") {
        Some(Value::Array(names)) => {
            for name in names.iter().filter_map(Value::as_str) {
                if flags.contains_key(name) && !enabled.iter().any(|n| n == name) {
                    enabled.push(name.to_string());
                }
            }
        }
        None => {}
        Some(other) => {
            tracing::warn!("Persisted enabled list is invalid ({}), enabling every flag", other);
            enabled = flags.keys().cloned().collect();
        }
    }
    // Built-in flags the persisted document has never seen start enabled.
    for name in defaults.keys() {
        if !persisted_names.contains(name) && !enabled.contains(name) {
            enabled.push(name.clone());
        }
    }

    let mut custom_flags = FlagSet::new();
    for (name, raw) in section_object(&document, "customFlags") {
        if !is_valid_flag_name(&name) {
            tracing::warn!("Dropping custom flag with invalid name {:?}", name);
            continue;
        }
        match FlagValue::from_json(raw) {
            Some(value) => {
                custom_flags.insert(name, value);
            }
            None => tracing::warn!("Dropping custom flag {} with a non-scalar value", name),
        }
    }

    FlagsConfig {
        flags,
        enabled,
        custom_flags,
    }
}

fn section_object(document: &Map<String, Value>, name: &str) -> Map<String, Value> {
    match document.get(name) {
        Some(Value::Object(map)) => map.clone(),
        None => Map::new(),
        Some(other) => {
            tracing::warn!("Persisted flags section '{}' is invalid ({}), using defaults", name, other);
            Map::new()
        }
    }
}

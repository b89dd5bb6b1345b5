use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{LauncherError, LauncherResult};

/// Value of a fast flag as it is persisted and forwarded to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    Number,
    String,
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Bool(_) => FlagKind::Bool,
            FlagValue::Int(_) | FlagValue::Float(_) => FlagKind::Number,
            FlagValue::Str(_) => FlagKind::String,
        }
    }

    /// Parse a value typed on the command line: booleans and numbers are
    /// recognized, anything else stays a string.
    pub fn parse_loose(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed {
            "true" => return FlagValue::Bool(true),
            "false" => return FlagValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return FlagValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return FlagValue::Float(f);
            }
        }
        FlagValue::Str(input.to_string())
    }

    /// Convert an arbitrary JSON value, rejecting arrays, objects and null.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FlagValue::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(FlagValue::Int)
                .or_else(|| n.as_f64().map(FlagValue::Float)),
            serde_json::Value::String(s) => Some(FlagValue::Str(s)),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Int(i) => write!(f, "{}", i),
            FlagValue::Float(x) => write!(f, "{}", x),
            FlagValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Int(i64::from(value))
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Str(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    Performance,
    Graphics,
    Network,
    Experimental,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastFlag {
    pub name: String,
    pub value: FlagValue,
    pub description: String,
    pub category: FlagCategory,
    pub default_value: FlagValue,
}

impl FastFlag {
    pub fn new(
        name: &str,
        value: impl Into<FlagValue>,
        default_value: impl Into<FlagValue>,
        category: FlagCategory,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            description: description.to_string(),
            category,
            default_value: default_value.into(),
        }
    }

    /// Replace the current value, keeping it the same kind as the default.
    pub fn set_value(&mut self, value: FlagValue) -> LauncherResult<()> {
        if value.kind() != self.default_value.kind() {
            return Err(LauncherError::invalid_flag(
                &self.name,
                format!(
                    "expected a {:?} value, got {:?}",
                    self.default_value.kind(),
                    value.kind()
                ),
            ));
        }
        self.value = value;
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.value.kind() == self.default_value.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsConfig {
    #[serde(default)]
    pub flags: BTreeMap<String, FastFlag>,
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub custom_flags: BTreeMap<String, FlagValue>,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        let flags = default_catalog();
        let enabled = flags.keys().cloned().collect();
        Self {
            flags,
            enabled,
            custom_flags: BTreeMap::new(),
        }
    }
}

impl FlagsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|n| n == name)
    }

    pub fn validate(&self) -> LauncherResult<()> {
        for (key, flag) in &self.flags {
            if key != &flag.name {
                return Err(LauncherError::invalid_flag(
                    key,
                    format!("catalog key does not match flag name {}", flag.name),
                ));
            }
            if !flag.is_consistent() {
                return Err(LauncherError::invalid_flag(
                    key,
                    "value and default value have different types",
                ));
            }
        }
        if let Some(unknown) = self.enabled.iter().find(|n| !self.flags.contains_key(*n)) {
            return Err(LauncherError::invalid_flag(
                unknown,
                "enabled name is not in the flag catalog",
            ));
        }
        Ok(())
    }
}

/// Built-in flags seeded on first run.
pub fn default_catalog() -> BTreeMap<String, FastFlag> {
    use FlagCategory::*;

    [
        FastFlag::new(
            "FFlagDebugGraphicsDisableMetal",
            false,
            false,
            Graphics,
            "Disable Metal graphics API (macOS)",
        ),
        FastFlag::new(
            "DFIntTaskSchedulerTargetFps",
            144,
            60,
            Performance,
            "Target FPS cap (0 = unlimited)",
        ),
        FastFlag::new(
            "FFlagGraphicsEnableD3D11",
            true,
            true,
            Graphics,
            "Enable DirectX 11 rendering",
        ),
        FastFlag::new(
            "FFlagGraphicsEnableD3D10",
            false,
            false,
            Graphics,
            "Enable DirectX 10 rendering",
        ),
        FastFlag::new(
            "FFlagGraphicsPreferD3D11",
            true,
            true,
            Graphics,
            "Prefer DirectX 11 over OpenGL",
        ),
        FastFlag::new(
            "DFIntQualityLevel",
            10,
            7,
            Graphics,
            "Graphics quality level (1-21)",
        ),
        FastFlag::new(
            "FFlagDebugGraphicsPreferVulkan",
            false,
            false,
            Experimental,
            "Prefer Vulkan rendering API",
        ),
        FastFlag::new(
            "FFlagHandleAltEnterFullscreenManually",
            true,
            false,
            Graphics,
            "Handle Alt+Enter for fullscreen manually",
        ),
        FastFlag::new(
            "DFIntCanHideGuiGroupId",
            1,
            0,
            Graphics,
            "Hide GUI group ID",
        ),
        FastFlag::new(
            "FFlagFixGraphicsQuality",
            true,
            true,
            Graphics,
            "Fix graphics quality settings",
        ),
        FastFlag::new(
            "FFlagPreloadAllFonts",
            true,
            false,
            Performance,
            "Preload all fonts on startup",
        ),
        FastFlag::new(
            "FFlagBatchAssetApi",
            true,
            true,
            Network,
            "Batch asset API requests",
        ),
        FastFlag::new(
            "DFIntRccPropCache",
            1,
            0,
            Performance,
            "RCC property cache size",
        ),
        FastFlag::new(
            "FFlagNewLightAttenuation",
            true,
            true,
            Graphics,
            "Use new light attenuation model",
        ),
        FastFlag::new(
            "DFIntMeshContentProviderTimeout",
            10000,
            60000,
            Network,
            "Mesh content provider timeout (ms)",
        ),
        FastFlag::new(
            "FFlagEnableHardwareTelemetry",
            false,
            true,
            Experimental,
            "Enable hardware telemetry collection",
        ),
    ]
    .into_iter()
    .map(|flag| (flag.name.clone(), flag))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_value_deserializes_by_shape() {
        let v: FlagValue = serde_json::from_str("21").unwrap();
        assert_eq!(v, FlagValue::Int(21));
        let v: FlagValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(v, FlagValue::Float(0.5));
        let v: FlagValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FlagValue::Bool(true));
        let v: FlagValue = serde_json::from_str("\"vulkan\"").unwrap();
        assert_eq!(v, FlagValue::Str("vulkan".to_string()));
    }

    #[test]
    fn flag_value_display_matches_argument_form() {
        assert_eq!(FlagValue::Int(21).to_string(), "21");
        assert_eq!(FlagValue::Bool(false).to_string(), "false");
        assert_eq!(FlagValue::Float(0.25).to_string(), "0.25");
        assert_eq!(FlagValue::Str("abc".into()).to_string(), "abc");
    }

    #[test]
    fn parse_loose_recognizes_scalars() {
        assert_eq!(FlagValue::parse_loose("true"), FlagValue::Bool(true));
        assert_eq!(FlagValue::parse_loose("5000"), FlagValue::Int(5000));
        assert_eq!(FlagValue::parse_loose("1.5"), FlagValue::Float(1.5));
        assert_eq!(
            FlagValue::parse_loose("High"),
            FlagValue::Str("High".to_string())
        );
    }

    #[test]
    fn from_json_rejects_compound_values() {
        assert!(FlagValue::from_json(serde_json::json!([1, 2])).is_none());
        assert!(FlagValue::from_json(serde_json::json!({"a": 1})).is_none());
        assert!(FlagValue::from_json(serde_json::Value::Null).is_none());
        assert_eq!(
            FlagValue::from_json(serde_json::json!(7)),
            Some(FlagValue::Int(7))
        );
    }

    #[test]
    fn set_value_rejects_kind_change() {
        let mut flag = FastFlag::new("DFIntQualityLevel", 10, 7, FlagCategory::Graphics, "q");
        assert!(flag.set_value(FlagValue::Int(21)).is_ok());
        assert!(flag.set_value(FlagValue::Float(2.5)).is_ok());
        let err = flag.set_value(FlagValue::Bool(true)).unwrap_err();
        assert_eq!(err.kind(), "invalid_flag");
        assert_eq!(flag.value, FlagValue::Float(2.5));
    }

    #[test]
    fn default_catalog_is_consistent() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 16);
        assert!(catalog.values().all(FastFlag::is_consistent));
        assert_eq!(catalog["DFIntQualityLevel"].value, FlagValue::Int(10));
    }

    #[test]
    fn default_config_enables_every_catalog_flag() {
        let config = FlagsConfig::default();
        assert_eq!(config.enabled.len(), config.flags.len());
        assert!(config.custom_flags.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_enabled_name() {
        let mut config = FlagsConfig::default();
        config.enabled.push("FFlagNotInCatalog".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_serializes_camel_case() {
        let config = FlagsConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("customFlags").is_some());
        assert!(json["flags"]["DFIntQualityLevel"].get("defaultValue").is_some());
        assert_eq!(json["flags"]["DFIntQualityLevel"]["category"], "graphics");
    }
}

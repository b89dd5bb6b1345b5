use serde::{Deserialize, Serialize};

use super::{FlagSet, FlagValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub flags: FlagSet,
}

impl Preset {
    fn new(id: &str, name: &str, description: &str, icon: &str, flags: &[(&str, FlagValue)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            flags: flags
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

pub fn builtin_presets() -> Vec<Preset> {
    use FlagValue::{Bool, Int};

    vec![
        Preset::new(
            "low",
            "Low Performance",
            "Maximum FPS, lowest quality settings for weak hardware",
            "Zap",
            &[
                ("DFIntTaskSchedulerTargetFps", Int(0)),
                ("DFIntQualityLevel", Int(1)),
                ("FFlagGraphicsEnableD3D11", Bool(false)),
                ("FFlagGraphicsEnableD3D10", Bool(true)),
                ("FFlagFixGraphicsQuality", Bool(false)),
                ("FFlagNewLightAttenuation", Bool(false)),
                ("FFlagPreloadAllFonts", Bool(false)),
            ],
        ),
        Preset::new(
            "medium",
            "Balanced",
            "Good balance between quality and performance",
            "Scale",
            &[
                ("DFIntTaskSchedulerTargetFps", Int(120)),
                ("DFIntQualityLevel", Int(7)),
                ("FFlagGraphicsEnableD3D11", Bool(true)),
                ("FFlagGraphicsEnableD3D10", Bool(false)),
                ("FFlagFixGraphicsQuality", Bool(true)),
                ("FFlagNewLightAttenuation", Bool(true)),
                ("FFlagPreloadAllFonts", Bool(false)),
            ],
        ),
        Preset::new(
            "high",
            "High Quality",
            "Best visual quality with uncapped FPS",
            "Sparkles",
            &[
                ("DFIntTaskSchedulerTargetFps", Int(0)),
                ("DFIntQualityLevel", Int(21)),
                ("FFlagGraphicsEnableD3D11", Bool(true)),
                ("FFlagGraphicsEnableD3D10", Bool(false)),
                ("FFlagFixGraphicsQuality", Bool(true)),
                ("FFlagNewLightAttenuation", Bool(true)),
                ("FFlagPreloadAllFonts", Bool(true)),
                ("FFlagHandleAltEnterFullscreenManually", Bool(true)),
            ],
        ),
        Preset::new(
            "competitive",
            "Competitive",
            "Optimized for competitive play - max FPS, reduced effects",
            "Trophy",
            &[
                ("DFIntTaskSchedulerTargetFps", Int(0)),
                ("DFIntQualityLevel", Int(3)),
                ("FFlagGraphicsEnableD3D11", Bool(true)),
                ("FFlagGraphicsEnableD3D10", Bool(false)),
                ("FFlagFixGraphicsQuality", Bool(false)),
                ("FFlagNewLightAttenuation", Bool(false)),
                ("FFlagPreloadAllFonts", Bool(true)),
                ("FFlagHandleAltEnterFullscreenManually", Bool(true)),
                ("DFIntMeshContentProviderTimeout", Int(5000)),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_catalog;

    #[test]
    fn builtin_ids_are_unique() {
        let presets = builtin_presets();
        let ids: Vec<&str> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "medium", "high", "competitive"]);
    }

    #[test]
    fn preset_values_match_catalog_kinds() {
        let catalog = default_catalog();
        for preset in builtin_presets() {
            for (name, value) in &preset.flags {
                let flag = catalog
                    .get(name)
                    .unwrap_or_else(|| panic!("{} references unknown flag {}", preset.id, name));
                assert_eq!(
                    flag.default_value.kind(),
                    value.kind(),
                    "preset {} flag {} has wrong kind",
                    preset.id,
                    name
                );
            }
        }
    }
}

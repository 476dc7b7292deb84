use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGICAL_WIDTH: u16 = 320;
pub const DEFAULT_SCENE_HEIGHT: u16 = 137;

/// Display area the scene background is centred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayInfo {
    pub logical_width: u16,
    pub scene_height: u16,
}

impl Default for DisplayInfo {
    fn default() -> Self {
        Self {
            logical_width: DEFAULT_LOGICAL_WIDTH,
            scene_height: DEFAULT_SCENE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Resource holding the scene lookup table.
    pub scene_lut_resource: u16,
    /// Scene a new game session starts in.
    #[serde(default = "default_first_scene")]
    pub first_scene: u16,
    #[serde(default)]
    pub display: DisplayInfo,
}

impl SceneConfig {
    pub fn new(scene_lut_resource: u16) -> Self {
        Self {
            scene_lut_resource,
            first_scene: default_first_scene(),
            display: DisplayInfo::default(),
        }
    }
}

fn default_first_scene() -> u16 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: SceneConfig =
            serde_json::from_str(r#"{ "scene_lut_resource": 3 }"#).expect("parse");

        assert_eq!(config, SceneConfig::new(3));
        assert_eq!(config.display.logical_width, 320);
        assert_eq!(config.display.scene_height, 137);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<SceneConfig>(
            r#"{ "scene_lut_resource": 3, "first_scen": 4 }"#,
        );
        assert!(result.is_err());
    }
}

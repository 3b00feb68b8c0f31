//! Scene configuration for Lumen2D.
//!
//! Serializable description of a lighting setup: viewport, ambient
//! color, enclosure, and light definitions.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::render::Light;

/// Serializable definition of one light.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightConfig {
    /// RGBA, normalized 0..1.
    pub color: [f32; 4],
    /// Disk radius; half of it is the shadow visibility distance.
    pub strength: f32,
    /// Whether this light casts shadows.
    pub shadows: bool,
}

impl LightConfig {
    pub fn to_light(&self) -> Light {
        Light::new(self.color, self.strength, self.shadows)
    }
}

/// Complete lighting setup that can be serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Config version for migration support.
    pub version: u32,
    pub width: u32,
    pub height: u32,
    /// Ambient base color, visible wherever no light reaches.
    pub environment_color: [f32; 4],
    /// Enclosed-space flag; lengthens shadows and disables their fade.
    pub inside: bool,
    pub lights: Vec<LightConfig>,
}

impl SceneConfig {
    /// Create an empty scene config for a viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            version: 1,
            width,
            height,
            environment_color: [0.0, 0.0, 0.0, 1.0],
            inside: false,
            lights: Vec::new(),
        }
    }

    /// Serialize this config to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save this config to a file.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a config from a file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Instantiate all configured lights.
    pub fn build_lights(&self) -> Vec<Light> {
        self.lights.iter().map(LightConfig::to_light).collect()
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut config = SceneConfig::new(640, 480);
        config.environment_color = [0.1, 0.1, 0.2, 1.0];
        config.inside = true;
        config.lights.push(LightConfig {
            color: [1.0, 0.9, 0.7, 1.0],
            strength: 250.0,
            shadows: true,
        });

        let json = config.to_json().unwrap();
        let back = SceneConfig::from_json(&json).unwrap();
        assert_eq!(back.width, 640);
        assert_eq!(back.height, 480);
        assert!(back.inside);
        assert_eq!(back.lights.len(), 1);
        assert_eq!(back.lights[0].strength, 250.0);
    }

    #[test]
    fn test_build_lights_matches_config() {
        let mut config = SceneConfig::new(100, 100);
        config.lights.push(LightConfig {
            color: [1.0; 4],
            strength: 120.0,
            shadows: false,
        });

        let lights = config.build_lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].strength, 120.0);
        assert_eq!(lights[0].visibility_distance, 60.0);
        assert!(!lights[0].shadows);
        assert!(!lights[0].is_rendered());
    }
}

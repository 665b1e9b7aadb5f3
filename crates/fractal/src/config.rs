//! Explorer configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config and a
//! partial file only overrides what it names.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::FractalError;
use crate::lod::{LodRate, MAX_LOD, MIN_LOD};
use crate::navigation::SpeedPolicy;
use crate::tracer::MAX_DISTANCE;

/// Power values reachable from the keyboard.
pub const MIN_POWER: f32 = 2.0;
pub const MAX_POWER: f32 = 16.0;

/// Largest output edge, matching wgpu's default `max_texture_dimension_2d`.
pub const MAX_VIEW_SIZE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub power: f32,
    pub bailout: f32,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            power: 8.0,
            bailout: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Radians per pointer unit.
    pub sensitivity: f32,
    pub zoom_factor: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let speed = SpeedPolicy::default();
        Self {
            position: Vec3::new(0.0, 0.0, -2.5),
            target: Vec3::ZERO,
            sensitivity: 0.002,
            zoom_factor: speed.zoom_factor,
            min_speed: speed.min_speed,
            max_speed: speed.max_speed,
        }
    }
}

impl CameraConfig {
    #[must_use]
    pub fn speed_policy(&self) -> SpeedPolicy {
        SpeedPolicy {
            zoom_factor: self.zoom_factor,
            min_speed: self.min_speed,
            max_speed: self.max_speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub initial: f32,
    pub factor: f32,
    pub events_per_second: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        let rate = LodRate::default();
        Self {
            initial: 1.0,
            factor: rate.factor,
            events_per_second: rate.events_per_second,
        }
    }
}

impl LodConfig {
    #[must_use]
    pub fn rate(&self) -> LodRate {
        LodRate {
            factor: self.factor,
            events_per_second: self.events_per_second,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
    pub max_distance: f32,
    /// Radians per second of palette drift. Zero keeps the palette static.
    pub palette_speed: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            max_distance: MAX_DISTANCE,
            palette_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub fractal: FractalConfig,
    pub camera: CameraConfig,
    pub lod: LodConfig,
    pub view: ViewConfig,
}

impl ExplorerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, FractalError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FractalError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, FractalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the clamping in the core would otherwise hide.
    pub fn validate(&self) -> Result<(), FractalError> {
        let f = &self.fractal;
        check(
            f.power.is_finite() && (MIN_POWER..=MAX_POWER).contains(&f.power),
            || format!("fractal.power must be in [{MIN_POWER}, {MAX_POWER}], got {}", f.power),
        )?;
        check(f.bailout.is_finite() && f.bailout > 0.0, || {
            format!("fractal.bailout must be positive, got {}", f.bailout)
        })?;

        let c = &self.camera;
        check(c.position.is_finite() && c.target.is_finite(), || {
            "camera.position and camera.target must be finite".to_string()
        })?;
        check(c.position != c.target, || {
            "camera.target must differ from camera.position".to_string()
        })?;
        check(c.sensitivity.is_finite() && c.sensitivity > 0.0, || {
            format!("camera.sensitivity must be positive, got {}", c.sensitivity)
        })?;
        check(c.zoom_factor.is_finite() && c.zoom_factor > 0.0, || {
            format!("camera.zoom_factor must be positive, got {}", c.zoom_factor)
        })?;
        check(
            c.min_speed.is_finite() && c.max_speed.is_finite() && 0.0 < c.min_speed && c.min_speed <= c.max_speed,
            || format!("camera speeds must satisfy 0 < min_speed <= max_speed, got {} and {}", c.min_speed, c.max_speed),
        )?;

        let l = &self.lod;
        check(l.initial.is_finite() && (MIN_LOD..=MAX_LOD).contains(&l.initial), || {
            format!("lod.initial must be in [{MIN_LOD}, {MAX_LOD}], got {}", l.initial)
        })?;
        check(l.factor.is_finite() && l.factor > 1.0, || {
            format!("lod.factor must be greater than 1, got {}", l.factor)
        })?;
        check(l.events_per_second.is_finite() && l.events_per_second > 0.0, || {
            format!("lod.events_per_second must be positive, got {}", l.events_per_second)
        })?;

        let v = &self.view;
        check(v.width > 0 && v.height > 0, || {
            format!("view size must be non-zero, got {}x{}", v.width, v.height)
        })?;
        check(v.width <= MAX_VIEW_SIZE && v.height <= MAX_VIEW_SIZE, || {
            format!("view size must be at most {MAX_VIEW_SIZE} per edge, got {}x{}", v.width, v.height)
        })?;
        check(v.max_distance.is_finite() && v.max_distance > 0.0, || {
            format!("view.max_distance must be positive, got {}", v.max_distance)
        })?;
        check(v.palette_speed.is_finite(), || "view.palette_speed must be finite".to_string())?;
        Ok(())
    }
}

fn check(ok: bool, message: impl FnOnce() -> String) -> Result<(), FractalError> {
    if ok {
        Ok(())
    } else {
        Err(FractalError::InvalidConfig(message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ExplorerConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = ExplorerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ExplorerConfig::from_json_str(r#"{ "fractal": { "power": 4.0 } }"#).unwrap();
        assert_eq!(config.fractal.power, 4.0);
        assert_eq!(config.fractal.bailout, 2.0);
        assert_eq!(config.view.width, 1280);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = ExplorerConfig::default();
        config.lod.factor = 1.0;
        assert!(matches!(config.validate(), Err(FractalError::InvalidConfig(_))));

        let mut config = ExplorerConfig::default();
        config.camera.target = config.camera.position;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_view_is_rejected() {
        let mut config = ExplorerConfig::default();
        config.view.width = MAX_VIEW_SIZE;
        config.view.height = MAX_VIEW_SIZE;
        config.validate().unwrap();

        config.view.width = MAX_VIEW_SIZE + 1;
        assert!(matches!(config.validate(), Err(FractalError::InvalidConfig(_))));
    }

    #[test]
    fn json_round_trips() {
        let mut config = ExplorerConfig::default();
        config.fractal.power = 5.0;
        config.view.width = 640;
        config.lod.initial = 2.5;
        let json = config.to_json().unwrap();
        assert_eq!(ExplorerConfig::from_json_str(&json).unwrap(), config);
    }
}

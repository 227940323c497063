use std::path::Path;

use serde::{Deserialize, Serialize};
use sketchflight_flight::{CameraConfig, FlightConfig, FormationConfig};
use sketchflight_render::SketchSettings;
use sketchflight_scene::SkyGradient;
use sketchflight_stream::{CloudConfig, HeightFieldParams, TerrainConfig};

/// Errors from loading or validating a session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Every tunable of a session. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for cloud placement and the jitter texture.
    pub seed: u64,
    /// Upper bound on resident vertices across all geometry.
    pub max_vertices: usize,
    pub height_field: HeightFieldParams,
    pub terrain: TerrainConfig,
    pub clouds: CloudConfig,
    pub flight: FlightConfig,
    pub camera: CameraConfig,
    pub formation: FormationConfig,
    pub sky: SkyGradient,
    pub sketch: SketchSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            max_vertices: 8_000_000,
            height_field: HeightFieldParams::default(),
            terrain: TerrainConfig::default(),
            clouds: CloudConfig::default(),
            flight: FlightConfig::default(),
            camera: CameraConfig::default(),
            formation: FormationConfig::default(),
            sky: SkyGradient::default(),
            sketch: SketchSettings::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the window, the flight model or the
    /// camera meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        if !(t.chunk_size > 0.0) {
            return invalid(format!("terrain.chunk_size must be positive, got {}", t.chunk_size));
        }
        if t.segments == 0 {
            return invalid("terrain.segments must be at least 1".into());
        }
        if !(t.overlap >= 0.0 && t.overlap < t.chunk_size) {
            return invalid(format!(
                "terrain.overlap must be in [0, chunk_size), got {}",
                t.overlap
            ));
        }
        if !(t.retire_distance > 0.0) || !(self.clouds.retire_distance > 0.0) {
            return invalid("retire distances must be positive".into());
        }
        if self.clouds.accents_min > self.clouds.accents_max {
            return invalid("clouds.accents_min exceeds clouds.accents_max".into());
        }
        let f = &self.flight;
        if !(f.speed > 0.0) {
            return invalid(format!("flight.speed must be positive, got {}", f.speed));
        }
        if !(f.min_speed_factor > 0.0 && f.min_speed_factor <= 1.0) {
            return invalid(format!(
                "flight.min_speed_factor must be in (0, 1], got {}",
                f.min_speed_factor
            ));
        }
        if f.speed_decay < 0.0 || f.ease_rate < 0.0 {
            return invalid("flight.speed_decay and flight.ease_rate must not be negative".into());
        }
        let c = &self.camera;
        if !(c.near > 0.0 && c.far > c.near) {
            return invalid(format!("camera clip range invalid: near={} far={}", c.near, c.far));
        }
        if !(c.fov_y_degrees > 0.0 && c.fov_y_degrees < 180.0) {
            return invalid(format!("camera.fov_y_degrees out of range: {}", c.fov_y_degrees));
        }
        if !(c.sky_radius > c.near && c.sky_radius < c.far) {
            return invalid("camera.sky_radius must lie between near and far".into());
        }
        if self.sketch.jitter_size == 0 || !(self.sketch.jitter_cutoff > 0.0) {
            return invalid("sketch jitter texture size and cutoff must be positive".into());
        }
        Ok(())
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = SessionConfig::default();
        let json = config.to_json_pretty().unwrap();
        let back = SessionConfig::from_json_str(&json).unwrap();
        assert_eq!(back.seed, config.seed);
        assert_eq!(back.terrain.segments, config.terrain.segments);
        assert_eq!(back.clouds.per_chunk, config.clouds.per_chunk);
        assert_eq!(back.formation.wing_pairs, config.formation.wing_pairs);
        assert!((back.flight.pitch_cap - config.flight.pitch_cap).abs() < 1e-12);
        assert_eq!(back.height_field.relief.len(), 3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "seed": 9, "terrain": { "segments": 32 } }"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.terrain.segments, 32);
        assert_eq!(config.terrain.chunk_size, 2000.0);
        assert_eq!(config.flight.speed, 0.05);
    }

    #[test]
    fn rejects_overlap_larger_than_chunk() {
        let err = SessionConfig::from_json_str(r#"{ "terrain": { "overlap": 5000.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_speed_floor() {
        let mut config = SessionConfig::default();
        config.flight.min_speed_factor = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = SessionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn loads_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{ "flight": {{ "speed": 0.1 }} }}"#).unwrap();

        let config = SessionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.flight.speed, 0.1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SessionConfig::from_json_file(tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

//! Blink detection configuration

use serde::{Deserialize, Serialize};

use crate::landmarks::LandmarkScheme;
use crate::DetectionError;

/// How blink state is associated with the faces of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceTracking {
    /// One state per face, keyed by external identity or by position in the frame
    #[default]
    PerFace,
    /// A single state shared by every face in every frame
    Shared,
}

/// Blink detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// EAR below this value counts as a closed eye
    pub ear_threshold: f64,

    /// Frames to wait after a blink before another can be registered
    pub cooldown_frames: u32,

    /// Landmark index layout produced by the detector
    pub scheme: LandmarkScheme,

    /// State association across faces
    pub face_tracking: FaceTracking,

    /// Drop per-face state after this many frames without that face (0 keeps it forever)
    pub stale_after_frames: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            cooldown_frames: 10,
            scheme: LandmarkScheme::IBUG_68,
            face_tracking: FaceTracking::PerFace,
            stale_after_frames: 90,
        }
    }
}

impl BlinkConfig {
    /// Create strict config (needs a deeper closure, longer debounce)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.21,
            cooldown_frames: 15,
            ..Default::default()
        }
    }

    /// Create lenient config (shallower closures count, shorter debounce)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.28,
            cooldown_frames: 6,
            ..Default::default()
        }
    }

    /// Reject values the state machine cannot work with
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.ear_threshold.is_finite() || self.ear_threshold <= 0.0 {
            return Err(DetectionError::Config(format!(
                "ear_threshold must be a positive number, got {}",
                self.ear_threshold
            )));
        }
        if !self.scheme.is_well_formed() {
            return Err(DetectionError::Config(format!(
                "landmark scheme '{}' needs two six-point eye ranges within {} points",
                self.scheme.name, self.scheme.point_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlinkConfig::default();
        assert_eq!(config.ear_threshold, 0.25);
        assert_eq!(config.cooldown_frames, 10);
        assert_eq!(config.scheme, LandmarkScheme::IBUG_68);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(BlinkConfig::strict().validate().is_ok());
        assert!(BlinkConfig::lenient().validate().is_ok());
        assert!(BlinkConfig::strict().ear_threshold < BlinkConfig::lenient().ear_threshold);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for threshold in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let config = BlinkConfig { ear_threshold: threshold, ..Default::default() };
            assert!(matches!(config.validate(), Err(DetectionError::Config(_))));
        }
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = BlinkConfig::default();
        config.scheme.point_count = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: BlinkConfig =
            serde_json::from_str(r#"{"cooldown_frames": 4, "face_tracking": "shared"}"#).unwrap();
        assert_eq!(config.cooldown_frames, 4);
        assert_eq!(config.face_tracking, FaceTracking::Shared);
        assert_eq!(config.ear_threshold, 0.25);
    }
}

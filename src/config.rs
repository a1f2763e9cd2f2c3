//! Engine configuration
//!
//! Every tunable constant of the detection and focus pipeline lives here. All
//! sections default to the values the engine was tuned with, so a TOML file only
//! needs to list the overrides.

use crate::error::FocusError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Debounce hold times for the habit latches (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatchConfig {
    /// How long a contact must persist before a warning turns on
    pub on_hold_secs: f64,
    /// How long a contact must be absent before a warning turns off
    pub off_hold_secs: f64,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            on_hold_secs: 0.30,
            off_hold_secs: 0.25,
        }
    }
}

/// Scale-relative proximity thresholds, all multiples of the face scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub eye_mul: f64,
    pub nose_mul: f64,
    pub mouth_mul: f64,
    pub hair_mul: f64,
    /// Vertical buffer above the forehead landmark for the hair band
    pub hair_above_forehead_mul: f64,
    /// Vertical buffer above the eye line for the hair band
    pub hair_above_eye_mul: f64,
    /// Require a minimum lip gap before nail biting can trigger
    pub require_mouth_open: bool,
    pub lip_gap_min_mul: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            eye_mul: 0.18,
            nose_mul: 0.22,
            mouth_mul: 0.24,
            hair_mul: 0.22,
            hair_above_forehead_mul: 0.06,
            hair_above_eye_mul: 0.02,
            require_mouth_open: false,
            lip_gap_min_mul: 0.05,
        }
    }
}

/// Eye-openness self-calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Warm-up window measured from session start (seconds)
    pub window_secs: f64,
    /// EAR used when no samples were collected, and before calibration ends
    pub ear_fallback: f64,
    /// Open-eye threshold = median(EAR) * margin
    pub ear_margin: f64,
    /// Lower bound on the derived threshold
    pub ear_min_clamp: f64,
    /// Cap on retained samples
    pub max_samples: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            ear_fallback: 0.23,
            ear_margin: 0.85,
            ear_min_clamp: 0.18,
            max_samples: 150,
        }
    }
}

/// Focus debounce and pause policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Consecutive open-eye frames needed to declare focus
    pub focus_frames: u32,
    /// Consecutive miss frames needed to drop focus
    pub unfocus_frames: u32,
    /// Continuous unfocused seconds before the session pauses
    pub pause_after_secs: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_frames: 5,
            unfocus_frames: 8,
            pause_after_secs: 30.0,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub latch: LatchConfig,
    pub proximity: ProximityConfig,
    pub calibration: CalibrationConfig,
    pub focus: FocusConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, FocusError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, FocusError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML (or `.json`) configuration file
    pub fn load(path: &Path) -> Result<Self, FocusError> {
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    pub fn to_toml_string(&self) -> Result<String, FocusError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would make the state machines degenerate
    pub fn validate(&self) -> Result<(), FocusError> {
        let latch = &self.latch;
        if !(latch.on_hold_secs >= 0.0 && latch.off_hold_secs >= 0.0) {
            return Err(FocusError::ConfigError(
                "latch hold times must be non-negative seconds".to_string(),
            ));
        }

        let p = &self.proximity;
        for (name, value) in [
            ("proximity.eye_mul", p.eye_mul),
            ("proximity.nose_mul", p.nose_mul),
            ("proximity.mouth_mul", p.mouth_mul),
            ("proximity.hair_mul", p.hair_mul),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(FocusError::ConfigError(format!(
                    "{name} must be a positive multiple of the face scale, got {value}"
                )));
            }
        }
        if !(p.hair_above_forehead_mul >= 0.0
            && p.hair_above_eye_mul >= 0.0
            && p.lip_gap_min_mul >= 0.0)
        {
            return Err(FocusError::ConfigError(
                "hair band and lip gap buffers must be non-negative".to_string(),
            ));
        }

        let c = &self.calibration;
        if !(c.window_secs >= 0.0) {
            return Err(FocusError::ConfigError(
                "calibration.window_secs must be non-negative".to_string(),
            ));
        }
        if !(c.ear_margin > 0.0 && c.ear_margin <= 1.0) {
            return Err(FocusError::ConfigError(format!(
                "calibration.ear_margin must be in (0, 1], got {}",
                c.ear_margin
            )));
        }
        if !(c.ear_fallback > 0.0 && c.ear_min_clamp >= 0.0) {
            return Err(FocusError::ConfigError(
                "calibration EAR fallback must be positive and clamp non-negative".to_string(),
            ));
        }
        if c.max_samples == 0 {
            return Err(FocusError::ConfigError(
                "calibration.max_samples must be at least 1".to_string(),
            ));
        }

        let f = &self.focus;
        if f.focus_frames == 0 || f.unfocus_frames == 0 {
            return Err(FocusError::ConfigError(
                "focus debounce frame counts must be at least 1".to_string(),
            ));
        }
        if !(f.pause_after_secs > 0.0) {
            return Err(FocusError::ConfigError(format!(
                "focus.pause_after_secs must be positive, got {}",
                f.pause_after_secs
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.latch.on_hold_secs, 0.30);
        assert_eq!(config.proximity.hair_mul, 0.22);
        assert_eq!(config.calibration.ear_fallback, 0.23);
        assert_eq!(config.focus.unfocus_frames, 8);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [focus]
            pause_after_secs = 45.0

            [proximity]
            require_mouth_open = true
            "#,
        )
        .unwrap();

        assert_eq!(config.focus.pause_after_secs, 45.0);
        assert_eq!(config.focus.focus_frames, 5);
        assert!(config.proximity.require_mouth_open);
        assert_eq!(config.proximity.eye_mul, 0.18);
        assert_eq!(config.latch, LatchConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[calibration]"));
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_toml_str("[focus]\nfocus_frames = 0\n").unwrap_err();
        assert!(matches!(err, FocusError::ConfigError(_)));

        let err = EngineConfig::from_toml_str("[calibration]\near_margin = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("ear_margin"));

        let err = EngineConfig::from_toml_str("[proximity]\nnose_mul = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("proximity.nose_mul"));

        let err = EngineConfig::from_toml_str("[latch]\non_hold_secs = -1.0\n").unwrap_err();
        assert!(matches!(err, FocusError::ConfigError(_)));
    }

    #[test]
    fn test_json_config() {
        let config = EngineConfig::from_json(r#"{"latch":{"on_hold_secs":0.5}}"#).unwrap();
        assert_eq!(config.latch.on_hold_secs, 0.5);
        assert_eq!(config.latch.off_hold_secs, 0.25);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = EngineConfig::from_toml_str("[focus\n").unwrap_err();
        assert!(matches!(err, FocusError::TomlError(_)));
    }
}

//! Engine configuration: procedural motion constants, spring tuning and the
//! well-known parameter ids the built-in behaviors look for.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration. Every field has a default, so a partial
/// JSON object is a valid config.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// When false, the engine does not reset, sample clips, or run the
    /// blink/mouth overrides; the host drives parameters directly.
    pub auto_animate: bool,
    pub blink: BlinkConfig,
    pub mouth: MouthOscillation,
    pub spring: SpringConfig,
    /// Extra parameter ids smoothed through springs each frame.
    pub smoothed_parameters: Vec<String>,
    pub secondary: SecondaryMotionConfig,
    pub names: ParameterNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_animate: true,
            blink: BlinkConfig::default(),
            mouth: MouthOscillation::default(),
            spring: SpringConfig::default(),
            smoothed_parameters: Vec::new(),
            secondary: SecondaryMotionConfig::default(),
            names: ParameterNames::default(),
        }
    }
}

/// Blink cycle timing in seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlinkConfig {
    pub period: f32,
    pub close_duration: f32,
    pub open_duration: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            period: 4.0,
            close_duration: 0.08,
            open_duration: 0.08,
        }
    }
}

/// `base + amplitude * (0.5 + 0.5 * sin(time * frequency))`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MouthOscillation {
    pub base: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for MouthOscillation {
    fn default() -> Self {
        Self {
            base: 0.2,
            amplitude: 0.3,
            frequency: 1.7,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpringConfig {
    pub omega: f32,
    pub zeta: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            omega: 10.0,
            zeta: 0.9,
        }
    }
}

/// Post-skin face deformation constants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecondaryMotionConfig {
    /// Vertical scale at eye-open 0 and 1.
    pub eye_scale: (f32, f32),
    /// Vertical scale at mouth-open 0 and 1.
    pub mouth_open_scale: (f32, f32),
    /// Horizontal scale gain per unit of mouth form.
    pub mouth_form_gain: f32,
    /// Vertical brow offset per unit of brow value, in bbox heights.
    pub brow_gain: f32,
    pub brow_min_height: f32,
}

impl Default for SecondaryMotionConfig {
    fn default() -> Self {
        Self {
            eye_scale: (0.05, 1.0),
            mouth_open_scale: (0.7, 1.3),
            mouth_form_gain: 0.2,
            brow_gain: 0.08,
            brow_min_height: 1e-4,
        }
    }
}

/// Parameter ids consulted by the built-in behaviors.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParameterNames {
    pub eye_left_open: String,
    pub eye_right_open: String,
    /// First id present in the model wins.
    pub mouth_open: Vec<String>,
    pub mouth_form: String,
    pub brow_left: String,
    pub brow_right: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            eye_left_open: "ParamEyeLOpen".into(),
            eye_right_open: "ParamEyeROpen".into(),
            mouth_open: vec!["ParamMouthOpenY".into(), "ParamMouthOpen".into()],
            mouth_form: "ParamMouthForm".into(),
            brow_left: "ParamBrowLY".into(),
            brow_right: "ParamBrowRY".into(),
        }
    }
}

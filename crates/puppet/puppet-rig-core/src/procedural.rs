//! Built-in time-driven overrides: the blink cycle and the idle mouth.

use crate::config::{BlinkConfig, MouthOscillation, ParameterNames};
use crate::interp::smoothstep;
use crate::params::ParameterStore;

/// Eye-open fraction for the blink cycle at `time`: closes over
/// `close_duration`, reopens over `open_duration`, then stays open.
pub fn blink_open(cfg: &BlinkConfig, time: f32) -> f32 {
    if !(cfg.period > 0.0) || !time.is_finite() {
        return 1.0;
    }
    let t = time.rem_euclid(cfg.period);
    let close_end = cfg.close_duration;
    let open_end = cfg.close_duration + cfg.open_duration;
    if t < close_end {
        1.0 - smoothstep(0.0, close_end, t)
    } else if t < open_end {
        smoothstep(close_end, open_end, t)
    } else {
        1.0
    }
}

/// Default idle mouth-open value at `time`.
#[inline]
pub fn mouth_oscillation(cfg: &MouthOscillation, time: f32) -> f32 {
    cfg.base + cfg.amplitude * (0.5 + 0.5 * (time * cfg.frequency).sin())
}

/// First configured mouth-open id that exists in `params`.
pub fn mouth_parameter<'a>(names: &'a ParameterNames, params: &ParameterStore) -> Option<&'a str> {
    names
        .mouth_open
        .iter()
        .map(String::as_str)
        .find(|id| params.contains(id))
}

/// Write the blink value to both eye-open parameters and the idle mouth value
/// to the mouth-open parameter, whichever of them exist.
pub fn apply_builtin_overrides(
    names: &ParameterNames,
    blink: &BlinkConfig,
    mouth: &MouthOscillation,
    time: f32,
    params: &mut ParameterStore,
) {
    let open = blink_open(blink, time);
    params.set(&names.eye_left_open, open);
    params.set(&names.eye_right_open, open);
    if let Some(id) = mouth_parameter(names, params) {
        params.set(id, mouth_oscillation(mouth, time));
    }
}

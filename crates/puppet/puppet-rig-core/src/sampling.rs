//! Keyframe sampling and clip playback.
//!
//! Model:
//! - A Track holds keys in seconds, sorted by time.
//! - Segment [k0 -> k1] uses k1's curve: v = lerp(k0.v, k1.v, ease(k1.interp, w)).
//! - Before the first key / after the last key the end values hold.
//! - Clip time is wrapped into [0, duration] by the layer's loop mode before sampling.

use serde::{Deserialize, Serialize};

use crate::data::{AnimationClip, Keyframe, Track};
use crate::interp::{ease, lerp};
use crate::params::ParameterStore;

/// Find the bracketing pair for a time strictly inside the key range.
fn find_segment(keys: &[Keyframe], time: f32) -> (usize, usize) {
    let mut lo = 0;
    let mut hi = keys.len() - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if keys[mid].time <= time {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo, hi)
}

impl Track {
    /// Sample at `time` seconds; `fallback` is returned for an empty track.
    pub fn sample(&self, time: f32, fallback: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return fallback,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        // NaN time fails both comparisons above; hold the first key.
        if time.is_nan() {
            return first.value;
        }
        let (i0, i1) = find_segment(&self.keys, time);
        let k0 = &self.keys[i0];
        let k1 = &self.keys[i1];
        let span = k1.time - k0.time;
        let w = if span > 0.0 {
            (time - k0.time) / span
        } else {
            1.0
        };
        lerp(k0.value, k1.value, ease(k1.interp, w))
    }
}

/// How clip time maps past the clip's end.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = fmod(t, 2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

/// Map absolute time into clip-local time.
pub fn wrap_time(time: f32, duration: f32, mode: LoopMode) -> f32 {
    if !(duration > 0.0) || !time.is_finite() {
        return 0.0;
    }
    match mode {
        LoopMode::Once => time.clamp(0.0, duration),
        LoopMode::Loop => fmod(time, duration),
        LoopMode::PingPong => ping_pong(time, duration),
    }
}

/// One active clip in the playback stack.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClipLayer {
    pub clip: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub mode: LoopMode,
}

fn default_speed() -> f32 {
    1.0
}

impl ClipLayer {
    pub fn looping(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            speed: 1.0,
            mode: LoopMode::Loop,
        }
    }
}

/// Sample every track of `clip` at clip-local `local_time` and write the
/// results. Tracks targeting unknown parameters are skipped; returns the
/// number of parameters written.
pub fn apply_clip(clip: &AnimationClip, local_time: f32, params: &mut ParameterStore) -> usize {
    let mut written = 0;
    for track in &clip.tracks {
        let Some(p) = params.get_mut(&track.parameter_id) else {
            log::trace!(
                "clip '{}': no parameter '{}', track skipped",
                clip.name,
                track.parameter_id
            );
            continue;
        };
        let v = track.sample(local_time, p.default_value());
        p.set(v);
        written += 1;
    }
    written
}

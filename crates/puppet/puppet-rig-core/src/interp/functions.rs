//! Interpolation helpers:
//! - ease (Linear / EaseIn / EaseOut / EaseInOut on a clamped unit input)
//! - lerp
//! - smoothstep (Hermite, with a step fallback for a zero-width edge)

use serde::{Deserialize, Serialize};

/// Curve applied to the segment that ends at a keyframe.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpMethod {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

/// Evaluate `method` at `t`, with `t` clamped to `[0, 1]` first.
#[inline]
pub fn ease(method: InterpMethod, t: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match method {
        InterpMethod::Linear => t,
        InterpMethod::EaseIn => t * t,
        InterpMethod::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
        InterpMethod::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                let k = -2.0 * t + 2.0;
                1.0 - k * k / 2.0
            }
        }
    }
}

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

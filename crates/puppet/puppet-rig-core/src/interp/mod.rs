//! Interpolation curves and scalar helpers.
//!
//! Keyframe segments pick one of four fixed curves; the procedural overrides
//! use `smoothstep`.

pub mod functions;

pub use functions::{ease, lerp, smoothstep, InterpMethod};

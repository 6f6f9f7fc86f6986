//! Per-frame input contract.
//!
//! The engine has no clock: the host supplies absolute time and the frame
//! delta, plus any expressions that should be blended this frame.

use serde::{Deserialize, Serialize};

pub use crate::accumulate::ActiveExpression;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameInputs {
    /// Absolute time in seconds (monotonic).
    pub time: f32,
    /// Seconds since the previous frame (>= 0).
    pub dt: f32,
    #[serde(default)]
    pub expressions: Vec<ActiveExpression>,
}

impl FrameInputs {
    pub fn at(time: f32, dt: f32) -> Self {
        Self {
            time,
            dt,
            expressions: Vec::new(),
        }
    }

    pub fn with_expression(mut self, name: impl Into<String>, weight: f32) -> Self {
        self.expressions.push(ActiveExpression::new(name, weight));
        self
    }
}

//! Second-order smoothing for parameter values.
//!
//! Each smoothed parameter owns one [`Spring`] for the lifetime of the engine.
//! A spring is seeded with the parameter's value the first time it is bound so
//! the first frames do not swing in from zero.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::SpringConfig;

/// Damped harmonic follower (semi-implicit Euler).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub position: f32,
    pub velocity: f32,
    /// Natural frequency (rad/s).
    pub omega: f32,
    /// Damping ratio; >= 1 does not overshoot.
    pub zeta: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(10.0, 0.9)
    }
}

impl Spring {
    pub fn new(omega: f32, zeta: f32) -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            omega,
            zeta,
        }
    }

    pub fn reset(&mut self, value: f32) {
        self.position = value;
        self.velocity = 0.0;
    }

    /// Advance by `dt` toward `target` and return the new position.
    ///
    /// Long frames are split into sub-steps no longer than
    /// `0.5 / (omega * max(zeta, 1))`; a single explicit step past that
    /// overshoots and eventually diverges.
    pub fn update(&mut self, target: f32, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let (steps, h) = self.substeps(dt);
        for _ in 0..steps {
            let force = self.omega * self.omega * (target - self.position)
                - 2.0 * self.zeta * self.omega * self.velocity;
            self.velocity += force * h;
            self.position += self.velocity * h;
        }
        self.position
    }

    /// Whether position and velocity are both finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    fn substeps(&self, dt: f32) -> (u32, f32) {
        if dt == 0.0 {
            return (0, 0.0);
        }
        let stiffness = self.omega.abs() * self.zeta.max(1.0);
        if !(stiffness.is_finite() && stiffness > 0.0) {
            return (1, dt);
        }
        let max_h = 0.5 / stiffness;
        let steps = (dt / max_h).ceil().clamp(1.0, MAX_SUBSTEPS as f32) as u32;
        // past the cap the follower has long settled; drop the excess time
        (steps, (dt / steps as f32).min(max_h))
    }
}

const MAX_SUBSTEPS: u32 = 256;

/// Springs keyed by parameter id, created lazily.
#[derive(Clone, Debug, Default)]
pub struct SpringBank {
    springs: HashMap<String, Spring>,
    defaults: SpringConfig,
}

impl SpringBank {
    pub fn new(defaults: SpringConfig) -> Self {
        Self {
            springs: HashMap::new(),
            defaults,
        }
    }

    /// Return the spring for `id`, creating it at rest on `current` if absent.
    pub fn bind(&mut self, id: &str, current: f32) -> &mut Spring {
        let defaults = self.defaults;
        self.springs.entry_ref(id).or_insert_with(|| {
            let mut s = Spring::new(defaults.omega, defaults.zeta);
            s.reset(current);
            s
        })
    }

    /// Bind (if needed) and advance the spring for `id` toward `target`.
    ///
    /// A spring whose state went non-finite is re-seeded on `target`.
    pub fn update(&mut self, id: &str, target: f32, dt: f32) -> f32 {
        let spring = self.bind(id, target);
        if !spring.is_finite() {
            log::debug!("spring '{id}' state not finite, re-seeded at {target}");
            spring.reset(target);
        }
        spring.update(target, dt)
    }

    pub fn get(&self, id: &str) -> Option<&Spring> {
        self.springs.get(id)
    }

    /// Replace the tuning of one spring without disturbing its state.
    pub fn tune(&mut self, id: &str, omega: f32, zeta: f32) -> bool {
        match self.springs.get_mut(id) {
            Some(s) => {
                s.omega = omega;
                s.zeta = zeta;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.springs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.springs.is_empty()
    }
}

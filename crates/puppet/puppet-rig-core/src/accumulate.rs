//! Accumulation of per-parameter expression contributions.
//!
//! Additive deltas are summed (`weight * delta`) per parameter. Override deltas
//! keep only the highest priority seen; on equal priority the later
//! contribution replaces the earlier one. At apply time the additive sums are
//! added onto the current values first, then overrides replace outright, so an
//! override always has the last word on its parameter.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::{Expression, ExpressionBlend, ExpressionParameter};
use crate::params::ParameterStore;

/// An expression requested for this frame with its blend weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveExpression {
    pub name: String,
    #[serde(default = "unit_weight")]
    pub weight: f32,
}

fn unit_weight() -> f32 {
    1.0
}

impl ActiveExpression {
    pub fn new(name: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct OverrideEntry {
    priority: i32,
    value: f32,
}

/// Collects contributions for one frame.
#[derive(Default, Debug)]
pub struct ExpressionBlender {
    additive: IndexMap<String, f32>,
    overrides: IndexMap<String, OverrideEntry>,
}

impl ExpressionBlender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one parameter delta of an expression active at `weight`.
    pub fn add_parameter(&mut self, ep: &ExpressionParameter, weight: f32) {
        let value = ep.delta * weight;
        match ep.mode {
            ExpressionBlend::Additive => {
                *self.additive.entry(ep.parameter_id.clone()).or_insert(0.0) += value;
            }
            ExpressionBlend::Override => {
                let entry = OverrideEntry {
                    priority: ep.priority,
                    value,
                };
                self.overrides
                    .entry(ep.parameter_id.clone())
                    .and_modify(|cur| {
                        if entry.priority >= cur.priority {
                            *cur = entry;
                        }
                    })
                    .or_insert(entry);
            }
        }
    }

    /// Record every delta of `expr`.
    pub fn add(&mut self, expr: &Expression, weight: f32) {
        for ep in &expr.parameters {
            self.add_parameter(ep, weight);
        }
    }

    /// Additive sum recorded for `id` (0 when none).
    pub fn additive_sum(&self, id: &str) -> f32 {
        self.additive.get(id).copied().unwrap_or(0.0)
    }

    /// Winning override value for `id`, if any.
    pub fn override_value(&self, id: &str) -> Option<f32> {
        self.overrides.get(id).map(|o| o.value)
    }

    pub fn is_empty(&self) -> bool {
        self.additive.is_empty() && self.overrides.is_empty()
    }

    /// Apply additive sums, then overrides, clamping each write. Unknown
    /// parameter ids are skipped.
    pub fn apply(self, params: &mut ParameterStore) {
        for (id, sum) in &self.additive {
            match params.get_mut(id) {
                Some(p) => {
                    let v = p.value() + sum;
                    p.set(v);
                }
                None => log::trace!("expression targets unknown parameter '{id}'"),
            }
        }
        for (id, o) in &self.overrides {
            if !params.set(id, o.value) {
                log::trace!("expression override targets unknown parameter '{id}'");
            }
        }
    }
}

/// Resolve `active` against `expressions` (unknown names are skipped) and
/// apply the blended result onto `params`.
pub fn blend_expressions(
    expressions: &[Expression],
    active: &[ActiveExpression],
    params: &mut ParameterStore,
) {
    if active.is_empty() {
        return;
    }
    let by_name: HashMap<&str, &Expression> =
        expressions.iter().map(|e| (e.name.as_str(), e)).collect();
    let mut blender = ExpressionBlender::new();
    for a in active {
        match by_name.get(a.name.as_str()) {
            Some(expr) => blender.add(expr, a.weight),
            None => log::debug!("unknown expression '{}' skipped", a.name),
        }
    }
    blender.apply(params);
}

//! Range-clamped scalar control parameters.
//!
//! Every write goes through [`Parameter::set`], so `min <= current <= max`
//! holds for any input. Non-finite writes follow a fixed policy:
//! `+inf` lands on `max`, `-inf` on `min`, and `NaN` falls back to the default.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serialized form; normalized into a [`Parameter`] on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ParameterDef {
    id: String,
    #[serde(default = "default_min")]
    min: f32,
    #[serde(default = "default_max")]
    max: f32,
    #[serde(default)]
    default: f32,
}

fn default_min() -> f32 {
    -1.0
}

fn default_max() -> f32 {
    1.0
}

/// A named control value with inclusive bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterDef", into = "ParameterDef")]
pub struct Parameter {
    id: String,
    min: f32,
    max: f32,
    default: f32,
    current: f32,
}

impl Parameter {
    /// Build a parameter. Swapped bounds are reordered and non-finite bounds
    /// collapse to `0.0`, so the clamp below can never see `min > max`.
    pub fn new(id: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        let lo = if min.is_finite() { min } else { 0.0 };
        let hi = if max.is_finite() { max } else { 0.0 };
        let (min, max) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let default = if default.is_finite() {
            default.clamp(min, max)
        } else {
            min
        };
        Self {
            id: id.into(),
            min,
            max,
            default,
            current: default,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn default_value(&self) -> f32 {
        self.default
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Clamp and store `v`.
    #[inline]
    pub fn set(&mut self, v: f32) {
        self.current = if v.is_nan() {
            self.default
        } else {
            v.clamp(self.min, self.max)
        };
    }

    #[inline]
    pub fn reset(&mut self) {
        self.current = self.default;
    }
}

impl From<ParameterDef> for Parameter {
    fn from(def: ParameterDef) -> Self {
        Parameter::new(def.id, def.min, def.max, def.default)
    }
}

impl From<Parameter> for ParameterDef {
    fn from(p: Parameter) -> Self {
        ParameterDef {
            id: p.id,
            min: p.min,
            max: p.max,
            default: p.default,
        }
    }
}

/// Parameters keyed by id, iterated in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct ParameterStore {
    items: IndexMap<String, Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, param: Parameter) {
        self.items.insert(param.id.clone(), param);
    }

    pub fn remove(&mut self, id: &str) -> Option<Parameter> {
        self.items.shift_remove(id)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Parameter> {
        self.items.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Parameter> {
        self.items.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Current value of `id`, if it exists.
    #[inline]
    pub fn value(&self, id: &str) -> Option<f32> {
        self.items.get(id).map(Parameter::value)
    }

    /// Clamped write. Returns false when `id` is unknown (the write is skipped).
    pub fn set(&mut self, id: &str, v: f32) -> bool {
        match self.items.get_mut(id) {
            Some(p) => {
                p.set(v);
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&mut self) {
        for p in self.items.values_mut() {
            p.reset();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<Parameter>> for ParameterStore {
    fn from(list: Vec<Parameter>) -> Self {
        let mut store = ParameterStore::new();
        for p in list {
            store.insert(p);
        }
        store
    }
}

impl From<ParameterStore> for Vec<Parameter> {
    fn from(store: ParameterStore) -> Self {
        store.items.into_values().collect()
    }
}

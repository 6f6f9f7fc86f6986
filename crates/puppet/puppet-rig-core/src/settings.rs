//! Side-car JSON settings that adjust a loaded model: paint order and
//! visibility, and face-part tags for the tag classifier.

use hashbrown::HashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Model;
use crate::error::Result;

/// `{ "order": [mesh ids, front first], "hidden": [mesh ids] }`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Listed front-most first: the first id gets the highest draw order.
    pub order: Vec<String>,
    pub hidden: Vec<String>,
}

impl RenderSettings {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Rewrite `draw_order` for every mesh and hide the listed ones.
    ///
    /// A listed mesh at index `i` gets `order.len() - 1 - i`. Unlisted meshes
    /// take a running counter in declaration order, starting at -1 so they
    /// sit behind all listed meshes (0 when no order is given).
    pub fn apply(&self, model: &mut Model) {
        let index: IndexMap<&str, i32> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), (self.order.len() - 1 - i) as i32))
            .collect();
        let hidden: HashSet<&str> = self.hidden.iter().map(String::as_str).collect();

        let mut fallback = if self.order.is_empty() { 0 } else { -1 };
        for mesh in &mut model.meshes {
            mesh.draw_order = match index.get(mesh.id.as_str()) {
                Some(&o) => o,
                None => {
                    let o = fallback;
                    fallback += 1;
                    o
                }
            };
            if hidden.contains(mesh.id.as_str()) {
                mesh.visible = false;
            }
        }

        for id in index.keys().chain(hidden.iter()) {
            if model.mesh(id).is_none() {
                log::warn!("render settings name unknown mesh '{id}'");
            }
        }
        log::info!(
            "render settings applied: {} ordered, {} hidden",
            self.order.len(),
            self.hidden.len()
        );
    }
}

/// `{ "face_parts": { tag: [mesh ids] } }`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartSettings {
    pub face_parts: IndexMap<String, Vec<String>>,
}

impl PartSettings {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Merge the tags into `model.face_parts`. Tags with no mesh ids are
    /// ignored.
    pub fn apply(&self, model: &mut Model) {
        let mut tagged = 0usize;
        for (tag, ids) in self.face_parts.iter().filter(|(_, ids)| !ids.is_empty()) {
            for id in ids {
                if model.mesh(id).is_none() {
                    log::warn!("face part '{tag}' names unknown mesh '{id}'");
                }
                model.tag_face_part(id, tag);
                tagged += 1;
            }
        }
        log::info!(
            "face parts applied: {tagged} tags over {} meshes",
            model.face_parts.len()
        );
    }
}

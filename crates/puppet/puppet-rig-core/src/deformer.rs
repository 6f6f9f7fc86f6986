//! Deformer forest: topology arena plus per-frame world transform composition.
//!
//! `DeformerGraph` is built once from the model's deformer list. It stores
//! only topology (parent / child slots and roots, addressed by arena index);
//! local position / rotation / scale are read from the deformer slice on every
//! recompute, so the model stays the single source of truth for poses.

use glam::Affine2;
use hashbrown::HashMap;

use crate::data::Deformer;
use crate::error::{Result, RigError};
use crate::ids::DeformerIndex;

/// `Translate(position) * Rotate(rotation) * Scale(scale)`.
#[inline]
pub fn local_transform(d: &Deformer) -> Affine2 {
    Affine2::from_scale_angle_translation(d.scale, d.rotation.to_radians(), d.position)
}

/// World transforms for one frame, indexed by arena slot.
#[derive(Clone, Debug, Default)]
pub struct WorldTransforms {
    slots: Vec<Option<Affine2>>,
}

impl WorldTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, idx: DeformerIndex) -> Option<&Affine2> {
        self.slots.get(idx.get()).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reset(&mut self, n: usize) {
        self.slots.clear();
        self.slots.resize(n, None);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DeformerGraph {
    ids: Vec<String>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl DeformerGraph {
    /// Validate and index `deformers`: ids must be unique, every non-empty
    /// parent must resolve, and every node must be reachable from a root.
    pub fn build(deformers: &[Deformer]) -> Result<Self> {
        let mut index = HashMap::with_capacity(deformers.len());
        for (i, d) in deformers.iter().enumerate() {
            if index.insert(d.id.clone(), i).is_some() {
                return Err(RigError::DuplicateDeformer(d.id.clone()));
            }
        }

        let mut parents = vec![None; deformers.len()];
        let mut children = vec![Vec::new(); deformers.len()];
        let mut roots = Vec::new();
        for (i, d) in deformers.iter().enumerate() {
            if d.is_root() {
                roots.push(i);
                continue;
            }
            let p = *index
                .get(d.parent.as_str())
                .ok_or_else(|| RigError::UnknownParent {
                    deformer: d.id.clone(),
                    parent: d.parent.clone(),
                })?;
            parents[i] = Some(p);
            children[p].push(i);
        }

        for d in deformers {
            for c in &d.children {
                let agrees = index
                    .get(c.as_str())
                    .is_some_and(|&ci| deformers[ci].parent == d.id);
                if !agrees {
                    log::warn!(
                        "deformer '{}' lists child '{}' whose parent link disagrees; parent links win",
                        d.id,
                        c
                    );
                }
            }
        }

        let graph = Self {
            ids: deformers.iter().map(|d| d.id.clone()).collect(),
            parents,
            children,
            roots,
            index,
        };

        let mut seen = vec![false; graph.ids.len()];
        graph.walk(|i, _| seen[i] = true);
        if let Some(i) = seen.iter().position(|s| !s) {
            return Err(RigError::Cycle(graph.ids[i].clone()));
        }
        Ok(graph)
    }

    /// Depth-first, parents before children, roots in declaration order.
    fn walk(&self, mut visit: impl FnMut(usize, Option<usize>)) {
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            visit(i, self.parents[i]);
            stack.extend(self.children[i].iter().rev().copied());
        }
    }

    #[inline]
    pub fn index_of(&self, id: &str) -> Option<DeformerIndex> {
        self.index.get(id).map(|&i| DeformerIndex(i as u32))
    }

    pub fn id(&self, idx: DeformerIndex) -> Option<&str> {
        self.ids.get(idx.get()).map(String::as_str)
    }

    pub fn parent(&self, idx: DeformerIndex) -> Option<DeformerIndex> {
        self.parents
            .get(idx.get())
            .copied()
            .flatten()
            .map(|p| DeformerIndex(p as u32))
    }

    pub fn roots(&self) -> impl Iterator<Item = DeformerIndex> + '_ {
        self.roots.iter().map(|&i| DeformerIndex(i as u32))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Full recompute into `out`: root world = local, child world =
    /// parent world * local. Slots whose deformer is missing from `deformers`
    /// (and their subtrees) stay empty.
    pub fn compute_world(&self, deformers: &[Deformer], out: &mut WorldTransforms) {
        out.reset(self.ids.len());
        self.walk(|i, parent| {
            let Some(d) = deformers.get(i) else {
                return;
            };
            let local = local_transform(d);
            out.slots[i] = match parent {
                None => Some(local),
                Some(p) => out.slots[p].map(|pw| pw * local),
            };
        });
    }

    /// Convenience wrapper returning a fresh map.
    pub fn world_transforms(&self, deformers: &[Deformer]) -> WorldTransforms {
        let mut out = WorldTransforms::new();
        self.compute_world(deformers, &mut out);
        out
    }
}

//! CPU vertex skinning (two influences per vertex).
//!
//! Output is the raw weighted sum of each influence's transformed point.
//! Weights are not renormalized, so a vertex whose weights sum to 0.5 lands
//! at half its transformed position.

use glam::Vec2;

use crate::data::{Mesh, Vertex};
use crate::deformer::{DeformerGraph, WorldTransforms};
use crate::ids::DeformerIndex;

/// Resolve a mesh's local bone list against the graph. Unknown ids become
/// `None` and are skipped at skin time.
pub fn resolve_bones(mesh: &Mesh, graph: &DeformerGraph) -> Vec<Option<DeformerIndex>> {
    mesh.deformers
        .iter()
        .map(|id| {
            let idx = graph.index_of(id);
            if idx.is_none() {
                log::warn!("mesh '{}' references unknown deformer '{}'", mesh.id, id);
            }
            idx
        })
        .collect()
}

/// Skin a single vertex.
#[inline]
pub fn skin_vertex(
    vertex: &Vertex,
    bones: &[Option<DeformerIndex>],
    world: &WorldTransforms,
) -> Vec2 {
    let mut acc = Vec2::ZERO;
    for (&bone, &weight) in vertex.bones.iter().zip(vertex.weights.iter()) {
        if !(weight > 0.0) {
            continue;
        }
        let Ok(slot) = usize::try_from(bone) else {
            continue;
        };
        let Some(Some(idx)) = bones.get(slot) else {
            continue;
        };
        let Some(m) = world.get(*idx) else {
            continue;
        };
        acc += m.transform_point2(vertex.position) * weight;
    }
    acc
}

/// Skin every vertex of a mesh into `out` (cleared first).
pub fn skin_mesh_into(
    vertices: &[Vertex],
    bones: &[Option<DeformerIndex>],
    world: &WorldTransforms,
    out: &mut Vec<Vec2>,
) {
    out.clear();
    out.extend(vertices.iter().map(|v| skin_vertex(v, bones, world)));
}

pub fn skin_mesh(
    vertices: &[Vertex],
    bones: &[Option<DeformerIndex>],
    world: &WorldTransforms,
) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(vertices.len());
    skin_mesh_into(vertices, bones, world, &mut out);
    out
}

//! Mesh renderer seam.
//!
//! The rig never talks to a graphics API directly. Hosts implement
//! [`MeshRenderer`] over their GPU backend; [`RecordingRenderer`] is a CPU-only
//! implementation that records every call, used by tests and headless runs.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::data::{BlendMode, Mesh};
use crate::ids::{IdAllocator, MeshHandle};

/// Blend equation selected per mesh, named by its source/destination factors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFunc {
    /// `src_alpha, one_minus_src_alpha`
    #[default]
    Normal,
    /// `src_alpha, one`
    Additive,
    /// `dst_color, zero`
    Multiply,
}

impl From<BlendMode> for BlendFunc {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Normal => BlendFunc::Normal,
            BlendMode::Additive => BlendFunc::Additive,
            BlendMode::Multiply => BlendFunc::Multiply,
        }
    }
}

/// Stencil/color-write state for the next draws.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StencilMode {
    /// Stencil test off, color writes on.
    #[default]
    Disabled,
    /// Color writes off, stencil always passes and replaces with 1.
    WriteMask,
    /// Color writes on, pass where stencil == 1, stencil writes off.
    TestEqual,
}

/// Render target capabilities, queried once when meshes are built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCapabilities {
    pub stencil_bits: u8,
}

impl RenderCapabilities {
    #[inline]
    pub fn has_stencil(&self) -> bool {
        self.stencil_bits > 0
    }
}

/// Per-frame state handed to the renderer before any draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameSetup {
    pub mvp: Mat4,
    /// Clear the stencil buffer along with color.
    pub clear_stencil: bool,
}

pub trait MeshRenderer {
    fn capabilities(&self) -> RenderCapabilities;

    /// Upload `mesh` (positions, uvs, colors, indices) and return its handle.
    fn create(&mut self, mesh: &Mesh) -> MeshHandle;

    /// Replace the positions of `handle`. Returns false and leaves the
    /// geometry untouched when the count does not match, or the handle is
    /// unknown.
    fn update_positions(&mut self, handle: MeshHandle, positions: &[Vec2]) -> bool;

    fn begin_frame(&mut self, setup: &FrameSetup);
    fn bind_texture(&mut self, texture_id: &str);
    fn set_opacity(&mut self, opacity: f32);
    fn set_blend(&mut self, blend: BlendFunc);
    fn set_stencil(&mut self, mode: StencilMode);
    fn clear_stencil(&mut self);

    /// Indexed triangle draw with the mesh's current buffers.
    fn draw(&mut self, handle: MeshHandle);
}

/// Floats per interleaved vertex: x, y, u, v, r, g, b.
pub const FLOATS_PER_VERTEX: usize = 7;

/// CPU-side interleaved vertex buffer plus indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterleavedMesh {
    data: Vec<f32>,
    indices: Vec<u32>,
}

impl InterleavedMesh {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut data = Vec::with_capacity(mesh.vertices.len() * FLOATS_PER_VERTEX);
        for v in &mesh.vertices {
            data.extend_from_slice(&[
                v.position.x,
                v.position.y,
                v.uv.x,
                v.uv.y,
                v.color.x,
                v.color.y,
                v.color.z,
            ]);
        }
        Self {
            data,
            indices: mesh.indices.clone(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn position(&self, i: usize) -> Option<Vec2> {
        let base = i * FLOATS_PER_VERTEX;
        let xy = self.data.get(base..base + 2)?;
        Some(Vec2::new(xy[0], xy[1]))
    }

    /// Rewrite x/y of every vertex. No-op returning false on count mismatch.
    pub fn update_positions(&mut self, positions: &[Vec2]) -> bool {
        if positions.len() != self.vertex_count() {
            return false;
        }
        for (chunk, p) in self.data.chunks_exact_mut(FLOATS_PER_VERTEX).zip(positions) {
            chunk[0] = p.x;
            chunk[1] = p.y;
        }
        true
    }
}

/// One call received by a [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Create(MeshHandle),
    UpdatePositions { handle: MeshHandle, applied: bool },
    BeginFrame { clear_stencil: bool },
    BindTexture(String),
    SetOpacity(f32),
    SetBlend(BlendFunc),
    SetStencil(StencilMode),
    ClearStencil,
    Draw(MeshHandle),
}

/// Headless renderer that keeps interleaved buffers and a call log.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    caps: RenderCapabilities,
    ids: IdAllocator,
    meshes: Vec<InterleavedMesh>,
    calls: Vec<RenderCall>,
    last_mvp: Option<Mat4>,
}

impl RecordingRenderer {
    pub fn new(stencil_bits: u8) -> Self {
        Self {
            caps: RenderCapabilities { stencil_bits },
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Drain the call log, keeping meshes.
    pub fn take_calls(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    /// Handles in the order they were drawn.
    pub fn draws(&self) -> Vec<MeshHandle> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Draw(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&InterleavedMesh> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn last_mvp(&self) -> Option<Mat4> {
        self.last_mvp
    }
}

impl MeshRenderer for RecordingRenderer {
    fn capabilities(&self) -> RenderCapabilities {
        self.caps
    }

    fn create(&mut self, mesh: &Mesh) -> MeshHandle {
        let handle = self.ids.alloc_mesh();
        self.meshes.push(InterleavedMesh::from_mesh(mesh));
        self.calls.push(RenderCall::Create(handle));
        handle
    }

    fn update_positions(&mut self, handle: MeshHandle, positions: &[Vec2]) -> bool {
        let applied = self
            .meshes
            .get_mut(handle.0 as usize)
            .is_some_and(|m| m.update_positions(positions));
        self.calls
            .push(RenderCall::UpdatePositions { handle, applied });
        applied
    }

    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.last_mvp = Some(setup.mvp);
        self.calls.push(RenderCall::BeginFrame {
            clear_stencil: setup.clear_stencil,
        });
    }

    fn bind_texture(&mut self, texture_id: &str) {
        self.calls.push(RenderCall::BindTexture(texture_id.to_string()));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.calls.push(RenderCall::SetOpacity(opacity));
    }

    fn set_blend(&mut self, blend: BlendFunc) {
        self.calls.push(RenderCall::SetBlend(blend));
    }

    fn set_stencil(&mut self, mode: StencilMode) {
        self.calls.push(RenderCall::SetStencil(mode));
    }

    fn clear_stencil(&mut self) {
        self.calls.push(RenderCall::ClearStencil);
    }

    fn draw(&mut self, handle: MeshHandle) {
        self.calls.push(RenderCall::Draw(handle));
    }
}

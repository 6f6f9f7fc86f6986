//! Opaque handles and a simple allocator.

use serde::{Deserialize, Serialize};

/// Renderer-side mesh handle returned by `MeshRenderer::create`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Arena slot of a deformer inside a `DeformerGraph`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DeformerIndex(pub u32);

impl DeformerIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for mesh handles.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_mesh: u32,
}

impl IdAllocator {
    #[inline]
    pub fn alloc_mesh(&mut self) -> MeshHandle {
        let id = MeshHandle(self.next_mesh);
        self.next_mesh = self.next_mesh.wrapping_add(1);
        id
    }
}

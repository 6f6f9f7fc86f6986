//! Draw ordering and the stencil clip state machine.
//!
//! Planning is separate from execution: [`DrawPlanner::plan`] turns the mesh
//! list into a flat [`DrawCommand`] sequence that can be inspected in tests,
//! and [`DrawPlan::execute`] replays it against a [`MeshRenderer`].
//!
//! Per mesh a clipped draw walks `WriteMask -> DrawClipped` and returns to
//! `Unclipped`; an unclipped draw stays in `Unclipped`.

use hashbrown::HashMap;

use crate::data::Mesh;
use crate::ids::MeshHandle;
use crate::renderer::{BlendFunc, MeshRenderer, RenderCapabilities, StencilMode};

/// Stencil phase a draw is issued in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClipState {
    Unclipped,
    /// Drawing the mask into the stencil buffer.
    WriteMask,
    /// Drawing the clipped mesh against the mask.
    DrawClipped,
}

impl ClipState {
    pub fn stencil(self) -> StencilMode {
        match self {
            ClipState::Unclipped => StencilMode::Disabled,
            ClipState::WriteMask => StencilMode::WriteMask,
            ClipState::DrawClipped => StencilMode::TestEqual,
        }
    }
}

/// One renderer operation. `mesh` fields index the planned mesh slice.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    SetBlend(BlendFunc),
    SetOpacity(f32),
    BindTexture(String),
    SetStencil(StencilMode),
    ClearStencil,
    Draw { mesh: usize, state: ClipState },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawPlan {
    pub commands: Vec<DrawCommand>,
}

impl DrawPlan {
    /// Mesh indices in draw order, masks included.
    pub fn drawn_meshes(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Draw { mesh, .. } => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    /// Replay against `renderer`. `handles[i]` is the handle of mesh `i`;
    /// draws whose mesh has no handle are skipped.
    pub fn execute<R: MeshRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        handles: &[Option<MeshHandle>],
    ) {
        for cmd in &self.commands {
            match cmd {
                DrawCommand::SetBlend(b) => renderer.set_blend(*b),
                DrawCommand::SetOpacity(o) => renderer.set_opacity(*o),
                DrawCommand::BindTexture(t) => renderer.bind_texture(t),
                DrawCommand::SetStencil(s) => renderer.set_stencil(*s),
                DrawCommand::ClearStencil => renderer.clear_stencil(),
                DrawCommand::Draw { mesh, .. } => match handles.get(*mesh).copied().flatten() {
                    Some(h) => renderer.draw(h),
                    None => log::debug!("mesh #{mesh} has no renderer handle, draw skipped"),
                },
            }
        }
    }
}

pub struct DrawPlanner;

impl DrawPlanner {
    /// Plan one frame: visible meshes stable-sorted by `draw_order`, each
    /// preceded by its blend and opacity. A mesh whose clip mask cannot be
    /// resolved on a stencil-capable target is dropped for the frame. Ends by
    /// restoring `BlendFunc::Normal`.
    pub fn plan(meshes: &[Mesh], caps: RenderCapabilities) -> DrawPlan {
        let by_id: HashMap<&str, usize> = meshes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, m)| (m.id.as_str(), i))
            .collect();

        let mut order: Vec<usize> = (0..meshes.len()).filter(|&i| meshes[i].visible).collect();
        order.sort_by_key(|&i| meshes[i].draw_order);

        let mut commands = Vec::with_capacity(order.len() * 5 + 1);
        for i in order {
            let mesh = &meshes[i];
            let mask_id = mesh.clip_mask_id.as_deref().filter(|id| !id.is_empty());

            let clip = match mask_id {
                Some(id) if caps.has_stencil() => match by_id.get(id) {
                    Some(&mask) => Some(mask),
                    None => {
                        log::debug!("mesh '{}': clip mask '{id}' not found, skipped", mesh.id);
                        continue;
                    }
                },
                _ => None,
            };

            commands.push(DrawCommand::SetBlend(mesh.blend_mode.into()));
            commands.push(DrawCommand::SetOpacity(mesh.opacity));
            commands.push(DrawCommand::BindTexture(mesh.texture_id.clone()));
            match clip {
                None => {
                    commands.push(DrawCommand::SetStencil(ClipState::Unclipped.stencil()));
                    commands.push(DrawCommand::Draw {
                        mesh: i,
                        state: ClipState::Unclipped,
                    });
                }
                Some(mask) => {
                    commands.push(DrawCommand::SetStencil(ClipState::WriteMask.stencil()));
                    commands.push(DrawCommand::ClearStencil);
                    commands.push(DrawCommand::Draw {
                        mesh: mask,
                        state: ClipState::WriteMask,
                    });
                    commands.push(DrawCommand::SetStencil(ClipState::DrawClipped.stencil()));
                    commands.push(DrawCommand::Draw {
                        mesh: i,
                        state: ClipState::DrawClipped,
                    });
                    commands.push(DrawCommand::SetStencil(ClipState::Unclipped.stencil()));
                }
            }
        }
        commands.push(DrawCommand::SetBlend(BlendFunc::Normal));
        DrawPlan { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BlendMode;
    use glam::{Vec2, Vec3};

    fn mesh(id: &str, order: i32) -> Mesh {
        Mesh {
            draw_order: order,
            ..Mesh::quad(id, Vec2::ONE, Vec3::ONE, "root")
        }
    }

    const STENCIL: RenderCapabilities = RenderCapabilities { stencil_bits: 8 };
    const NO_STENCIL: RenderCapabilities = RenderCapabilities { stencil_bits: 0 };

    #[test]
    fn hidden_meshes_are_not_planned() {
        let mut meshes = vec![mesh("a", 0), mesh("b", 1)];
        meshes[0].visible = false;
        assert_eq!(DrawPlanner::plan(&meshes, STENCIL).drawn_meshes(), vec![1]);
    }

    #[test]
    fn blend_is_selected_then_restored() {
        let mut m = mesh("glow", 0);
        m.blend_mode = BlendMode::Additive;
        m.opacity = 0.25;
        let plan = DrawPlanner::plan(&[m], NO_STENCIL);
        assert_eq!(plan.commands[0], DrawCommand::SetBlend(BlendFunc::Additive));
        assert_eq!(plan.commands[1], DrawCommand::SetOpacity(0.25));
        assert_eq!(
            plan.commands.last(),
            Some(&DrawCommand::SetBlend(BlendFunc::Normal))
        );
    }

    #[test]
    fn clipped_mesh_follows_stencil_recipe() {
        let mut target = mesh("iris", 1);
        target.texture_id = "tex_iris".into();
        target.clip_mask_id = Some("mask".into());
        let meshes = vec![mesh("mask", 0), target];
        let plan = DrawPlanner::plan(&meshes, STENCIL);
        let tail: Vec<_> = plan.commands[plan.commands.len() - 10..].to_vec();
        assert_eq!(
            tail,
            vec![
                DrawCommand::SetBlend(BlendFunc::Normal),
                DrawCommand::SetOpacity(1.0),
                DrawCommand::BindTexture("tex_iris".into()),
                DrawCommand::SetStencil(StencilMode::WriteMask),
                DrawCommand::ClearStencil,
                DrawCommand::Draw {
                    mesh: 0,
                    state: ClipState::WriteMask
                },
                DrawCommand::SetStencil(StencilMode::TestEqual),
                DrawCommand::Draw {
                    mesh: 1,
                    state: ClipState::DrawClipped
                },
                DrawCommand::SetStencil(StencilMode::Disabled),
                DrawCommand::SetBlend(BlendFunc::Normal),
            ]
        );
    }

    #[test]
    fn empty_mask_id_draws_unclipped() {
        let mut target = mesh("iris", 0);
        target.clip_mask_id = Some(String::new());
        let plan = DrawPlanner::plan(&[target], STENCIL);
        assert_eq!(plan.drawn_meshes(), vec![0]);
        assert!(plan.commands.contains(&DrawCommand::Draw {
            mesh: 0,
            state: ClipState::Unclipped
        }));
        assert!(!plan.commands.contains(&DrawCommand::ClearStencil));
    }

    #[test]
    fn without_stencil_clip_is_ignored() {
        let mut target = mesh("iris", 0);
        target.clip_mask_id = Some("missing".into());
        let plan = DrawPlanner::plan(&[target], NO_STENCIL);
        assert_eq!(plan.drawn_meshes(), vec![0]);
        assert!(!plan.commands.contains(&DrawCommand::ClearStencil));
    }
}

//! Engine: owns the model plus every per-frame cache, and runs the pipeline.
//!
//! Methods:
//! - new (validate + index), build_meshes (renderer handles)
//! - step: reset -> clips -> expressions -> built-ins -> springs -> deformers
//!   -> skin + secondary motion
//! - upload / render / frame

use glam::{Mat4, Vec2};
use hashbrown::HashMap;

use crate::accumulate::blend_expressions;
use crate::config::Config;
use crate::data::Model;
use crate::deformer::{DeformerGraph, WorldTransforms};
use crate::draw::{DrawPlan, DrawPlanner};
use crate::error::{Result, RigError};
use crate::ids::{DeformerIndex, MeshHandle};
use crate::inputs::FrameInputs;
use crate::procedural::{apply_builtin_overrides, blink_open, mouth_oscillation, mouth_parameter};
use crate::projection::projection;
use crate::renderer::{FrameSetup, MeshRenderer, RenderCapabilities};
use crate::sampling::{apply_clip, wrap_time, ClipLayer};
use crate::secondary::{
    apply_secondary_motion, FacePartClassifier, FaceRoles, FaceState, NameClassifier,
    TagClassifier,
};
use crate::settings::{PartSettings, RenderSettings};
use crate::skinning::{resolve_bones, skin_mesh, skin_mesh_into};
use crate::spring::SpringBank;

pub struct Engine {
    model: Model,
    cfg: Config,
    graph: DeformerGraph,
    mesh_index: HashMap<String, usize>,
    /// Per mesh: local bone slot -> arena index.
    bones: Vec<Vec<Option<DeformerIndex>>>,
    world: WorldTransforms,
    springs: SpringBank,
    layers: Vec<ClipLayer>,
    classifier: Box<dyn FacePartClassifier>,
    roles: Vec<FaceRoles>,
    deformed: Vec<Vec<Vec2>>,
    handles: Vec<Option<MeshHandle>>,
    caps: RenderCapabilities,
    view: Mat4,
}

fn default_classifier(model: &Model) -> Box<dyn FacePartClassifier> {
    if model.face_parts.is_empty() {
        Box::new(NameClassifier)
    } else {
        Box::new(TagClassifier::new(model.face_parts.clone()))
    }
}

impl Engine {
    /// Validate the deformer forest and mesh ids, and resolve every mesh's
    /// bone list. The first clip (if any) plays looped.
    pub fn new(model: Model, cfg: Config) -> Result<Self> {
        let graph = DeformerGraph::build(&model.deformers)?;

        let mut mesh_index = HashMap::with_capacity(model.meshes.len());
        for (i, m) in model.meshes.iter().enumerate() {
            if mesh_index.insert(m.id.clone(), i).is_some() {
                return Err(RigError::DuplicateMesh(m.id.clone()));
            }
        }

        let bones: Vec<_> = model
            .meshes
            .iter()
            .map(|m| resolve_bones(m, &graph))
            .collect();
        let world = graph.world_transforms(&model.deformers);
        let deformed = model
            .meshes
            .iter()
            .zip(&bones)
            .map(|(m, b)| skin_mesh(&m.vertices, b, &world))
            .collect();
        let layers = model
            .animations
            .first()
            .map(|c| vec![ClipLayer::looping(&c.name)])
            .unwrap_or_default();
        let classifier = default_classifier(&model);
        let roles = model
            .meshes
            .iter()
            .map(|m| classifier.classify(&m.id))
            .collect();

        log::info!(
            "rig engine: {} parameters, {} deformers, {} meshes, {} clips, {} expressions",
            model.parameters.len(),
            graph.len(),
            model.meshes.len(),
            model.animations.len(),
            model.expressions.len()
        );

        Ok(Self {
            springs: SpringBank::new(cfg.spring),
            handles: vec![None; model.meshes.len()],
            model,
            cfg,
            graph,
            mesh_index,
            bones,
            world,
            layers,
            classifier,
            roles,
            deformed,
            caps: RenderCapabilities::default(),
            view: Mat4::IDENTITY,
        })
    }

    /// Create renderer-side meshes and query target capabilities.
    pub fn build_meshes(&mut self, renderer: &mut dyn MeshRenderer) {
        self.handles = self
            .model
            .meshes
            .iter()
            .map(|m| Some(renderer.create(m)))
            .collect();
        self.caps = renderer.capabilities();
        log::info!(
            "built {} meshes, stencil bits: {}",
            self.handles.len(),
            self.caps.stencil_bits
        );
    }

    /// Advance the rig to `inputs.time`. Never fails; bad references are
    /// skipped and out-of-range values clamp.
    pub fn step(&mut self, inputs: &FrameInputs) {
        let time = inputs.time;
        let dt = if inputs.dt.is_finite() {
            inputs.dt.max(0.0)
        } else {
            0.0
        };

        if self.cfg.auto_animate {
            self.model.reset_parameters();
            for layer in &self.layers {
                let Some(clip) = self.model.animations.iter().find(|c| c.name == layer.clip)
                else {
                    log::trace!("clip layer '{}' has no clip", layer.clip);
                    continue;
                };
                let local = wrap_time(time * layer.speed, clip.duration, layer.mode);
                apply_clip(clip, local, &mut self.model.parameters);
            }
        }

        blend_expressions(
            &self.model.expressions,
            &inputs.expressions,
            &mut self.model.parameters,
        );

        if self.cfg.auto_animate {
            apply_builtin_overrides(
                &self.cfg.names,
                &self.cfg.blink,
                &self.cfg.mouth,
                time,
                &mut self.model.parameters,
            );
        }

        let mouth_id = mouth_parameter(&self.cfg.names, &self.model.parameters);
        let smoothed = mouth_id.into_iter().chain(
            self.cfg
                .smoothed_parameters
                .iter()
                .map(String::as_str)
                .filter(|id| Some(*id) != mouth_id),
        );
        for id in smoothed {
            let Some(target) = self.model.parameters.value(id) else {
                log::trace!("smoothed parameter '{id}' not in model");
                continue;
            };
            let v = self.springs.update(id, target, dt);
            self.model.parameters.set(id, v);
        }

        self.graph
            .compute_world(&self.model.deformers, &mut self.world);

        let face = self.face_state(time, mouth_id);
        for (i, mesh) in self.model.meshes.iter().enumerate() {
            let out = &mut self.deformed[i];
            skin_mesh_into(&mesh.vertices, &self.bones[i], &self.world, out);
            apply_secondary_motion(out, self.roles[i], &face, &self.cfg.secondary);
        }
    }

    fn face_state(&self, time: f32, mouth_id: Option<&str>) -> FaceState {
        let params = &self.model.parameters;
        let names = &self.cfg.names;
        let blink = blink_open(&self.cfg.blink, time);
        let mouth_fallback = if self.cfg.auto_animate {
            mouth_oscillation(&self.cfg.mouth, time)
        } else {
            0.0
        };
        FaceState {
            eye_left_open: params.value(&names.eye_left_open).unwrap_or(blink),
            eye_right_open: params.value(&names.eye_right_open).unwrap_or(blink),
            mouth_open: mouth_id
                .and_then(|id| params.value(id))
                .unwrap_or(mouth_fallback),
            mouth_form: params.value(&names.mouth_form).unwrap_or(0.0),
            brow_left: params.value(&names.brow_left).unwrap_or(0.0),
            brow_right: params.value(&names.brow_right).unwrap_or(0.0),
        }
    }

    /// Push this frame's deformed positions to the renderer.
    pub fn upload(&self, renderer: &mut dyn MeshRenderer) {
        for (i, positions) in self.deformed.iter().enumerate() {
            let Some(handle) = self.handles[i] else {
                continue;
            };
            if !renderer.update_positions(handle, positions) {
                log::debug!(
                    "mesh '{}': position update rejected ({} vertices)",
                    self.model.meshes[i].id,
                    positions.len()
                );
            }
        }
    }

    /// Current draw plan for the built capabilities.
    pub fn plan(&self) -> DrawPlan {
        DrawPlanner::plan(&self.model.meshes, self.caps)
    }

    /// Begin the frame and issue every draw.
    pub fn render(&self, renderer: &mut dyn MeshRenderer, fb_width: u32, fb_height: u32) {
        let mvp = projection(fb_width, fb_height, self.model.canvas, self.view);
        renderer.begin_frame(&FrameSetup {
            mvp,
            clear_stencil: self.caps.has_stencil(),
        });
        self.plan().execute(renderer, &self.handles);
    }

    /// `step`, `upload` and `render` in order.
    pub fn frame(
        &mut self,
        inputs: &FrameInputs,
        renderer: &mut dyn MeshRenderer,
        fb_width: u32,
        fb_height: u32,
    ) {
        self.step(inputs);
        self.upload(renderer);
        self.render(renderer, fb_width, fb_height);
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn parameters(&self) -> &crate::params::ParameterStore {
        &self.model.parameters
    }

    /// Direct parameter access. With `auto_animate` on, values are reset at
    /// the start of every step.
    pub fn parameters_mut(&mut self) -> &mut crate::params::ParameterStore {
        &mut self.model.parameters
    }

    pub fn deformed_positions(&self, mesh_id: &str) -> Option<&[Vec2]> {
        self.mesh_index
            .get(mesh_id)
            .map(|&i| self.deformed[i].as_slice())
    }

    pub fn world_transforms(&self) -> &WorldTransforms {
        &self.world
    }

    pub fn graph(&self) -> &DeformerGraph {
        &self.graph
    }

    pub fn springs(&self) -> &SpringBank {
        &self.springs
    }

    pub fn springs_mut(&mut self) -> &mut SpringBank {
        &mut self.springs
    }

    pub fn roles(&self, mesh_id: &str) -> Option<FaceRoles> {
        self.mesh_index.get(mesh_id).map(|&i| self.roles[i])
    }

    /// Swap the face-part strategy; roles are reclassified immediately.
    pub fn set_classifier(&mut self, classifier: Box<dyn FacePartClassifier>) {
        self.classifier = classifier;
        self.reclassify();
    }

    fn reclassify(&mut self) {
        self.roles = self
            .model
            .meshes
            .iter()
            .map(|m| self.classifier.classify(&m.id))
            .collect();
    }

    pub fn clip_layers(&self) -> &[ClipLayer] {
        &self.layers
    }

    /// Replace the playback stack. Later layers win on shared parameters.
    pub fn set_clip_layers(&mut self, layers: Vec<ClipLayer>) {
        for l in &layers {
            if self.model.clip(&l.clip).is_none() {
                log::warn!("clip layer names unknown clip '{}'", l.clip);
            }
        }
        self.layers = layers;
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn capabilities(&self) -> RenderCapabilities {
        self.caps
    }

    pub fn handle(&self, mesh_id: &str) -> Option<MeshHandle> {
        self.mesh_index.get(mesh_id).and_then(|&i| self.handles[i])
    }

    pub fn apply_render_settings(&mut self, settings: &RenderSettings) {
        settings.apply(&mut self.model);
    }

    /// Merge face-part tags and switch to tag classification.
    pub fn apply_part_settings(&mut self, settings: &PartSettings) {
        settings.apply(&mut self.model);
        self.classifier = default_classifier(&self.model);
        self.reclassify();
    }
}

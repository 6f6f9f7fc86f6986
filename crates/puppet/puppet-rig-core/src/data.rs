//! Rig data model: keyframe clips, expressions, deformers and drawable meshes.
//!
//! The model is produced once by a loader (or built in code) and then mutated
//! in place every frame by the engine.

use glam::{Vec2, Vec3};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::interp::InterpMethod;
use crate::params::{Parameter, ParameterStore};

/// A single key in seconds. `interp` shapes the segment ending here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub interp: InterpMethod,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, interp: InterpMethod) -> Self {
        Self {
            time,
            value,
            interp,
        }
    }
}

/// Keyframe channel for one parameter. Keys are assumed sorted by time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub parameter_id: String,
    pub keys: Vec<Keyframe>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Seconds.
    #[serde(default = "default_duration")]
    pub duration: f32,
    pub tracks: Vec<Track>,
}

fn default_duration() -> f32 {
    1.0
}

/// How an expression delta combines with the sampled value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionBlend {
    #[default]
    Additive,
    Override,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionParameter {
    pub parameter_id: String,
    pub delta: f32,
    #[serde(default)]
    pub mode: ExpressionBlend,
    /// Only consulted for `Override`.
    #[serde(default)]
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub name: String,
    pub parameters: Vec<ExpressionParameter>,
}

/// A bone-like 2D transform node. An empty `parent` marks a root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deformer {
    pub id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub position: Vec2,
    /// Degrees, counter-clockwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub bound_meshes: Vec<String>,
}

fn unit_scale() -> Vec2 {
    Vec2::ONE
}

impl Deformer {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: String::new(),
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            children: Vec::new(),
            bound_meshes: Vec::new(),
        }
    }

    pub fn child_of(id: impl Into<String>, parent: impl Into<String>, position: Vec2) -> Self {
        Self {
            parent: parent.into(),
            position,
            ..Self::root(id)
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Mesh compositing mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
}

/// Mesh vertex. `bones` index into the owning mesh's `deformers` list.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec2,
    #[serde(default)]
    pub uv: Vec2,
    #[serde(default = "white")]
    pub color: Vec3,
    #[serde(default)]
    pub bones: [i32; 2],
    #[serde(default = "single_bone")]
    pub weights: [f32; 2],
}

fn white() -> Vec3 {
    Vec3::ONE
}

fn single_bone() -> [f32; 2] {
    [1.0, 0.0]
}

impl Vertex {
    /// Vertex fully bound to local bone 0.
    pub fn rigid(position: Vec2, uv: Vec2, color: Vec3) -> Self {
        Self {
            position,
            uv,
            color,
            bones: [0, 0],
            weights: single_bone(),
        }
    }
}

fn default_opacity() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// A textured, skinned drawable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub id: String,
    #[serde(default)]
    pub texture_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_mask_id: Option<String>,
    #[serde(default)]
    pub draw_order: i32,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Local bone index space for `Vertex::bones`.
    #[serde(default)]
    pub deformers: Vec<String>,
}

impl Mesh {
    /// Axis-aligned quad of half extents `half`, rigidly bound to `deformer`.
    pub fn quad(id: impl Into<String>, half: Vec2, color: Vec3, deformer: impl Into<String>) -> Self {
        let corners = [
            (Vec2::new(-half.x, -half.y), Vec2::new(0.0, 0.0)),
            (Vec2::new(half.x, -half.y), Vec2::new(1.0, 0.0)),
            (Vec2::new(half.x, half.y), Vec2::new(1.0, 1.0)),
            (Vec2::new(-half.x, half.y), Vec2::new(0.0, 1.0)),
        ];
        Self {
            id: id.into(),
            texture_id: String::new(),
            clip_mask_id: None,
            draw_order: 0,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            visible: true,
            vertices: corners
                .iter()
                .map(|(p, uv)| Vertex::rigid(*p, *uv, color))
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
            deformers: vec![deformer.into()],
        }
    }
}

/// The populated rig.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub parameters: ParameterStore,
    #[serde(default)]
    pub expressions: Vec<Expression>,
    #[serde(default)]
    pub deformers: Vec<Deformer>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
    /// Mesh id -> classification tags (e.g. `eye_left`, `mouth`).
    #[serde(default)]
    pub face_parts: HashMap<String, HashSet<String>>,
    /// Authoring canvas size used for aspect-fit projection.
    #[serde(default = "default_canvas")]
    pub canvas: Vec2,
}

fn default_canvas() -> Vec2 {
    Vec2::new(1920.0, 1080.0)
}

impl Default for Model {
    fn default() -> Self {
        Self {
            parameters: ParameterStore::default(),
            expressions: Vec::new(),
            deformers: Vec::new(),
            meshes: Vec::new(),
            animations: Vec::new(),
            face_parts: HashMap::new(),
            canvas: default_canvas(),
        }
    }
}

impl Model {
    pub fn reset_parameters(&mut self) {
        self.parameters.reset_all();
    }

    pub fn add_parameter(&mut self, id: &str, min: f32, max: f32, default: f32) {
        self.parameters.insert(Parameter::new(id, min, max, default));
    }

    /// Register the conventional face-rig parameter set.
    pub fn add_standard_parameters(&mut self) {
        for id in [
            "ParamAngleX",
            "ParamAngleY",
            "ParamAngleZ",
            "ParamBodyAngleX",
            "ParamBodyAngleY",
            "ParamBodyAngleZ",
        ] {
            self.add_parameter(id, -30.0, 30.0, 0.0);
        }
        self.add_parameter("ParamEyeLOpen", 0.0, 1.0, 1.0);
        self.add_parameter("ParamEyeROpen", 0.0, 1.0, 1.0);
        for id in [
            "ParamEyeBallX",
            "ParamEyeBallY",
            "ParamBrowLY",
            "ParamBrowRY",
            "ParamBrowLForm",
            "ParamBrowRForm",
        ] {
            self.add_parameter(id, -1.0, 1.0, 0.0);
        }
        self.add_parameter("ParamMouthOpenY", 0.0, 1.0, 0.0);
        for id in [
            "ParamMouthForm",
            "ParamHairFront",
            "ParamHairSide",
            "ParamHairSide2",
            "ParamHairBack",
            "ParamHairFrontFuwa",
            "ParamHairSideFuwa",
            "ParamHairBackFuwa",
        ] {
            self.add_parameter(id, -1.0, 1.0, 0.0);
        }
    }

    pub fn mesh(&self, id: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.id == id)
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|c| c.name == name)
    }

    /// Tag `mesh_id` with a face-part label.
    pub fn tag_face_part(&mut self, mesh_id: &str, tag: &str) {
        self.face_parts
            .entry(mesh_id.to_string())
            .or_default()
            .insert(tag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_parameters_have_expected_ranges() {
        let mut model = Model::default();
        model.add_standard_parameters();
        assert_eq!(model.parameters.len(), 23);
        let eye = model.parameters.get("ParamEyeLOpen").unwrap();
        assert_eq!((eye.min(), eye.max(), eye.value()), (0.0, 1.0, 1.0));
        let angle = model.parameters.get("ParamAngleZ").unwrap();
        assert_eq!((angle.min(), angle.max()), (-30.0, 30.0));
    }

    #[test]
    fn mesh_json_defaults() {
        let mesh: Mesh = serde_json::from_str(
            r#"{"id":"m","vertices":[{"position":[1,2]}],"indices":[0,0,0]}"#,
        )
        .unwrap();
        assert_eq!(mesh.opacity, 1.0);
        assert!(mesh.visible);
        assert_eq!(mesh.blend_mode, BlendMode::Normal);
        assert_eq!(mesh.clip_mask_id, None);
        let v = mesh.vertices[0];
        assert_eq!(v.weights, [1.0, 0.0]);
        assert_eq!(v.color, Vec3::ONE);
    }

    #[test]
    fn quad_is_two_triangles_on_one_bone() {
        let q = Mesh::quad("q", Vec2::new(0.5, 0.25), Vec3::ONE, "def");
        assert_eq!(q.vertices.len(), 4);
        assert_eq!(q.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(q.deformers, vec!["def".to_string()]);
        assert_eq!(q.vertices[2].position, Vec2::new(0.5, 0.25));
    }
}

//! Puppet Rig Core (renderer-agnostic)
//!
//! Parameter-driven 2D puppet pipeline: keyframe clips and expressions drive a
//! named parameter store, springs smooth selected parameters, a deformer
//! forest composes world transforms, meshes are skinned on the CPU and given
//! face-part secondary motion, and a draw planner emits an ordered,
//! stencil-clip-aware command list for a host [`MeshRenderer`].
//!
//! The per-frame path never returns errors. Only [`Engine::new`] and the
//! settings parsers can fail.

pub mod accumulate;
pub mod config;
pub mod data;
pub mod deformer;
pub mod draw;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod params;
pub mod procedural;
pub mod projection;
pub mod renderer;
pub mod sampling;
pub mod secondary;
pub mod settings;
pub mod skinning;
pub mod spring;

// Re-exports for hosts
pub use accumulate::{blend_expressions, ActiveExpression, ExpressionBlender};
pub use config::{
    BlinkConfig, Config, MouthOscillation, ParameterNames, SecondaryMotionConfig, SpringConfig,
};
pub use data::{
    AnimationClip, BlendMode, Deformer, Expression, ExpressionBlend, ExpressionParameter,
    Keyframe, Mesh, Model, Track, Vertex,
};
pub use deformer::{DeformerGraph, WorldTransforms};
pub use draw::{ClipState, DrawCommand, DrawPlan, DrawPlanner};
pub use engine::Engine;
pub use error::{Result, RigError};
pub use ids::{DeformerIndex, MeshHandle};
pub use inputs::FrameInputs;
pub use interp::{ease, lerp, smoothstep, InterpMethod};
pub use params::{Parameter, ParameterStore};
pub use procedural::{blink_open, mouth_oscillation};
pub use projection::projection;
pub use renderer::{
    BlendFunc, FrameSetup, InterleavedMesh, MeshRenderer, RecordingRenderer, RenderCall,
    RenderCapabilities, StencilMode,
};
pub use sampling::{apply_clip, wrap_time, ClipLayer, LoopMode};
pub use secondary::{
    apply_secondary_motion, FacePartClassifier, FaceRoles, FaceState, NameClassifier,
    TagClassifier,
};
pub use settings::{PartSettings, RenderSettings};
pub use skinning::{skin_mesh, skin_vertex};
pub use spring::{Spring, SpringBank};

//! Post-skin secondary motion for face parts (eyes, mouth, brows).
//!
//! Classification is a swappable strategy: [`TagClassifier`] reads explicit
//! tags attached at load time, [`NameClassifier`] falls back to substring
//! matching on the mesh id. Effects are computed against a fresh bounding box
//! of the mesh's current (already skinned) positions.

use glam::Vec2;
use hashbrown::{HashMap, HashSet};

use crate::config::SecondaryMotionConfig;
use crate::interp::lerp;

const LEFT_EYE_TAGS: &[&str] = &["eye_left", "eyelid_left", "eye_white_left", "eye_ball_left"];
const RIGHT_EYE_TAGS: &[&str] = &[
    "eye_right",
    "eyelid_right",
    "eye_white_right",
    "eye_ball_right",
];
const GENERIC_EYE_TAGS: &[&str] = &["eye"];
const MOUTH_TAGS: &[&str] = &["mouth", "lip_upper", "lip_lower", "tongue", "teeth"];
const BROW_LEFT_TAGS: &[&str] = &["brow_left"];
const BROW_RIGHT_TAGS: &[&str] = &["brow_right"];

/// Which face roles a mesh plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceRoles {
    pub left_eye: bool,
    pub right_eye: bool,
    pub generic_eye: bool,
    pub mouth: bool,
    pub brow_left: bool,
    pub brow_right: bool,
}

impl FaceRoles {
    #[inline]
    pub fn is_eye(&self) -> bool {
        self.left_eye || self.right_eye || self.generic_eye
    }

    #[inline]
    pub fn is_brow(&self) -> bool {
        self.brow_left || self.brow_right
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.is_eye() && !self.mouth && !self.is_brow()
    }
}

/// Maps a mesh id to its face roles.
pub trait FacePartClassifier {
    fn classify(&self, mesh_id: &str) -> FaceRoles;
}

/// Classification from explicit per-mesh tag sets.
#[derive(Clone, Debug, Default)]
pub struct TagClassifier {
    tags: HashMap<String, HashSet<String>>,
}

impl TagClassifier {
    pub fn new(tags: HashMap<String, HashSet<String>>) -> Self {
        Self { tags }
    }

    fn has_any(&self, mesh_id: &str, wanted: &[&str]) -> bool {
        self.tags
            .get(mesh_id)
            .is_some_and(|set| wanted.iter().any(|t| set.contains(*t)))
    }
}

impl FacePartClassifier for TagClassifier {
    fn classify(&self, mesh_id: &str) -> FaceRoles {
        FaceRoles {
            left_eye: self.has_any(mesh_id, LEFT_EYE_TAGS),
            right_eye: self.has_any(mesh_id, RIGHT_EYE_TAGS),
            generic_eye: self.has_any(mesh_id, GENERIC_EYE_TAGS),
            mouth: self.has_any(mesh_id, MOUTH_TAGS),
            brow_left: self.has_any(mesh_id, BROW_LEFT_TAGS),
            brow_right: self.has_any(mesh_id, BROW_RIGHT_TAGS),
        }
    }
}

/// Case-insensitive substring heuristic on the mesh id. Never yields brows or
/// sided eyes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameClassifier;

impl FacePartClassifier for NameClassifier {
    fn classify(&self, mesh_id: &str) -> FaceRoles {
        let id = mesh_id.to_lowercase();
        FaceRoles {
            generic_eye: id.contains("eye") && !id.contains("brow"),
            mouth: id.contains("mouth") || id.contains("lip"),
            ..FaceRoles::default()
        }
    }
}

/// Parameter values the heuristics read this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceState {
    pub eye_left_open: f32,
    pub eye_right_open: f32,
    pub mouth_open: f32,
    pub mouth_form: f32,
    pub brow_left: f32,
    pub brow_right: f32,
}

impl Default for FaceState {
    fn default() -> Self {
        Self {
            eye_left_open: 1.0,
            eye_right_open: 1.0,
            mouth_open: 0.0,
            mouth_form: 0.0,
            brow_left: 0.0,
            brow_right: 0.0,
        }
    }
}

impl FaceState {
    #[inline]
    pub fn eye_open_average(&self) -> f32 {
        0.5 * (self.eye_left_open + self.eye_right_open)
    }
}

/// Axis-aligned bounds of `points`, or `None` when empty.
pub fn bounds(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
    )
}

/// Scale vertically about the bbox's vertical center.
pub fn scale_y(points: &mut [Vec2], scale: f32) {
    let Some((lo, hi)) = bounds(points) else {
        return;
    };
    let cy = (lo.y + hi.y) * 0.5;
    for p in points.iter_mut() {
        p.y = cy + (p.y - cy) * scale;
    }
}

/// Scale horizontally about the bbox's horizontal center.
pub fn scale_x(points: &mut [Vec2], scale: f32) {
    let Some((lo, hi)) = bounds(points) else {
        return;
    };
    let cx = (lo.x + hi.x) * 0.5;
    for p in points.iter_mut() {
        p.x = cx + (p.x - cx) * scale;
    }
}

pub fn translate_y(points: &mut [Vec2], offset: f32) {
    for p in points.iter_mut() {
        p.y += offset;
    }
}

/// Apply every effect `roles` calls for to one mesh's skinned positions.
pub fn apply_secondary_motion(
    points: &mut [Vec2],
    roles: FaceRoles,
    face: &FaceState,
    cfg: &SecondaryMotionConfig,
) {
    if points.is_empty() || roles.is_empty() {
        return;
    }

    if roles.is_eye() {
        let open = if roles.left_eye {
            face.eye_left_open
        } else if roles.right_eye {
            face.eye_right_open
        } else {
            face.eye_open_average()
        };
        scale_y(points, lerp(cfg.eye_scale.0, cfg.eye_scale.1, open));
    }

    if roles.mouth {
        let (closed, open) = cfg.mouth_open_scale;
        scale_y(points, lerp(closed, open, face.mouth_open));
        scale_x(points, 1.0 + face.mouth_form * cfg.mouth_form_gain);
    }

    if roles.is_brow() {
        let brow = if roles.brow_left {
            face.brow_left
        } else {
            face.brow_right
        };
        if let Some((lo, hi)) = bounds(points) {
            let height = (hi.y - lo.y).max(cfg.brow_min_height);
            translate_y(points, brow * height * cfg.brow_gain);
        }
    }
}

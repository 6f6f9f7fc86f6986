//! Load-time errors. The per-frame pipeline never fails; it skips, clamps or
//! no-ops instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("duplicate deformer id '{0}'")]
    DuplicateDeformer(String),

    #[error("duplicate mesh id '{0}'")]
    DuplicateMesh(String),

    #[error("deformer '{deformer}' names unknown parent '{parent}'")]
    UnknownParent { deformer: String, parent: String },

    #[error("deformer parent chain through '{0}' forms a cycle")]
    Cycle(String),

    #[error("settings json parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RigError>;

use std::collections::TryReserveError;

use thiserror::Error;

use crate::services::ServiceError;

use super::descriptor::ResourceKind;
use super::state::RenderMode;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("malformed {record}: {message}")]
    Format {
        record: &'static str,
        message: String,
    },
    #[error("scene index {index} is outside the lookup table range 1..={max_valid}")]
    Range { index: u16, max_valid: usize },
    #[error("scene index {index} maps to descriptor resource 0 (scene absent)")]
    ZeroEntry { index: u16 },
    #[error("a scene is already loaded")]
    AlreadyLoaded,
    #[error("cannot {operation}: no scene loaded")]
    NotLoaded { operation: &'static str },
    #[error("cannot skip: scene queue is empty")]
    EmptyQueue,
    #[error("failed to allocate resource table of {entries} entries: {source}")]
    Allocation {
        entries: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("failed to fetch resource {resource}: {source}")]
    ResourceFetch {
        resource: u16,
        #[source]
        source: ServiceError,
    },
    #[error("resource {resource} ({kind:?}) conflicts with {mode:?} render mode")]
    ModeConflict {
        resource: u16,
        kind: ResourceKind,
        mode: RenderMode,
    },
    #[error("resource {resource} is a second {kind:?} in one scene")]
    DuplicateResource { resource: u16, kind: ResourceKind },
    #[error("failed to load resource {resource} ({kind:?}): {source}")]
    Decode {
        resource: u16,
        kind: ResourceKind,
        #[source]
        source: ServiceError,
    },
    #[error("failed to load scene script {script}: {source}")]
    Script {
        script: u16,
        #[source]
        source: ServiceError,
    },
    #[error("cannot draw scene: {message}")]
    Render { message: String },
}

impl SceneError {
    pub(crate) fn format(record: &'static str, message: impl Into<String>) -> Self {
        SceneError::Format {
            record,
            message: message.into(),
        }
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineState;

/// Reasons a work phase refuses to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a task before starting")]
    MissingTask,
    #[error("replace the placeholder with the task you are working on")]
    PlaceholderTask,
}

/// Failure to persist the document. Reads never fail; they fall back to defaults.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: EngineState,
    },
}

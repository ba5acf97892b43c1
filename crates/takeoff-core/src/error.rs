use std::path::PathBuf;

use crate::lifecycle::TakeoffStatus;

#[derive(Debug, thiserror::Error)]
pub enum TakeoffError {
    #[error("drawing extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("page {page} not found in drawing")]
    PageOutOfRange { page: usize },

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("invalid user inputs: {0}")]
    InvalidInputs(String),

    #[error("unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("invalid answer '{value}' for question '{question_id}'")]
    InvalidAnswer { question_id: String, value: String },

    #[error("cannot move takeoff from {from} to {to}")]
    InvalidTransition {
        from: TakeoffStatus,
        to: TakeoffStatus,
    },

    #[error("takeoff was modified concurrently (expected revision {expected}, found {actual})")]
    RevisionConflict { expected: u64, actual: u64 },

    #[error("takeoff '{id}' is {status}; quotes need a verified or locked takeoff")]
    NotVerified { id: String, status: TakeoffStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage that produced no usable frame regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStage {
    /// The region detector found no contours at all.
    RegionDetection,
    /// Candidates existed but none matched the perforation envelope.
    PerforationFilter,
}

impl fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStage::RegionDetection => write!(f, "region detection"),
            DetectionStage::PerforationFilter => write!(f, "perforation filter"),
        }
    }
}

/// Errors produced while processing one source image.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("No frame regions detected in '{name}' (after {stage})")]
    NoRegionsDetected { name: String, stage: DetectionStage },

    #[error("Collaborator failure for '{name}': {reason}")]
    CollaboratorFailure { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FrameError {
    pub fn invalid_input(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidInput {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn collaborator(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::CollaboratorFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

//! Error types for feature derivation and scoring.

use thiserror::Error;

/// Shared `Result` alias for the scoring core.
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Failures surfaced by the feature deriver and the scoring engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// A field was present but malformed.
    #[error("[FRS-1001] invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// No classifier has been loaded into the engine.
    #[error("[FRS-2001] no classifier loaded")]
    ModelUnavailable,

    /// A candidate classifier failed validation and was not installed.
    #[error("[FRS-2002] classifier {model} rejected: {reason}")]
    ModelRejected { model: String, reason: String },

    /// Feature vector length disagrees with the classifier input dimension.
    #[error("[FRS-3001] feature schema mismatch: classifier expects {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// The classifier backend failed or returned an unusable output.
    #[error("[FRS-3002] inference failed in {model}: {details}")]
    InferenceFailed { model: String, details: String },
}

/// How the request boundary should answer a failed scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientError,
    ServiceUnavailable,
    InternalError,
}

impl ErrorClass {
    /// HTTP-style status code used in rejection replies.
    pub const fn status(self) -> u16 {
        match self {
            Self::ClientError => 400,
            Self::ServiceUnavailable => 503,
            Self::InternalError => 500,
        }
    }
}

impl ScoringError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn inference_failed(model: &str, details: impl Into<String>) -> Self {
        Self::InferenceFailed {
            model: model.to_string(),
            details: details.into(),
        }
    }

    pub fn model_rejected(model: &str, reason: impl Into<String>) -> Self {
        Self::ModelRejected {
            model: model.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-parseable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "FRS-1001",
            Self::ModelUnavailable => "FRS-2001",
            Self::ModelRejected { .. } => "FRS-2002",
            Self::SchemaMismatch { .. } => "FRS-3001",
            Self::InferenceFailed { .. } => "FRS-3002",
        }
    }

    /// Short kind name used in rejection replies and metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelRejected { .. } => "model_rejected",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InferenceFailed { .. } => "inference_failed",
        }
    }

    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput { .. } => ErrorClass::ClientError,
            Self::ModelUnavailable => ErrorClass::ServiceUnavailable,
            Self::ModelRejected { .. }
            | Self::SchemaMismatch { .. }
            | Self::InferenceFailed { .. } => {
                ErrorClass::InternalError
            }
        }
    }
}

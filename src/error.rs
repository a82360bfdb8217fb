//! Error types for schema inference

use thiserror::Error;

use crate::model::ContentType;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, InferError>;

/// Fatal errors that abort an inference run.
///
/// Sampling and decoding failures surface here. Profiling anomalies do not:
/// they are absorbed by the profiler and reported as [`ProfileWarning`]s.
#[derive(Debug, Error)]
pub enum InferError {
    /// The source could not be classified; the caller must name a content type
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    /// The decoded sample contains no records
    #[error("empty sample: no records found in input data")]
    EmptySample,

    /// The decoder or tokenizer rejected the sample
    #[error("malformed sample: {reason}")]
    MalformedSample { reason: String },

    /// No decoder is wired for this content type
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(ContentType),

    /// A whole-document read exceeded the configured ceiling
    #[error("sample too large: {content_type} input exceeds {limit} bytes")]
    SampleTooLarge { content_type: ContentType, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferError {
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        InferError::MalformedSample {
            reason: reason.to_string(),
        }
    }
}

/// Non-fatal anomalies recorded while profiling a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWarning {
    /// The uniqueness tracker could not take another value; the column is
    /// treated as not unique from here on
    UniquenessCheckFailure { column: String, reason: String },
    /// A nested (non-scalar) value was stored as opaque text
    NestedValue { column: String, example: String },
}

impl std::fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileWarning::UniquenessCheckFailure { column, reason } => {
                write!(f, "uniqueness check failed for '{}': {}", column, reason)
            }
            ProfileWarning::NestedValue { column, example } => {
                write!(f, "nested values in '{}', example: {}", column, example)
            }
        }
    }
}

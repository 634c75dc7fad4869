//! SPD codec error type.

use thiserror::Error;

/// Error type for SPD image loading, decoding and encoding.
///
/// Every variant names the field or offset responsible so callers can tell
/// the user exactly what was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpdError {
    #[error("SPD image must be {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("{field} out of range: {detail}")]
    OutOfRange { field: String, detail: String },
    #[error("invalid {field} input {input:?}: {reason}")]
    InvalidEncoding {
        field: &'static str,
        input: String,
        reason: String,
    },
    #[error("manufacturer not found in registry: {0}")]
    NotFound(String),
    #[error("no baseline image loaded")]
    NoBaseline,
    #[error("unsupported memory type 0x{dram_type:02X} (expected DDR4 0x0C)")]
    Unsupported { dram_type: u8 },
}

impl SpdError {
    pub(crate) fn out_of_range(field: impl Into<String>, detail: impl Into<String>) -> Self {
        SpdError::OutOfRange {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, input: &str, reason: impl Into<String>) -> Self {
        SpdError::InvalidEncoding {
            field,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SpdResult<T> = Result<T, SpdError>;

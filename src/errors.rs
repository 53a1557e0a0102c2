//! Central error types for ggml-multipart.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Bad magic: expected {expected:#010x}, got {actual:#010x} (not a legacy ggml file)")]
    BadMagic { expected: u32, actual: u32 },

    #[error("Truncated input while reading {what}")]
    Truncated { what: &'static str },

    #[error("Tensor frame declares {n_dims} dimensions; only 1 or 2 are supported")]
    UnsupportedRank { n_dims: i32 },

    #[error("Tensor '{name}': shard boundary at element {boundary} bisects a {block}-element quantization block")]
    UnsplittableBlockBoundary {
        name: String,
        boundary: usize,
        block: usize,
    },

    #[error("Tensor '{name}': row of {row_elements} elements is not a whole number of {block}-element blocks")]
    MisalignedRow {
        name: String,
        row_elements: usize,
        block: usize,
    },

    #[error("Tensor '{name}' is one-dimensional and cannot be split by row or column")]
    CannotSplitVector { name: String },

    #[error("Tensor '{name}': cannot split extent {extent} into {parts} non-empty shards")]
    TooManyParts {
        name: String,
        extent: usize,
        parts: usize,
    },

    #[error("Unknown encoding tag {0} (expected 0=f32, 1=f16, 2=q4_0, 3=q4_1)")]
    UnknownEncoding(i32),

    #[error("Malformed frame for tensor '{name}': {reason}")]
    MalformedFrame { name: String, reason: String },

    #[error("Invalid hyperparameter {field}: {value}")]
    InvalidHyperparameter { field: &'static str, value: i32 },

    #[error("Invalid part count {0}: must be at least 1")]
    InvalidPartCount(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Map an I/O error from a fixed-size read: EOF becomes [`ConvertError::Truncated`].
    pub(crate) fn from_read(e: std::io::Error, what: &'static str) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ConvertError::Truncated { what }
        } else {
            ConvertError::Io(e)
        }
    }
}

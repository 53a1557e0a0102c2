//! # ggml-multipart
//!
//! Split a single-file legacy ggml model checkpoint into a header file plus N part
//! files, one per tensor-parallel worker.
//!
//! ## Layout
//!
//! - **Header file**: the byte-identical prefix of the source (magic, hyperparameters,
//!   vocabulary).
//! - **Part files**: for every source tensor, in order, a frame with the shard's own
//!   extents followed by the shard data.
//! - **Splitting**: tensors are split by row or by column according to their name;
//!   vectors and unmatched names are replicated into every part. Quantized tensors
//!   are only split on block boundaries.

pub mod config;
pub mod converter;
pub mod diagnostics;
pub mod errors;
pub mod model;
pub mod split;

pub use config::SplitConfig;
pub use converter::{
    backup_path, backup_source, convert, part_path, split_file, ConversionReport, SplitPaths,
    TensorRecord,
};
pub use diagnostics::Diagnostic;
pub use errors::{ConvertError, Result};
pub use model::{
    inspect_model, read_frame, read_header, write_frame, write_header, BlockLayout,
    BlockLayouts, Encoding, Hyperparameters, TensorFrame, Vocabulary, GGML_MAGIC,
};
pub use split::{classify, partition, reassemble, split_ranges, ShardDescriptor, SplitAxis};

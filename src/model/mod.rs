//! Legacy ggml model file: primitives, header, vocabulary and tensor frames.

pub mod encoding;
pub mod frame;
pub mod ggml;
pub mod hparams;
pub mod io;
pub mod vocab;

pub use encoding::{BlockLayout, BlockLayouts, Encoding, Q4_0_BLOCK, Q4_1_BLOCK};
pub use frame::{read_frame, write_frame, TensorFrame};
pub use ggml::{
    ensure_ggml, inspect_model, probe_magic, read_header, write_header, InspectResult,
    TensorInfoInspect, GGML_MAGIC,
};
pub use hparams::Hyperparameters;
pub use vocab::{VocabSummary, Vocabulary, PAD_TOKEN};

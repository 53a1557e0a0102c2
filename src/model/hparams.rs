//! Model hyperparameters as stored in the legacy ggml header.

use crate::errors::{ConvertError, Result};
use crate::model::io::{read_i32, write_i32};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// The seven i32 hyperparameters that follow the magic number, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Vocabulary size, including the synthesized padding token.
    pub n_vocab: i32,
    /// Embedding width.
    pub n_embd: i32,
    /// Feed-forward width multiplier.
    pub n_mult: i32,
    /// Attention head count.
    pub n_head: i32,
    /// Transformer layer count.
    pub n_layer: i32,
    /// Rotary embedding dimension.
    pub n_rot: i32,
    /// Model-level encoding tag; tensors may override it in their own frame.
    pub encoding: i32,
}

impl Hyperparameters {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let hparams = Self {
            n_vocab: read_i32(r, "n_vocab")?,
            n_embd: read_i32(r, "n_embd")?,
            n_mult: read_i32(r, "n_mult")?,
            n_head: read_i32(r, "n_head")?,
            n_layer: read_i32(r, "n_layer")?,
            n_rot: read_i32(r, "n_rot")?,
            encoding: read_i32(r, "encoding")?,
        };
        if hparams.n_vocab < 1 {
            return Err(ConvertError::InvalidHyperparameter {
                field: "n_vocab",
                value: hparams.n_vocab,
            });
        }
        Ok(hparams)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        for v in [
            self.n_vocab,
            self.n_embd,
            self.n_mult,
            self.n_head,
            self.n_layer,
            self.n_rot,
            self.encoding,
        ] {
            write_i32(w, v)?;
        }
        Ok(())
    }

    /// Number of vocabulary entries physically present in the stream.
    pub fn stored_vocab_entries(&self) -> usize {
        (self.n_vocab.max(1) - 1) as usize
    }
}

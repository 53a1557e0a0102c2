//! Non-fatal conditions observed during a run.
//!
//! Each one is logged through `tracing` when it is raised and kept in the
//! conversion report; none of them changes control flow.

use serde::Serialize;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A tensor's own encoding tag differs from the model-level tag.
    EncodingMismatch {
        tensor: String,
        tensor_encoding: i32,
        model_encoding: i32,
    },
}

impl Diagnostic {
    /// Emit as a structured `warn!` event.
    pub fn log(&self) {
        match self {
            Diagnostic::EncodingMismatch {
                tensor,
                tensor_encoding,
                model_encoding,
            } => warn!(
                tensor = %tensor,
                tensor_encoding,
                model_encoding,
                "tensor encoding differs from model hyperparameters"
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EncodingMismatch {
                tensor,
                tensor_encoding,
                model_encoding,
            } => write!(
                f,
                "tensor {} has encoding {}, model hyperparameters specify {}",
                tensor, tensor_encoding, model_encoding
            ),
        }
    }
}

/// Collects diagnostics for one run, logging each as it arrives.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, d: Diagnostic) {
        d.log();
        self.items.push(d);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

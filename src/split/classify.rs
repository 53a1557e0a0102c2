//! Name-based split classification.

use crate::model::frame::TensorFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a tensor is distributed across part files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitAxis {
    /// Each part gets a contiguous run of whole rows.
    Row,
    /// Each part gets a contiguous range of columns from every row.
    Column,
    /// Every part gets an identical copy.
    Unsplit,
}

impl fmt::Display for SplitAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SplitAxis::Row => "row",
            SplitAxis::Column => "column",
            SplitAxis::Unsplit => "unsplit",
        })
    }
}

/// One classification rule: every substring in `all_of` must occur in the name.
#[derive(Debug, Clone, Copy)]
pub struct SplitRule {
    pub all_of: &'static [&'static str],
    pub axis: SplitAxis,
}

/// Ordered rules; the first match wins. The specific `layers` projections must stay
/// ahead of the generic `layers` rule.
pub const SPLIT_RULES: &[SplitRule] = &[
    SplitRule {
        all_of: &["tok_embeddings"],
        axis: SplitAxis::Row,
    },
    SplitRule {
        all_of: &["layers", "attention.wo.weight"],
        axis: SplitAxis::Row,
    },
    SplitRule {
        all_of: &["layers", "feed_forward.w2.weight"],
        axis: SplitAxis::Row,
    },
    SplitRule {
        all_of: &["layers"],
        axis: SplitAxis::Column,
    },
    SplitRule {
        all_of: &["output"],
        axis: SplitAxis::Column,
    },
];

/// Classify a tensor by name alone. Names matching no rule are [`SplitAxis::Unsplit`].
pub fn classify(name: &str) -> SplitAxis {
    SPLIT_RULES
        .iter()
        .find(|rule| rule.all_of.iter().all(|s| name.contains(s)))
        .map(|rule| rule.axis)
        .unwrap_or(SplitAxis::Unsplit)
}

impl SplitAxis {
    /// Axis actually used for a frame: vectors are always replicated, whatever their
    /// name says (`layers.N.attention_norm.weight` matches the `layers` rule).
    pub fn for_frame(frame: &TensorFrame) -> Self {
        if frame.n_dims() < 2 {
            SplitAxis::Unsplit
        } else {
            classify(&frame.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::encoding::Encoding;

    #[test]
    fn llama_tensor_names() {
        let cases = [
            ("tok_embeddings.weight", SplitAxis::Row),
            ("layers.3.attention.wo.weight", SplitAxis::Row),
            ("layers.3.feed_forward.w2.weight", SplitAxis::Row),
            ("layers.3.attention.wq.weight", SplitAxis::Column),
            ("layers.3.attention.wk.weight", SplitAxis::Column),
            ("layers.3.attention.wv.weight", SplitAxis::Column),
            ("layers.3.feed_forward.w1.weight", SplitAxis::Column),
            ("layers.3.feed_forward.w3.weight", SplitAxis::Column),
            ("output.weight", SplitAxis::Column),
            ("norm.weight", SplitAxis::Unsplit),
            ("rope.freqs", SplitAxis::Unsplit),
        ];
        for (name, axis) in cases {
            assert_eq!(classify(name), axis, "{}", name);
        }
    }

    #[test]
    fn specific_layer_rules_precede_generic() {
        assert_eq!(classify("layers.0.attention.wo.weight"), SplitAxis::Row);
        // Matches both "layers" and "output"; the layers rule comes first.
        assert_eq!(classify("layers.0.feed_forward.output"), SplitAxis::Column);
        // Without "layers" the wo suffix alone means nothing.
        assert_eq!(classify("attention.wo.weight"), SplitAxis::Unsplit);
    }

    #[test]
    fn vectors_are_replicated() {
        let norm = TensorFrame::new("layers.0.attention_norm.weight", Encoding::F32, vec![64]);
        assert_eq!(classify(&norm.name), SplitAxis::Column);
        assert_eq!(SplitAxis::for_frame(&norm), SplitAxis::Unsplit);
        let wq = TensorFrame::new("layers.0.attention.wq.weight", Encoding::F32, vec![8, 8]);
        assert_eq!(SplitAxis::for_frame(&wq), SplitAxis::Column);
    }
}

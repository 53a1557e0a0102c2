//! Token vocabulary: an immutable, contiguously indexed bidirectional map.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

/// Sentinel stored at the last index; it has no bytes in the file.
pub const PAD_TOKEN: &[u8] = b"<pad>";

/// Index <-> token bytes. Built once from the header and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, usize>,
}

impl Vocabulary {
    /// Build from the tokens read out of the stream, then append [`PAD_TOKEN`].
    ///
    /// If the same bytes appear more than once the reverse lookup resolves to the
    /// highest index.
    pub fn from_stored(stored: Vec<Vec<u8>>) -> Self {
        let mut tokens = stored;
        tokens.push(PAD_TOKEN.to_vec());
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: usize) -> Option<&[u8]> {
        self.tokens.get(id).map(Vec::as_slice)
    }

    /// Token text for display; malformed UTF-8 is replaced, never rejected.
    pub fn token_text(&self, id: usize) -> Option<Cow<'_, str>> {
        self.token(id).map(String::from_utf8_lossy)
    }

    pub fn id_of(&self, token: &[u8]) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Index of the synthesized padding token.
    pub fn pad_id(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    /// Tokens stored in the file, i.e. everything except the padding entry.
    pub fn stored(&self) -> &[Vec<u8>] {
        &self.tokens[..self.tokens.len().saturating_sub(1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.tokens.iter().enumerate().map(|(i, t)| (i, t.as_slice()))
    }

    pub fn summary(&self) -> VocabSummary {
        VocabSummary {
            entries: self.len(),
            pad_id: self.pad_id(),
            invalid_utf8: self
                .tokens
                .iter()
                .filter(|t| std::str::from_utf8(t).is_err())
                .count(),
        }
    }
}

/// Compact description used in reports.
#[derive(Debug, Clone, Serialize)]
pub struct VocabSummary {
    pub entries: usize,
    pub pad_id: usize,
    pub invalid_utf8: usize,
}

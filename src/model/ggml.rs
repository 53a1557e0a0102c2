//! Legacy (unversioned) ggml header codec and model inspection.
//!
//! Header layout: `magic:u32 | 7 x i32 hyperparameters | (n_vocab - 1) x {len:u32, bytes}`.
//! Tensor frames follow directly (see [`crate::model::frame`]).

use crate::diagnostics::Diagnostics;
use crate::errors::{ConvertError, Result};
use crate::model::encoding::BlockLayouts;
use crate::model::frame::{read_frame, TensorFrame};
use crate::model::hparams::Hyperparameters;
use crate::model::io::{read_bytes, read_u32, write_bytes, write_u32, TeeReader};
use crate::model::vocab::{VocabSummary, Vocabulary};
use crate::split::SplitAxis;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// "ggml" as a little-endian u32.
pub const GGML_MAGIC: u32 = 0x6767_6d6c;

/// Read magic, hyperparameters and vocabulary from `source`, copying every consumed
/// byte into `header_out`.
///
/// The magic is checked before anything is written, so a bad-magic source leaves
/// `header_out` empty.
pub fn read_header<R: Read, W: Write>(
    source: &mut R,
    header_out: &mut W,
) -> Result<(Hyperparameters, Vocabulary)> {
    let magic = read_u32(source, "magic")?;
    if magic != GGML_MAGIC {
        return Err(ConvertError::BadMagic {
            expected: GGML_MAGIC,
            actual: magic,
        });
    }
    write_u32(header_out, magic)?;

    let mut tee = TeeReader::new(source, header_out);
    let hparams = Hyperparameters::read(&mut tee)?;
    let vocab = read_vocab(&mut tee, &hparams)?;
    Ok((hparams, vocab))
}

fn read_vocab<R: Read>(r: &mut R, hparams: &Hyperparameters) -> Result<Vocabulary> {
    let n = hparams.stored_vocab_entries();
    let mut stored = Vec::with_capacity(n.min(1 << 20));
    for _ in 0..n {
        let len = read_u32(r, "vocab token length")? as usize;
        stored.push(read_bytes(r, len, "vocab token")?);
    }
    Ok(Vocabulary::from_stored(stored))
}

/// Encode a header. The padding token is not written.
pub fn write_header<W: Write>(
    w: &mut W,
    hparams: &Hyperparameters,
    vocab: &Vocabulary,
) -> Result<()> {
    write_u32(w, GGML_MAGIC)?;
    hparams.write(w)?;
    for token in vocab.stored() {
        let len = u32::try_from(token.len()).map_err(|_| {
            ConvertError::InvalidConfig(format!("token of {} bytes is too long", token.len()))
        })?;
        write_u32(w, len)?;
        write_bytes(w, token)?;
    }
    Ok(())
}

/// Read just the magic number of a file.
pub fn probe_magic(path: impl AsRef<Path>) -> Result<u32> {
    let mut file = File::open(path.as_ref())?;
    read_u32(&mut file, "magic")
}

/// Fail with [`ConvertError::BadMagic`] unless `path` starts with [`GGML_MAGIC`].
pub fn ensure_ggml(path: impl AsRef<Path>) -> Result<()> {
    let magic = probe_magic(path)?;
    if magic != GGML_MAGIC {
        return Err(ConvertError::BadMagic {
            expected: GGML_MAGIC,
            actual: magic,
        });
    }
    Ok(())
}

/// One tensor as seen by [`inspect_model`].
#[derive(Debug, Clone, Serialize)]
pub struct TensorInfoInspect {
    #[serde(flatten)]
    pub frame: TensorFrame,
    pub data_bytes: usize,
    pub split: SplitAxis,
}

/// Result of [`inspect_model`]: header values plus the split plan for every tensor.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub hparams: Hyperparameters,
    pub vocab: VocabSummary,
    pub tensors: Vec<TensorInfoInspect>,
    pub diagnostics: Vec<crate::diagnostics::Diagnostic>,
}

/// Walk a single-file model without writing anything and report how it would split.
pub fn inspect_model(path: impl AsRef<Path>, layouts: &BlockLayouts) -> Result<InspectResult> {
    let mut source = BufReader::new(File::open(path.as_ref())?);
    let (hparams, vocab) = read_header(&mut source, &mut io::sink())?;
    let mut diagnostics = Diagnostics::new();
    let mut tensors = Vec::new();
    while let Some(frame) = read_frame(&mut source, hparams.encoding, &mut diagnostics)? {
        let data_bytes = frame.data_len(layouts)?;
        // Data is skipped, not validated, but a short file is still an error.
        let skipped = io::copy(&mut source.by_ref().take(data_bytes as u64), &mut io::sink())?;
        if skipped != data_bytes as u64 {
            return Err(ConvertError::Truncated {
                what: "tensor data",
            });
        }
        let split = SplitAxis::for_frame(&frame);
        tensors.push(TensorInfoInspect {
            frame,
            data_bytes,
            split,
        });
    }
    Ok(InspectResult {
        hparams,
        vocab: vocab.summary(),
        tensors,
        diagnostics: diagnostics.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocab::PAD_TOKEN;
    use std::io::Cursor;

    fn hparams(n_vocab: i32) -> Hyperparameters {
        Hyperparameters {
            n_vocab,
            n_embd: 4,
            n_mult: 1,
            n_head: 1,
            n_layer: 1,
            n_rot: 4,
            encoding: 0,
        }
    }

    fn header_bytes(n_vocab: i32, tokens: &[&[u8]]) -> Vec<u8> {
        let vocab = Vocabulary::from_stored(tokens.iter().map(|t| t.to_vec()).collect());
        let mut buf = Vec::new();
        write_header(&mut buf, &hparams(n_vocab), &vocab).unwrap();
        buf
    }

    #[test]
    fn header_copied_byte_for_byte() {
        let bytes = header_bytes(3, &[b"a", &[0xc3, 0x28]]);
        let mut with_tail = bytes.clone();
        with_tail.extend_from_slice(&[1, 0, 0, 0]);
        let mut src = Cursor::new(with_tail);
        let mut out: Vec<u8> = Vec::new();
        let (h, v) = read_header(&mut src, &mut out).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(src.position() as usize, bytes.len());
        assert_eq!(h, hparams(3));
        assert_eq!(v.len(), 3);
        assert_eq!(v.token(1), Some(&[0xc3, 0x28][..]));
        assert_eq!(v.token(2), Some(PAD_TOKEN));
    }

    #[test]
    fn bad_magic_writes_nothing() {
        let mut bytes = header_bytes(2, &[b"x"]);
        bytes[..4].copy_from_slice(&0x4655_4747u32.to_le_bytes());
        let mut out: Vec<u8> = Vec::new();
        let err = read_header(&mut Cursor::new(bytes), &mut out).unwrap_err();
        assert!(matches!(err, ConvertError::BadMagic { actual: 0x4655_4747, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_vocab() {
        let mut bytes = header_bytes(3, &[b"hello", b"world"]);
        bytes.truncate(bytes.len() - 2);
        let err = read_header(&mut Cursor::new(bytes), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, ConvertError::Truncated { what: "vocab token" }));
    }

    #[test]
    fn single_entry_vocab_is_only_pad() {
        let bytes = header_bytes(1, &[]);
        assert_eq!(bytes.len(), 32);
        let (_, v) = read_header(&mut Cursor::new(bytes), &mut Vec::<u8>::new()).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.pad_id(), 0);
    }
}

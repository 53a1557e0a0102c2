//! Tensor frames: the frontmatter in front of every tensor's raw data.
//!
//! Layout (all little-endian): `n_dims:i32 | name_len:i32 | encoding:i32 |
//! extents:n_dims x i32 | name:name_len bytes`, followed by the raw data.
//! Source files and part files use the same framing.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{ConvertError, Result};
use crate::model::encoding::{BlockLayouts, Encoding};
use crate::model::io::{read_bytes, read_i32, read_i32_or_eof, write_bytes, write_i32};
use serde::Serialize;
use std::io::{Read, Write};

/// Maximum rank a frame may declare.
pub const MAX_DIMS: i32 = 2;

/// Descriptor of one tensor (or one shard of a tensor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorFrame {
    /// Display form of the name; invalid UTF-8 is replaced.
    pub name: String,
    /// Name exactly as stored in the file.
    #[serde(skip)]
    pub name_bytes: Vec<u8>,
    pub encoding: Encoding,
    /// Extents in stored order, outer to inner: `[rows, cols]` or `[len]`.
    pub extents: Vec<usize>,
}

impl TensorFrame {
    pub fn new(name: impl Into<String>, encoding: Encoding, extents: Vec<usize>) -> Self {
        let name = name.into();
        Self {
            name_bytes: name.as_bytes().to_vec(),
            name,
            encoding,
            extents,
        }
    }

    /// Frame whose name is raw file bytes, which need not be UTF-8.
    pub fn from_raw_name(name_bytes: Vec<u8>, encoding: Encoding, extents: Vec<usize>) -> Self {
        Self {
            name: String::from_utf8_lossy(&name_bytes).into_owned(),
            name_bytes,
            encoding,
            extents,
        }
    }

    pub fn n_dims(&self) -> usize {
        self.extents.len()
    }

    /// Outer extent; 1 for vectors.
    pub fn rows(&self) -> usize {
        match self.extents.as_slice() {
            [rows, _] => *rows,
            _ => 1,
        }
    }

    /// Inner (contiguous) extent.
    pub fn cols(&self) -> usize {
        self.extents.last().copied().unwrap_or(0)
    }

    pub fn element_count(&self) -> usize {
        self.extents.iter().product()
    }

    /// Bytes of one row. Quantized rows must hold a whole number of blocks.
    pub fn row_bytes(&self, layouts: &BlockLayouts) -> Result<usize> {
        let layout = layouts.layout(self.encoding);
        layout
            .bytes_for(self.cols())
            .ok_or_else(|| ConvertError::MisalignedRow {
                name: self.name.clone(),
                row_elements: self.cols(),
                block: layout.elements,
            })
    }

    /// Size of the raw data block that follows this frame.
    pub fn data_len(&self, layouts: &BlockLayouts) -> Result<usize> {
        let row = self.row_bytes(layouts)?;
        row.checked_mul(self.rows())
            .ok_or_else(|| ConvertError::MalformedFrame {
                name: self.name.clone(),
                reason: "data size overflows usize".into(),
            })
    }

    /// Same name and encoding with different extents.
    pub fn with_extents(&self, extents: Vec<usize>) -> Self {
        Self {
            name: self.name.clone(),
            name_bytes: self.name_bytes.clone(),
            encoding: self.encoding,
            extents,
        }
    }

    /// Encoding mismatch against the model-level tag, if any.
    pub fn check_encoding(&self, model_encoding: i32) -> Option<Diagnostic> {
        (self.encoding.tag() != model_encoding).then(|| Diagnostic::EncodingMismatch {
            tensor: self.name.clone(),
            tensor_encoding: self.encoding.tag(),
            model_encoding,
        })
    }
}

/// Read the next frame. `Ok(None)` when the stream ends exactly at a frame boundary.
///
/// An encoding that differs from `model_encoding` is pushed to `diagnostics` and the
/// frame is still returned.
pub fn read_frame<R: Read>(
    r: &mut R,
    model_encoding: i32,
    diagnostics: &mut Diagnostics,
) -> Result<Option<TensorFrame>> {
    let n_dims = match read_i32_or_eof(r, "frame n_dims")? {
        Some(n) => n,
        None => return Ok(None),
    };
    let name_len = read_i32(r, "frame name length")?;
    let tag = read_i32(r, "frame encoding")?;
    if !(1..=MAX_DIMS).contains(&n_dims) {
        return Err(ConvertError::UnsupportedRank { n_dims });
    }

    let mut raw_extents = Vec::with_capacity(n_dims as usize);
    for _ in 0..n_dims {
        raw_extents.push(read_i32(r, "frame extents")?);
    }
    if name_len < 0 {
        return Err(ConvertError::MalformedFrame {
            name: String::new(),
            reason: format!(
                "negative name length {} (n_dims {}, encoding tag {}, extents {:?})",
                name_len, n_dims, tag, raw_extents
            ),
        });
    }
    let name_bytes = read_bytes(r, name_len as usize, "tensor name")?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();

    let mut extents = Vec::with_capacity(raw_extents.len());
    for e in raw_extents {
        if e <= 0 {
            return Err(ConvertError::MalformedFrame {
                name,
                reason: format!("non-positive extent {}", e),
            });
        }
        extents.push(e as usize);
    }

    let frame = TensorFrame {
        name,
        name_bytes,
        encoding: Encoding::from_tag(tag)?,
        extents,
    };
    if let Some(d) = frame.check_encoding(model_encoding) {
        diagnostics.push(d);
    }
    Ok(Some(frame))
}

/// Write a frame's frontmatter (not its data).
pub fn write_frame<W: Write>(w: &mut W, frame: &TensorFrame) -> Result<()> {
    let name = frame.name_bytes.as_slice();
    write_i32(w, to_i32(frame.n_dims(), &frame.name)?)?;
    write_i32(w, to_i32(name.len(), &frame.name)?)?;
    write_i32(w, frame.encoding.tag())?;
    for &e in &frame.extents {
        write_i32(w, to_i32(e, &frame.name)?)?;
    }
    write_bytes(w, name)
}

fn to_i32(v: usize, name: &str) -> Result<i32> {
    i32::try_from(v).map_err(|_| ConvertError::MalformedFrame {
        name: name.to_string(),
        reason: format!("value {} does not fit in i32", v),
    })
}

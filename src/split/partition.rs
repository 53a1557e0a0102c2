//! Shard partitioning of a tensor's raw bytes.
//!
//! Data is row-major: a tensor with extents `[rows, cols]` stores `rows` rows of
//! `cols` contiguous elements. Row shards are contiguous byte runs; column shards are
//! gathered from every row.

use crate::errors::{ConvertError, Result};
use crate::model::encoding::BlockLayouts;
use crate::model::frame::TensorFrame;
use crate::split::classify::SplitAxis;
use rayon::prelude::*;
use std::ops::Range;

/// One part's slice of a tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    /// Extents of this shard in stored order.
    pub extents: Vec<usize>,
    pub data: Vec<u8>,
}

impl ShardDescriptor {
    /// Frame to write in front of this shard.
    pub fn frame(&self, parent: &TensorFrame) -> TensorFrame {
        parent.with_extents(self.extents.clone())
    }
}

/// Split `0..total` into `parts` contiguous ranges whose lengths differ by at most one;
/// the first `total % parts` ranges are the longer ones.
pub fn split_ranges(total: usize, parts: usize) -> Vec<Range<usize>> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let extra = total % parts;
    let mut start = 0;
    (0..parts)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let r = start..start + len;
            start += len;
            r
        })
        .collect()
}

/// Partition `raw` (the data block of `frame`) into `parts` shards along `axis`.
pub fn partition(
    frame: &TensorFrame,
    raw: &[u8],
    axis: SplitAxis,
    layouts: &BlockLayouts,
    parts: usize,
) -> Result<Vec<ShardDescriptor>> {
    if parts == 0 {
        return Err(ConvertError::InvalidPartCount(parts));
    }
    let expected = frame.data_len(layouts)?;
    if raw.len() != expected {
        return Err(ConvertError::MalformedFrame {
            name: frame.name.clone(),
            reason: format!("expected {} data bytes, got {}", expected, raw.len()),
        });
    }

    match axis {
        SplitAxis::Unsplit => Ok(vec![
            ShardDescriptor {
                extents: frame.extents.clone(),
                data: raw.to_vec(),
            };
            parts
        ]),
        _ if frame.n_dims() != 2 => Err(ConvertError::CannotSplitVector {
            name: frame.name.clone(),
        }),
        SplitAxis::Row => split_rows(frame, raw, layouts, parts),
        SplitAxis::Column => split_columns(frame, raw, layouts, parts),
    }
}

fn check_extent(frame: &TensorFrame, extent: usize, parts: usize) -> Result<()> {
    if parts > extent {
        return Err(ConvertError::TooManyParts {
            name: frame.name.clone(),
            extent,
            parts,
        });
    }
    Ok(())
}

fn split_rows(
    frame: &TensorFrame,
    raw: &[u8],
    layouts: &BlockLayouts,
    parts: usize,
) -> Result<Vec<ShardDescriptor>> {
    let (rows, cols) = (frame.rows(), frame.cols());
    check_extent(frame, rows, parts)?;
    let row_bytes = frame.row_bytes(layouts)?;

    Ok(split_ranges(rows, parts)
        .into_iter()
        .map(|r| ShardDescriptor {
            extents: vec![r.len(), cols],
            data: raw[r.start * row_bytes..r.end * row_bytes].to_vec(),
        })
        .collect())
}

fn split_columns(
    frame: &TensorFrame,
    raw: &[u8],
    layouts: &BlockLayouts,
    parts: usize,
) -> Result<Vec<ShardDescriptor>> {
    let (rows, cols) = (frame.rows(), frame.cols());
    check_extent(frame, cols, parts)?;
    let layout = layouts.layout(frame.encoding);
    let ranges = split_ranges(cols, parts);
    if let Some(r) = ranges.iter().find(|r| !layout.is_aligned(r.start)) {
        return Err(ConvertError::UnsplittableBlockBoundary {
            name: frame.name.clone(),
            boundary: r.start,
            block: layout.elements,
        });
    }
    let row_bytes = frame.row_bytes(layouts)?;
    let to_bytes = |elements: usize| elements / layout.elements * layout.bytes;

    Ok(ranges
        .par_iter()
        .map(|r| {
            let (lo, hi) = (to_bytes(r.start), to_bytes(r.end));
            let mut data = Vec::with_capacity(rows * (hi - lo));
            for row in raw.chunks_exact(row_bytes) {
                data.extend_from_slice(&row[lo..hi]);
            }
            ShardDescriptor {
                extents: vec![rows, r.len()],
                data,
            }
        })
        .collect())
}

/// Inverse of [`partition`]: rebuild the original data block from its shards.
///
/// For a column split the shards are interleaved row by row; otherwise they are
/// concatenated (an unsplit tensor yields its first copy).
pub fn reassemble(shards: &[ShardDescriptor], axis: SplitAxis) -> Vec<u8> {
    match axis {
        SplitAxis::Unsplit => shards.first().map(|s| s.data.clone()).unwrap_or_default(),
        SplitAxis::Row => shards.iter().flat_map(|s| s.data.iter().copied()).collect(),
        SplitAxis::Column => {
            let rows = shards.first().map(|s| s.extents[0]).unwrap_or(0);
            let total: usize = shards.iter().map(|s| s.data.len()).sum();
            let mut out = Vec::with_capacity(total);
            for row in 0..rows {
                for s in shards {
                    let w = s.data.len() / rows;
                    out.extend_from_slice(&s.data[row * w..(row + 1) * w]);
                }
            }
            out
        }
    }
}

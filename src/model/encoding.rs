//! Numeric encodings of tensor elements and their byte layout.
//!
//! Tags follow the legacy ggml file: 0 = f32, 1 = f16, 2 = q4_0, 3 = q4_1.

use crate::errors::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element encoding of a tensor's raw data.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(non_camel_case_types)]
pub enum Encoding {
    F32 = 0,
    F16 = 1,
    /// 4-bit block quantization with a per-block scale.
    Q4_0 = 2,
    /// 4-bit block quantization with a per-block scale and minimum.
    Q4_1 = 3,
}

impl Encoding {
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Encoding::F32),
            1 => Ok(Encoding::F16),
            2 => Ok(Encoding::Q4_0),
            3 => Ok(Encoding::Q4_1),
            other => Err(ConvertError::UnknownEncoding(other)),
        }
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn is_quantized(self) -> bool {
        matches!(self, Encoding::Q4_0 | Encoding::Q4_1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::F32 => "f32",
            Encoding::F16 => "f16",
            Encoding::Q4_0 => "q4_0",
            Encoding::Q4_1 => "q4_1",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage unit of an encoding: `elements` consecutive values occupy `bytes` bytes.
///
/// Plain float encodings are blocks of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub elements: usize,
    pub bytes: usize,
}

impl BlockLayout {
    pub const fn new(elements: usize, bytes: usize) -> Self {
        Self { elements, bytes }
    }

    /// Whether `n` elements is a whole number of blocks.
    pub fn is_aligned(&self, n: usize) -> bool {
        n % self.elements == 0
    }

    /// Bytes occupied by `n` elements. `None` unless `n` is block aligned.
    pub fn bytes_for(&self, n: usize) -> Option<usize> {
        if self.is_aligned(n) {
            (n / self.elements).checked_mul(self.bytes)
        } else {
            None
        }
    }
}

/// Legacy q4_0 block: f32 scale + 16 bytes of packed nibbles for 32 elements.
pub const Q4_0_BLOCK: BlockLayout = BlockLayout::new(32, 20);
/// Legacy q4_1 block: f32 scale + f32 minimum + 16 bytes of packed nibbles.
pub const Q4_1_BLOCK: BlockLayout = BlockLayout::new(32, 24);

/// Block layouts for the quantized encodings. Configurable because the block geometry
/// belongs to the target runtime's format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockLayouts {
    pub q4_0: BlockLayout,
    pub q4_1: BlockLayout,
}

impl Default for BlockLayouts {
    fn default() -> Self {
        Self {
            q4_0: Q4_0_BLOCK,
            q4_1: Q4_1_BLOCK,
        }
    }
}

impl BlockLayouts {
    pub fn layout(&self, encoding: Encoding) -> BlockLayout {
        match encoding {
            Encoding::F32 => BlockLayout::new(1, 4),
            Encoding::F16 => BlockLayout::new(1, 2),
            Encoding::Q4_0 => self.q4_0,
            Encoding::Q4_1 => self.q4_1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, l) in [("q4_0", self.q4_0), ("q4_1", self.q4_1)] {
            if l.elements == 0 || l.bytes == 0 {
                return Err(ConvertError::InvalidConfig(format!(
                    "{} block layout must be non-empty, got {} elements / {} bytes",
                    name, l.elements, l.bytes
                )));
            }
        }
        Ok(())
    }
}

use thiserror::Error;

use crate::bit_reader::BitReadError;
use crate::format::TextureFormat;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Fatal errors for one texture. Sibling textures are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported texture format {id:#04x}")]
    UnsupportedFormat { id: u32 },

    #[error("{format} is palette indexed but no palette was supplied")]
    MissingPalette { format: TextureFormat },

    #[error("{format}: palette index {index} out of range for {len} entries at block ({block_x}, {block_y})")]
    PaletteIndexOutOfRange {
        format: TextureFormat,
        index: usize,
        len: usize,
        block_x: u32,
        block_y: u32,
    },

    #[error("{format}: truncated input at offset {offset:#x} (block ({block_x}, {block_y})): needed {needed} bytes, buffer holds {available}")]
    TruncatedInput {
        format: TextureFormat,
        offset: usize,
        needed: usize,
        available: usize,
        block_x: u32,
        block_y: u32,
    },

    #[error("swizzle curve left {unassigned} of a {tiles_y}x{tiles_x} tile grid unassigned after {steps} steps")]
    SwizzleCoverage {
        tiles_y: u32,
        tiles_x: u32,
        steps: u64,
        unassigned: usize,
    },

    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Failure inside a single cell, before the assembler attaches its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    #[error(transparent)]
    OutOfData(#[from] BitReadError),

    #[error("palette index {index} out of range for {len} entries")]
    PaletteIndex { index: usize, len: usize },

    #[error("no palette supplied")]
    NoPalette,
}

/// Outcome of decoding one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Decoded,
    /// Reserved encoding; the cell was filled with transparent black.
    Illegal,
}

/// Recoverable conditions reported alongside a successful decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    #[error("{format}: {count} illegal block(s) replaced with transparent black, first at block ({}, {}) offset {first_offset:#x}", .first_block.0, .first_block.1)]
    IllegalBlocks {
        format: TextureFormat,
        count: usize,
        first_block: (u32, u32),
        first_offset: usize,
    },
}

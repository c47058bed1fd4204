use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    I4,
    I8,
    IA4,
    IA8,
    Rgb565,
    Rgb5a3,
    Rgba32,
    C4,
    C8,
    C14x2,
    Cmpr,
    Bc1Unorm,
    Bc3Unorm,
    Bc4Unorm,
    Bc5Unorm,
    Bc7Unorm,
}

impl TextureFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::I4 => "I4",
            Self::I8 => "I8",
            Self::IA4 => "IA4",
            Self::IA8 => "IA8",
            Self::Rgb565 => "RGB565",
            Self::Rgb5a3 => "RGB5A3",
            Self::Rgba32 => "RGBA32",
            Self::C4 => "C4",
            Self::C8 => "C8",
            Self::C14x2 => "C14X2",
            Self::Cmpr => "CMPR",
            Self::Bc1Unorm => "BC1",
            Self::Bc3Unorm => "BC3",
            Self::Bc4Unorm => "BC4",
            Self::Bc5Unorm => "BC5",
            Self::Bc7Unorm => "BC7",
        }
    }

    pub fn uses_palette(self) -> bool {
        matches!(self, Self::C4 | Self::C8 | Self::C14x2)
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// GX tile formats, blocks stored in raster order.
    Legacy,
    /// BCn formats, blocks stored in Z-order swizzled tiles.
    BlockCompressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub id: u32,
    pub format: TextureFormat,
    pub bits_per_texel: u32,
    pub block_width: u32,
    pub block_height: u32,
    pub bytes_per_block: u32,
    pub family: Family,
}

/// Bytes covered by one swizzle unit of the block-compressed layout.
pub const SWIZZLE_UNIT_BYTES: u32 = 16;

const fn legacy(id: u32, format: TextureFormat, bpt: u32, bw: u32, bh: u32) -> FormatDescriptor {
    FormatDescriptor {
        id,
        format,
        bits_per_texel: bpt,
        block_width: bw,
        block_height: bh,
        bytes_per_block: bw * bh * bpt / 8,
        family: Family::Legacy,
    }
}

const fn bcn(id: u32, format: TextureFormat, bpt: u32) -> FormatDescriptor {
    FormatDescriptor {
        id,
        format,
        bits_per_texel: bpt,
        block_width: 4,
        block_height: 4,
        bytes_per_block: 16 * bpt / 8,
        family: Family::BlockCompressed,
    }
}

// GX ids for the legacy family, DXGI ids (UNORM and SRGB) for BCn.
pub static REGISTRY: [FormatDescriptor; 19] = [
    legacy(0x00, TextureFormat::I4, 4, 8, 8),
    legacy(0x01, TextureFormat::I8, 8, 8, 4),
    legacy(0x02, TextureFormat::IA4, 8, 8, 4),
    legacy(0x03, TextureFormat::IA8, 16, 4, 4),
    legacy(0x04, TextureFormat::Rgb565, 16, 4, 4),
    legacy(0x05, TextureFormat::Rgb5a3, 16, 4, 4),
    legacy(0x06, TextureFormat::Rgba32, 32, 4, 4),
    legacy(0x08, TextureFormat::C4, 4, 8, 8),
    legacy(0x09, TextureFormat::C8, 8, 8, 4),
    legacy(0x0A, TextureFormat::C14x2, 16, 4, 4),
    legacy(0x0E, TextureFormat::Cmpr, 4, 8, 8),
    bcn(0x47, TextureFormat::Bc1Unorm, 4),
    bcn(0x48, TextureFormat::Bc1Unorm, 4),
    bcn(0x4D, TextureFormat::Bc3Unorm, 8),
    bcn(0x4E, TextureFormat::Bc3Unorm, 8),
    bcn(0x50, TextureFormat::Bc4Unorm, 4),
    bcn(0x53, TextureFormat::Bc5Unorm, 8),
    bcn(0x62, TextureFormat::Bc7Unorm, 8),
    bcn(0x63, TextureFormat::Bc7Unorm, 8),
];

pub fn lookup(id: u32) -> Option<&'static FormatDescriptor> {
    REGISTRY.iter().find(|d| d.id == id)
}

impl FormatDescriptor {
    /// Block grid covering `width`x`height`, as (blocks_x, blocks_y).
    pub fn block_grid(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.div_ceil(self.block_width),
            height.div_ceil(self.block_height),
        )
    }

    /// Dimensions rounded up to whole blocks, or `None` when they overflow.
    pub fn padded_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (bx, by) = self.block_grid(width, height);
        Some((bx.checked_mul(self.block_width)?, by.checked_mul(self.block_height)?))
    }

    /// Blocks packed side by side in one swizzle unit.
    pub fn tile_width(&self) -> u32 {
        (SWIZZLE_UNIT_BYTES / self.bytes_per_block).clamp(1, 16)
    }

    /// Swizzle tile grid as (tiles_y, tiles_x).
    pub fn tile_grid(&self, width: u32, height: u32) -> (u32, u32) {
        let (bx, by) = self.block_grid(width, height);
        (by, bx.div_ceil(self.tile_width()))
    }

    /// Bytes the decoder reads at least: one cell per block. Exact for the
    /// legacy family. Swizzled payloads may also carry the unused half of a
    /// partial tile.
    pub fn min_payload_size(&self, width: u32, height: u32) -> Option<usize> {
        let (bx, by) = self.block_grid(width, height);
        (bx as usize)
            .checked_mul(by as usize)?
            .checked_mul(self.bytes_per_block as usize)
    }

    /// Full payload size a texture of this format occupies.
    pub fn encoded_size(&self, width: u32, height: u32) -> Option<usize> {
        match self.family {
            Family::Legacy => self.min_payload_size(width, height),
            Family::BlockCompressed => {
                let (ty, tx) = self.tile_grid(width, height);
                let unit = (self.tile_width() * self.bytes_per_block) as usize;
                (ty as usize).checked_mul(tx as usize)?.checked_mul(unit)
            }
        }
    }
}

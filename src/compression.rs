use crate::bitfield::BitField;
use crate::byte_reader::{BytesCursor, OutOfBytes, ReadCellTyped};
use crate::format::FormatDescriptor;
use crate::gx::Palette;
use crate::swizzle::SwizzleMap;
use crate::texerr::{CellError, CellStatus, DecodeError, Result};

pub type Rgba8 = [u8; 4];

pub const TRANSPARENT_BLACK: Rgba8 = [0, 0, 0, 0];

/// Per-texture data a cell decoder may need besides its own bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellContext<'a> {
    pub palette: Option<&'a Palette>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalCell {
    pub block_x: u32,
    pub block_y: u32,
    pub offset: usize,
}

/// Cells that decoded to a substitute instead of failing the texture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellReport {
    pub illegal: Vec<IllegalCell>,
}

fn truncated(desc: &FormatDescriptor, e: OutOfBytes, block_x: u32, block_y: u32) -> DecodeError {
    DecodeError::TruncatedInput {
        format: desc.format,
        offset: e.offset,
        needed: e.needed,
        available: e.available,
        block_x,
        block_y,
    }
}

fn locate(desc: &FormatDescriptor, err: CellError, offset: usize, available: usize, block_x: u32, block_y: u32) -> DecodeError {
    match err {
        CellError::OutOfData(e) => DecodeError::TruncatedInput {
            format: desc.format,
            offset: offset + e.position / 8,
            needed: (e.requested as usize).div_ceil(8),
            available,
            block_x,
            block_y,
        },
        CellError::PaletteIndex { index, len } => DecodeError::PaletteIndexOutOfRange {
            format: desc.format,
            index,
            len,
            block_x,
            block_y,
        },
        CellError::NoPalette => DecodeError::MissingPalette { format: desc.format },
    }
}

fn uncovered(map: &SwizzleMap) -> DecodeError {
    let (tiles_y, tiles_x) = map.shape();
    DecodeError::SwizzleCoverage {
        tiles_y,
        tiles_x,
        steps: map.steps(),
        unassigned: map.unassigned(),
    }
}

/// Finds the first cell `decode_image_swizzled` would read past the end of a
/// `data_len`-byte payload, visiting cells in the same order.
pub fn check_swizzled_len(
    data_len: usize,
    desc: &FormatDescriptor,
    width: u32,
    height: u32,
    map: &SwizzleMap,
) -> Result<()> {
    let (x_cells, _) = desc.block_grid(width, height);
    let (tiles_y, tiles_x) = map.shape();
    let tile_width = desc.tile_width();
    let cell_len = desc.bytes_per_block as usize;

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let src = map.source_tile(ty, tx).ok_or_else(|| uncovered(map))?;
            let base = src as usize * tile_width as usize * cell_len;
            for k in 0..tile_width {
                let x_cell = tx * tile_width + k;
                let offset = base + k as usize * cell_len;
                if x_cell < x_cells && offset + cell_len > data_len {
                    return Err(DecodeError::TruncatedInput {
                        format: desc.format,
                        offset,
                        needed: cell_len,
                        available: data_len,
                        block_x: x_cell,
                        block_y: ty,
                    });
                }
            }
        }
    }
    Ok(())
}

pub trait TexCodec<const CELL_LEN: usize> {
    const CELL_WIDTH: usize;
    const CELL_HEIGHT: usize;

    /// Decodes one cell, reporting texels in cell-local raster coordinates.
    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; CELL_LEN],
        ctx: &CellContext<'_>,
        writer: F,
    ) -> std::result::Result<CellStatus, CellError>;

    /// Walks cells stored in raster order.
    fn decode_image_linear<F: FnMut(usize, usize, Rgba8)>(
        data: &[u8],
        desc: &FormatDescriptor,
        width: u32,
        height: u32,
        ctx: &CellContext<'_>,
        mut writer: F,
    ) -> Result<CellReport> {
        debug_assert_eq!(desc.bytes_per_block as usize, CELL_LEN);
        let (x_cells, y_cells) = desc.block_grid(width, height);
        let mut cursor = BytesCursor::new(data);
        let mut report = CellReport::default();

        for y_cell in 0..y_cells {
            for x_cell in 0..x_cells {
                let offset = cursor.index;
                let cell = cursor
                    .read_cell::<CELL_LEN>()
                    .map_err(|e| truncated(desc, e, x_cell, y_cell))?;
                let status = Self::decode(cell, ctx, |x, y, v| {
                    writer(
                        x + x_cell as usize * Self::CELL_WIDTH,
                        y + y_cell as usize * Self::CELL_HEIGHT,
                        v,
                    )
                })
                .map_err(|e| locate(desc, e, offset, data.len(), x_cell, y_cell))?;
                if status == CellStatus::Illegal {
                    report.illegal.push(IllegalCell { block_x: x_cell, block_y: y_cell, offset });
                }
            }
        }
        Ok(report)
    }

    /// Walks 16-byte tiles through a swizzle map. Each tile holds
    /// `desc.tile_width()` cells side by side.
    fn decode_image_swizzled<F: FnMut(usize, usize, Rgba8)>(
        data: &[u8],
        desc: &FormatDescriptor,
        width: u32,
        height: u32,
        map: &SwizzleMap,
        ctx: &CellContext<'_>,
        mut writer: F,
    ) -> Result<CellReport> {
        debug_assert_eq!(desc.bytes_per_block as usize, CELL_LEN);
        let (x_cells, _) = desc.block_grid(width, height);
        let (tiles_y, tiles_x) = map.shape();
        let tile_width = desc.tile_width();
        let tile_len = tile_width as usize * CELL_LEN;
        let cursor = BytesCursor::new(data);
        let mut report = CellReport::default();

        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let src = map.source_tile(ty, tx).ok_or_else(|| uncovered(map))?;
                let base = src as usize * tile_len;
                for k in 0..tile_width {
                    let x_cell = tx * tile_width + k;
                    if x_cell >= x_cells {
                        continue;
                    }
                    let y_cell = ty;
                    let offset = base + k as usize * CELL_LEN;
                    let cell = cursor
                        .peek_cell::<CELL_LEN>(offset)
                        .map_err(|e| truncated(desc, e, x_cell, y_cell))?;
                    let status = Self::decode(cell, ctx, |x, y, v| {
                        writer(
                            x + x_cell as usize * Self::CELL_WIDTH,
                            y + y_cell as usize * Self::CELL_HEIGHT,
                            v,
                        )
                    })
                    .map_err(|e| locate(desc, e, offset, data.len(), x_cell, y_cell))?;
                    if status == CellStatus::Illegal {
                        report.illegal.push(IllegalCell { block_x: x_cell, block_y: y_cell, offset });
                    }
                }
            }
        }
        Ok(report)
    }
}

pub(crate) fn color5to8(value: u8) -> u8 {
    (value << 3) | (value >> 2)
}

pub(crate) fn color6to8(value: u8) -> u8 {
    (value << 2) | (value >> 4)
}

pub(crate) fn decode_rgb565(c: u16) -> Rgba8 {
    let (b, g, r) = c.bit_split((5, 6, 5));
    [color5to8(r as u8), color6to8(g as u8), color5to8(b as u8), 0xFF]
}

/// Four-entry BC1 palette. With `punch_through` and `c0 <= c1`, entry 2 is the
/// midpoint and entry 3 is transparent black.
pub(crate) fn bc1_palette(c0: u16, c1: u16, punch_through: bool) -> [Rgba8; 4] {
    let mut colors = [[0; 4]; 4];
    colors[0] = decode_rgb565(c0);
    colors[1] = decode_rgb565(c1);
    let (e0, e1) = (colors[0], colors[1]);
    let blend = |a: u8, b: u8, wa: u32, wb: u32, d: u32| ((wa * a as u32 + wb * b as u32) / d) as u8;
    if c0 > c1 || !punch_through {
        colors[2] = [
            blend(e0[0], e1[0], 2, 1, 3),
            blend(e0[1], e1[1], 2, 1, 3),
            blend(e0[2], e1[2], 2, 1, 3),
            0xFF,
        ];
        colors[3] = [
            blend(e0[0], e1[0], 1, 2, 3),
            blend(e0[1], e1[1], 1, 2, 3),
            blend(e0[2], e1[2], 1, 2, 3),
            0xFF,
        ];
    } else {
        colors[2] = [
            blend(e0[0], e1[0], 1, 1, 2),
            blend(e0[1], e1[1], 1, 1, 2),
            blend(e0[2], e1[2], 1, 1, 2),
            0xFF,
        ];
        colors[3] = TRANSPARENT_BLACK;
    }
    colors
}

pub struct Bc1Unorm;

impl Bc1Unorm {
    fn decode_half<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 8], punch_through: bool, mut writer: F) {
        let c0 = cell.u16_le(0);
        let c1 = cell.u16_le(2);
        let colors = bc1_palette(c0, c1, punch_through);
        for (y, &b) in cell[4..8].iter().enumerate() {
            let (b0, b1, b2, b3) = b.bit_split((2, 2, 2, 2));
            writer(0, y, colors[b0 as usize]);
            writer(1, y, colors[b1 as usize]);
            writer(2, y, colors[b2 as usize]);
            writer(3, y, colors[b3 as usize]);
        }
    }
}

impl TexCodec<8> for Bc1Unorm {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 8],
        _ctx: &CellContext<'_>,
        writer: F,
    ) -> std::result::Result<CellStatus, CellError> {
        Self::decode_half(cell, true, writer);
        Ok(CellStatus::Decoded)
    }
}

pub struct Bc3Unorm;

impl TexCodec<16> for Bc3Unorm {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 16],
        _ctx: &CellContext<'_>,
        mut writer: F,
    ) -> std::result::Result<CellStatus, CellError> {
        let (alpha_half, color_half) = split_halves(cell);
        let mut color_buf = [[[0; 3]; 4]; 4];
        let mut alpha_buf = [[0; 4]; 4];
        Bc4Unorm::decode_half(&alpha_half, |x, y, v| alpha_buf[x][y] = v[0]);
        Bc1Unorm::decode_half(&color_half, false, |x, y, v| {
            color_buf[x][y] = [v[0], v[1], v[2]]
        });
        for y in 0..4 {
            for x in 0..4 {
                let color = color_buf[x][y];
                writer(x, y, [color[0], color[1], color[2], alpha_buf[x][y]])
            }
        }
        Ok(CellStatus::Decoded)
    }
}

fn split_halves(cell: &[u8; 16]) -> ([u8; 8], [u8; 8]) {
    let mut lo = [0; 8];
    let mut hi = [0; 8];
    lo.copy_from_slice(&cell[..8]);
    hi.copy_from_slice(&cell[8..]);
    (lo, hi)
}

/// Eight-entry ramp shared by BC4 and the BC3 alpha block.
pub(crate) fn bc4_ramp(c0: u8, c1: u8) -> [u8; 8] {
    let mut c = [0; 8];
    c[0] = c0;
    c[1] = c1;
    if c0 > c1 {
        for (i, cc) in c[2..8].iter_mut().enumerate() {
            let f0 = 6 - i as u32;
            let f1 = i as u32 + 1;
            *cc = ((f0 * c0 as u32 + f1 * c1 as u32) / 7) as u8;
        }
    } else {
        for (i, cc) in c[2..6].iter_mut().enumerate() {
            let f0 = 4 - i as u32;
            let f1 = i as u32 + 1;
            *cc = ((f0 * c0 as u32 + f1 * c1 as u32) / 5) as u8;
        }
        c[6] = 0;
        c[7] = 255;
    }
    c
}

pub struct Bc4Unorm;

impl Bc4Unorm {
    fn decode_half<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 8], mut writer: F) {
        let c = bc4_ramp(cell[0], cell[1]);
        let mut buf = [0; 4];
        for super_y in 0..2 {
            buf[0..3].copy_from_slice(&cell[2 + super_y * 3..][..3]);
            let mut a = u32::from_le_bytes(buf);
            for y in 0..2 {
                for x in 0..4 {
                    let color = c[(a & 7) as usize];
                    writer(x, y + super_y * 2, [color, color, color, 255]);
                    a >>= 3;
                }
            }
        }
    }
}

impl TexCodec<8> for Bc4Unorm {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 8],
        _ctx: &CellContext<'_>,
        writer: F,
    ) -> std::result::Result<CellStatus, CellError> {
        Self::decode_half(cell, writer);
        Ok(CellStatus::Decoded)
    }
}

pub struct Bc5Unorm;

impl TexCodec<16> for Bc5Unorm {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 16],
        _ctx: &CellContext<'_>,
        mut writer: F,
    ) -> std::result::Result<CellStatus, CellError> {
        let (red_half, green_half) = split_halves(cell);
        let mut red_buf = [[0; 4]; 4];
        let mut green_buf = [[0; 4]; 4];
        Bc4Unorm::decode_half(&red_half, |x, y, v| red_buf[x][y] = v[0]);
        Bc4Unorm::decode_half(&green_half, |x, y, v| green_buf[x][y] = v[0]);
        for y in 0..4 {
            for x in 0..4 {
                writer(x, y, [red_buf[x][y], green_buf[x][y], 0, 255])
            }
        }
        Ok(CellStatus::Decoded)
    }
}

//! Legacy GX tile formats. Cells are stored in raster order and every
//! multi-bit field is big-endian, so cells are read MSB-first.

use crate::bit_reader::BitReader;
use crate::byte_reader::ReadCellTyped;
use crate::compression::{bc1_palette, CellContext, Rgba8, TexCodec};
use crate::texerr::{CellError, CellStatus};

type CellResult = std::result::Result<CellStatus, CellError>;

/// Externally supplied color table for C4/C8/C14X2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgba8>,
}

impl Palette {
    pub fn new(entries: Vec<Rgba8>) -> Palette {
        Palette { entries }
    }

    /// Reads packed RGBA8 entries; a trailing partial entry is ignored.
    pub fn from_rgba8_bytes(bytes: &[u8]) -> Palette {
        let entries = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Palette { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rgba8> {
        self.entries.get(index).copied()
    }

    fn lookup(&self, index: usize) -> Result<Rgba8, CellError> {
        self.get(index).ok_or(CellError::PaletteIndex { index, len: self.len() })
    }
}

/// Linear rescale of an `bits`-wide field to 0-255.
fn rescale(v: u32, bits: u32) -> u8 {
    let max = (1u32 << bits) - 1;
    ((v * 255 + max / 2) / max) as u8
}

fn gray(l: u8, a: u8) -> Rgba8 {
    [l, l, l, a]
}

/// Emits `w * h` texels in raster order from a per-texel reader.
fn each_texel<F, R>(w: usize, h: usize, mut read: R, mut writer: F) -> Result<(), CellError>
where
    F: FnMut(usize, usize, Rgba8),
    R: FnMut() -> Result<Rgba8, CellError>,
{
    for y in 0..h {
        for x in 0..w {
            writer(x, y, read()?);
        }
    }
    Ok(())
}

fn palette<'a>(ctx: &CellContext<'a>) -> Result<&'a Palette, CellError> {
    ctx.palette.ok_or(CellError::NoPalette)
}

pub struct I4;

impl TexCodec<32> for I4 {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 8;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(8, 8, || Ok(gray(rescale(r.read_bits(4)?, 4), 0xFF)), writer)?;
        Ok(CellStatus::Decoded)
    }
}

pub struct I8;

impl TexCodec<32> for I8 {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(8, 4, || Ok(gray(r.read_bits(8)? as u8, 0xFF)), writer)?;
        Ok(CellStatus::Decoded)
    }
}

pub struct IA4;

impl TexCodec<32> for IA4 {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(
            8,
            4,
            || {
                let a = rescale(r.read_bits(4)?, 4);
                let l = rescale(r.read_bits(4)?, 4);
                Ok(gray(l, a))
            },
            writer,
        )?;
        Ok(CellStatus::Decoded)
    }
}

pub struct IA8;

impl TexCodec<32> for IA8 {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(
            4,
            4,
            || {
                let a = r.read_bits(8)? as u8;
                let l = r.read_bits(8)? as u8;
                Ok(gray(l, a))
            },
            writer,
        )?;
        Ok(CellStatus::Decoded)
    }
}

fn read_rgb565(r: &mut BitReader<'_>) -> Result<Rgba8, CellError> {
    let red = rescale(r.read_bits(5)?, 5);
    let green = rescale(r.read_bits(6)?, 6);
    let blue = rescale(r.read_bits(5)?, 5);
    Ok([red, green, blue, 0xFF])
}

fn read_rgb5a3(r: &mut BitReader<'_>) -> Result<Rgba8, CellError> {
    if r.read_bit()? == 1 {
        let red = rescale(r.read_bits(5)?, 5);
        let green = rescale(r.read_bits(5)?, 5);
        let blue = rescale(r.read_bits(5)?, 5);
        Ok([red, green, blue, 0xFF])
    } else {
        let a = rescale(r.read_bits(3)?, 3);
        let red = rescale(r.read_bits(4)?, 4);
        let green = rescale(r.read_bits(4)?, 4);
        let blue = rescale(r.read_bits(4)?, 4);
        Ok([red, green, blue, a])
    }
}

pub struct Rgb565;

impl TexCodec<32> for Rgb565 {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(4, 4, || read_rgb565(&mut r), writer)?;
        Ok(CellStatus::Decoded)
    }
}

pub struct Rgb5a3;

impl TexCodec<32> for Rgb5a3 {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, writer: F) -> CellResult {
        let mut r = BitReader::msb_first(cell);
        each_texel(4, 4, || read_rgb5a3(&mut r), writer)?;
        Ok(CellStatus::Decoded)
    }
}

/// 64-byte cell: sixteen (A, R) pairs followed by sixteen (G, B) pairs.
pub struct Rgba32;

impl TexCodec<64> for Rgba32 {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 64], _ctx: &CellContext<'_>, mut writer: F) -> CellResult {
        let (ar, gb) = cell.split_at(32);
        for i in 0..16 {
            let texel = [ar[2 * i + 1], gb[2 * i], gb[2 * i + 1], ar[2 * i]];
            writer(i % 4, i / 4, texel);
        }
        Ok(CellStatus::Decoded)
    }
}

pub struct C4;

impl TexCodec<32> for C4 {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 8;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], ctx: &CellContext<'_>, writer: F) -> CellResult {
        let pal = palette(ctx)?;
        let mut r = BitReader::msb_first(cell);
        each_texel(8, 8, || pal.lookup(r.read_bits(4)? as usize), writer)?;
        Ok(CellStatus::Decoded)
    }
}

pub struct C8;

impl TexCodec<32> for C8 {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], ctx: &CellContext<'_>, writer: F) -> CellResult {
        let pal = palette(ctx)?;
        let mut r = BitReader::msb_first(cell);
        each_texel(8, 4, || pal.lookup(r.read_bits(8)? as usize), writer)?;
        Ok(CellStatus::Decoded)
    }
}

pub struct C14x2;

impl TexCodec<32> for C14x2 {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], ctx: &CellContext<'_>, writer: F) -> CellResult {
        let pal = palette(ctx)?;
        let mut r = BitReader::msb_first(cell);
        each_texel(
            4,
            4,
            || {
                r.read_bits(2)?;
                pal.lookup(r.read_bits(14)? as usize)
            },
            writer,
        )?;
        Ok(CellStatus::Decoded)
    }
}

/// Four big-endian BC1-style sub-blocks covering an 8x8 cell.
pub struct Cmpr;

const CMPR_SUB_BLOCKS: [(usize, usize); 4] = [(0, 0), (4, 0), (0, 4), (4, 4)];

impl TexCodec<32> for Cmpr {
    const CELL_WIDTH: usize = 8;
    const CELL_HEIGHT: usize = 8;

    fn decode<F: FnMut(usize, usize, Rgba8)>(cell: &[u8; 32], _ctx: &CellContext<'_>, mut writer: F) -> CellResult {
        for (i, &(sx, sy)) in CMPR_SUB_BLOCKS.iter().enumerate() {
            let base = i * 8;
            let colors = bc1_palette(cell.u16_be(base), cell.u16_be(base + 2), true);
            let mut r = BitReader::msb_first(&cell[base + 4..base + 8]);
            each_texel(4, 4, || Ok(colors[r.read_bits(2)? as usize]), |x, y, v| writer(sx + x, sy + y, v))?;
        }
        Ok(CellStatus::Decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<C: TexCodec<N>, const N: usize>(cell: &[u8; N], palette: Option<&Palette>) -> Vec<Vec<Rgba8>> {
        let mut out = vec![vec![[0xAA; 4]; C::CELL_WIDTH]; C::CELL_HEIGHT];
        let ctx = CellContext { palette };
        C::decode(cell, &ctx, |x, y, v| out[y][x] = v).unwrap();
        out
    }

    #[test]
    fn rescale_hits_both_ends() {
        for bits in [3, 4, 5, 6] {
            assert_eq!(rescale(0, bits), 0);
            assert_eq!(rescale((1 << bits) - 1, bits), 255);
        }
        assert_eq!(rescale(1, 4), 17);
        assert_eq!(rescale(1, 3), 36);
        assert_eq!(rescale(16, 5), 132);
    }

    #[test]
    fn i4_high_nibble_is_left_texel() {
        let mut cell = [0u8; 32];
        cell[0] = 0xF1;
        cell[31] = 0x0A;
        let out = decode::<I4, 32>(&cell, None);
        assert_eq!(out[0][0], [255, 255, 255, 255]);
        assert_eq!(out[0][1], [17, 17, 17, 255]);
        assert_eq!(out[7][6], [0, 0, 0, 255]);
        assert_eq!(out[7][7], [170, 170, 170, 255]);
    }

    #[test]
    fn i8_rows_of_eight() {
        let cell: [u8; 32] = std::array::from_fn(|i| i as u8 * 8);
        let out = decode::<I8, 32>(&cell, None);
        assert_eq!(out[1][0], [64, 64, 64, 255]);
        assert_eq!(out[3][7], [248, 248, 248, 255]);
    }

    #[test]
    fn ia4_alpha_in_high_nibble() {
        let mut cell = [0u8; 32];
        cell[0] = 0x3C;
        let out = decode::<IA4, 32>(&cell, None);
        assert_eq!(out[0][0], [204, 204, 204, 51]);
        assert_eq!(out[0][1], [0, 0, 0, 0]);
    }

    #[test]
    fn ia8_alpha_byte_first() {
        let mut cell = [0u8; 32];
        cell[0] = 0x80;
        cell[1] = 0x40;
        let out = decode::<IA8, 32>(&cell, None);
        assert_eq!(out[0][0], [0x40, 0x40, 0x40, 0x80]);
    }

    #[test]
    fn rgb565_primaries() {
        let mut cell = [0u8; 32];
        cell[0..2].copy_from_slice(&0xF800u16.to_be_bytes());
        cell[2..4].copy_from_slice(&0x07E0u16.to_be_bytes());
        cell[4..6].copy_from_slice(&0x001Fu16.to_be_bytes());
        let out = decode::<Rgb565, 32>(&cell, None);
        assert_eq!(out[0][0], [255, 0, 0, 255]);
        assert_eq!(out[0][1], [0, 255, 0, 255]);
        assert_eq!(out[0][2], [0, 0, 255, 255]);
        assert_eq!(out[0][3], [0, 0, 0, 255]);
    }

    #[test]
    fn rgb5a3_both_modes() {
        let mut cell = [0u8; 32];
        // opaque 555: r=31 g=0 b=16
        cell[0..2].copy_from_slice(&(0x8000u16 | (31 << 10) | 16).to_be_bytes());
        // 3/4/4/4: a=1 r=15 g=0 b=8
        cell[2..4].copy_from_slice(&((1u16 << 12) | (15 << 8) | 8).to_be_bytes());
        let out = decode::<Rgb5a3, 32>(&cell, None);
        assert_eq!(out[0][0], [255, 0, 132, 255]);
        assert_eq!(out[0][1], [255, 0, 136, 36]);
        // all-zero word: fully transparent black
        assert_eq!(out[3][3], [0, 0, 0, 0]);
    }

    #[test]
    fn rgba32_deinterleaves_ar_and_gb() {
        let mut cell = [0u8; 64];
        for i in 0..16u8 {
            let i_us = i as usize;
            cell[2 * i_us] = 0xA0 | i;
            cell[2 * i_us + 1] = 0x10 | i;
            cell[32 + 2 * i_us] = 0x20 | i;
            cell[32 + 2 * i_us + 1] = 0x30 | i;
        }
        let out = decode::<Rgba32, 64>(&cell, None);
        assert_eq!(out[0][0], [0x10, 0x20, 0x30, 0xA0]);
        assert_eq!(out[1][2], [0x16, 0x26, 0x36, 0xA6]);
        assert_eq!(out[3][3], [0x1F, 0x2F, 0x3F, 0xAF]);
    }

    #[test]
    fn c4_looks_up_palette() {
        let pal = Palette::new((0..16).map(|i| [i * 16, 0, 0, 255]).collect());
        let mut cell = [0u8; 32];
        cell[0] = 0x2F;
        let out = decode::<C4, 32>(&cell, Some(&pal));
        assert_eq!(out[0][0], [32, 0, 0, 255]);
        assert_eq!(out[0][1], [240, 0, 0, 255]);
        assert_eq!(out[0][2], [0, 0, 0, 255]);
    }

    #[test]
    fn c8_index_past_palette_fails() {
        let pal = Palette::new(vec![[1, 2, 3, 4]; 4]);
        let mut cell = [0u8; 32];
        cell[5] = 9;
        let err = C8::decode(&cell, &CellContext { palette: Some(&pal) }, |_, _, _| {}).unwrap_err();
        assert_eq!(err, CellError::PaletteIndex { index: 9, len: 4 });
    }

    #[test]
    fn c14x2_masks_top_bits() {
        let mut entries = vec![[0, 0, 0, 0]; 0x3001];
        entries[0x3000] = [9, 8, 7, 6];
        let pal = Palette::new(entries);
        let mut cell = [0u8; 32];
        cell[0..2].copy_from_slice(&0xF000u16.to_be_bytes());
        let out = decode::<C14x2, 32>(&cell, Some(&pal));
        assert_eq!(out[0][0], [9, 8, 7, 6]);
    }

    #[test]
    fn palette_formats_need_a_palette() {
        let cell = [0u8; 32];
        let err = C4::decode(&cell, &CellContext::default(), |_, _, _| {}).unwrap_err();
        assert_eq!(err, CellError::NoPalette);
    }

    #[test]
    fn cmpr_sub_blocks_are_placed_in_quadrants() {
        let mut cell = [0u8; 32];
        let endpoints = [0xF800u16, 0x07E0, 0x001F, 0xFFFF];
        for (i, c) in endpoints.iter().enumerate() {
            cell[i * 8..i * 8 + 2].copy_from_slice(&c.to_be_bytes());
            cell[i * 8 + 2..i * 8 + 4].copy_from_slice(&0u16.to_be_bytes());
        }
        let out = decode::<Cmpr, 32>(&cell, None);
        assert_eq!(out[0][0], [255, 0, 0, 255]);
        assert_eq!(out[3][7], [0, 255, 0, 255]);
        assert_eq!(out[4][0], [0, 0, 255, 255]);
        assert_eq!(out[7][7], [255, 255, 255, 255]);
    }

    #[test]
    fn cmpr_indices_are_msb_first() {
        let mut cell = [0u8; 32];
        cell[0..2].copy_from_slice(&0xF800u16.to_be_bytes());
        cell[2..4].copy_from_slice(&0x001Fu16.to_be_bytes());
        cell[4] = 0b01_00_00_11;
        let out = decode::<Cmpr, 32>(&cell, None);
        assert_eq!(out[0][0], [0, 0, 255, 255]);
        assert_eq!(out[0][3], [85, 0, 170, 255]);
    }

    #[test]
    fn palette_from_bytes() {
        let pal = Palette::from_rgba8_bytes(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(pal.len(), 2);
        assert_eq!(pal.get(1), Some([5, 6, 7, 8]));
        assert_eq!(pal.get(2), None);
    }
}

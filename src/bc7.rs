//! BC7: eight modes sharing one bit-stream layout, described by `MODES`.

use crate::bit_reader::BitReader;
use crate::compression::{CellContext, Rgba8, TexCodec, TRANSPARENT_BLACK};
use crate::texerr::{CellError, CellStatus};

const WEIGHTS2: [u32; 4] = [0, 21, 43, 64];
const WEIGHTS3: [u32; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHTS4: [u32; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

#[rustfmt::skip]
const PARTITION2: [usize; 64 * 16] = [
    0,0,1,1,0,0,1,1,0,0,1,1,0,0,1,1,        0,0,0,1,0,0,0,1,0,0,0,1,0,0,0,1,        0,1,1,1,0,1,1,1,0,1,1,1,0,1,1,1,        0,0,0,1,0,0,1,1,0,0,1,1,0,1,1,1,        0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,1,        0,0,1,1,0,1,1,1,0,1,1,1,1,1,1,1,        0,0,0,1,0,0,1,1,0,1,1,1,1,1,1,1,        0,0,0,0,0,0,0,1,0,0,1,1,0,1,1,1,
    0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,1,        0,0,1,1,0,1,1,1,1,1,1,1,1,1,1,1,        0,0,0,0,0,0,0,1,0,1,1,1,1,1,1,1,        0,0,0,0,0,0,0,0,0,0,0,1,0,1,1,1,        0,0,0,1,0,1,1,1,1,1,1,1,1,1,1,1,        0,0,0,0,0,0,0,0,1,1,1,1,1,1,1,1,        0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,        0,0,0,0,0,0,0,0,0,0,0,0,1,1,1,1,
    0,0,0,0,1,0,0,0,1,1,1,0,1,1,1,1,        0,1,1,1,0,0,0,1,0,0,0,0,0,0,0,0,        0,0,0,0,0,0,0,0,1,0,0,0,1,1,1,0,        0,1,1,1,0,0,1,1,0,0,0,1,0,0,0,0,        0,0,1,1,0,0,0,1,0,0,0,0,0,0,0,0,        0,0,0,0,1,0,0,0,1,1,0,0,1,1,1,0,        0,0,0,0,0,0,0,0,1,0,0,0,1,1,0,0,        0,1,1,1,0,0,1,1,0,0,1,1,0,0,0,1,
    0,0,1,1,0,0,0,1,0,0,0,1,0,0,0,0,        0,0,0,0,1,0,0,0,1,0,0,0,1,1,0,0,        0,1,1,0,0,1,1,0,0,1,1,0,0,1,1,0,        0,0,1,1,0,1,1,0,0,1,1,0,1,1,0,0,        0,0,0,1,0,1,1,1,1,1,1,0,1,0,0,0,        0,0,0,0,1,1,1,1,1,1,1,1,0,0,0,0,        0,1,1,1,0,0,0,1,1,0,0,0,1,1,1,0,        0,0,1,1,1,0,0,1,1,0,0,1,1,1,0,0,
    0,1,0,1,0,1,0,1,0,1,0,1,0,1,0,1,        0,0,0,0,1,1,1,1,0,0,0,0,1,1,1,1,        0,1,0,1,1,0,1,0,0,1,0,1,1,0,1,0,        0,0,1,1,0,0,1,1,1,1,0,0,1,1,0,0,        0,0,1,1,1,1,0,0,0,0,1,1,1,1,0,0,        0,1,0,1,0,1,0,1,1,0,1,0,1,0,1,0,        0,1,1,0,1,0,0,1,0,1,1,0,1,0,0,1,        0,1,0,1,1,0,1,0,1,0,1,0,0,1,0,1,
    0,1,1,1,0,0,1,1,1,1,0,0,1,1,1,0,        0,0,0,1,0,0,1,1,1,1,0,0,1,0,0,0,        0,0,1,1,0,0,1,0,0,1,0,0,1,1,0,0,        0,0,1,1,1,0,1,1,1,1,0,1,1,1,0,0,        0,1,1,0,1,0,0,1,1,0,0,1,0,1,1,0,        0,0,1,1,1,1,0,0,1,1,0,0,0,0,1,1,        0,1,1,0,0,1,1,0,1,0,0,1,1,0,0,1,        0,0,0,0,0,1,1,0,0,1,1,0,0,0,0,0,
    0,1,0,0,1,1,1,0,0,1,0,0,0,0,0,0,        0,0,1,0,0,1,1,1,0,0,1,0,0,0,0,0,        0,0,0,0,0,0,1,0,0,1,1,1,0,0,1,0,        0,0,0,0,0,1,0,0,1,1,1,0,0,1,0,0,        0,1,1,0,1,1,0,0,1,0,0,1,0,0,1,1,        0,0,1,1,0,1,1,0,1,1,0,0,1,0,0,1,        0,1,1,0,0,0,1,1,1,0,0,1,1,1,0,0,        0,0,1,1,1,0,0,1,1,1,0,0,0,1,1,0,
    0,1,1,0,1,1,0,0,1,1,0,0,1,0,0,1,        0,1,1,0,0,0,1,1,0,0,1,1,1,0,0,1,        0,1,1,1,1,1,1,0,1,0,0,0,0,0,0,1,        0,0,0,1,1,0,0,0,1,1,1,0,0,1,1,1,        0,0,0,0,1,1,1,1,0,0,1,1,0,0,1,1,        0,0,1,1,0,0,1,1,1,1,1,1,0,0,0,0,        0,0,1,0,0,0,1,0,1,1,1,0,1,1,1,0,        0,1,0,0,0,1,0,0,0,1,1,1,0,1,1,1
];

#[rustfmt::skip]
const PARTITION3: [usize; 64 * 16] = [
    0,0,1,1,0,0,1,1,0,2,2,1,2,2,2,2,        0,0,0,1,0,0,1,1,2,2,1,1,2,2,2,1,        0,0,0,0,2,0,0,1,2,2,1,1,2,2,1,1,        0,2,2,2,0,0,2,2,0,0,1,1,0,1,1,1,        0,0,0,0,0,0,0,0,1,1,2,2,1,1,2,2,        0,0,1,1,0,0,1,1,0,0,2,2,0,0,2,2,        0,0,2,2,0,0,2,2,1,1,1,1,1,1,1,1,        0,0,1,1,0,0,1,1,2,2,1,1,2,2,1,1,
    0,0,0,0,0,0,0,0,1,1,1,1,2,2,2,2,        0,0,0,0,1,1,1,1,1,1,1,1,2,2,2,2,        0,0,0,0,1,1,1,1,2,2,2,2,2,2,2,2,        0,0,1,2,0,0,1,2,0,0,1,2,0,0,1,2,        0,1,1,2,0,1,1,2,0,1,1,2,0,1,1,2,        0,1,2,2,0,1,2,2,0,1,2,2,0,1,2,2,        0,0,1,1,0,1,1,2,1,1,2,2,1,2,2,2,        0,0,1,1,2,0,0,1,2,2,0,0,2,2,2,0,
    0,0,0,1,0,0,1,1,0,1,1,2,1,1,2,2,        0,1,1,1,0,0,1,1,2,0,0,1,2,2,0,0,        0,0,0,0,1,1,2,2,1,1,2,2,1,1,2,2,        0,0,2,2,0,0,2,2,0,0,2,2,1,1,1,1,        0,1,1,1,0,1,1,1,0,2,2,2,0,2,2,2,        0,0,0,1,0,0,0,1,2,2,2,1,2,2,2,1,        0,0,0,0,0,0,1,1,0,1,2,2,0,1,2,2,        0,0,0,0,1,1,0,0,2,2,1,0,2,2,1,0,
    0,1,2,2,0,1,2,2,0,0,1,1,0,0,0,0,        0,0,1,2,0,0,1,2,1,1,2,2,2,2,2,2,        0,1,1,0,1,2,2,1,1,2,2,1,0,1,1,0,        0,0,0,0,0,1,1,0,1,2,2,1,1,2,2,1,        0,0,2,2,1,1,0,2,1,1,0,2,0,0,2,2,        0,1,1,0,0,1,1,0,2,0,0,2,2,2,2,2,        0,0,1,1,0,1,2,2,0,1,2,2,0,0,1,1,        0,0,0,0,2,0,0,0,2,2,1,1,2,2,2,1,
    0,0,0,0,0,0,0,2,1,1,2,2,1,2,2,2,        0,2,2,2,0,0,2,2,0,0,1,2,0,0,1,1,        0,0,1,1,0,0,1,2,0,0,2,2,0,2,2,2,        0,1,2,0,0,1,2,0,0,1,2,0,0,1,2,0,        0,0,0,0,1,1,1,1,2,2,2,2,0,0,0,0,        0,1,2,0,1,2,0,1,2,0,1,2,0,1,2,0,        0,1,2,0,2,0,1,2,1,2,0,1,0,1,2,0,        0,0,1,1,2,2,0,0,1,1,2,2,0,0,1,1,
    0,0,1,1,1,1,2,2,2,2,0,0,0,0,1,1,        0,1,0,1,0,1,0,1,2,2,2,2,2,2,2,2,        0,0,0,0,0,0,0,0,2,1,2,1,2,1,2,1,        0,0,2,2,1,1,2,2,0,0,2,2,1,1,2,2,        0,0,2,2,0,0,1,1,0,0,2,2,0,0,1,1,        0,2,2,0,1,2,2,1,0,2,2,0,1,2,2,1,        0,1,0,1,2,2,2,2,2,2,2,2,0,1,0,1,        0,0,0,0,2,1,2,1,2,1,2,1,2,1,2,1,
    0,1,0,1,0,1,0,1,0,1,0,1,2,2,2,2,        0,2,2,2,0,1,1,1,0,2,2,2,0,1,1,1,        0,0,0,2,1,1,1,2,0,0,0,2,1,1,1,2,        0,0,0,0,2,1,1,2,2,1,1,2,2,1,1,2,        0,2,2,2,0,1,1,1,0,1,1,1,0,2,2,2,        0,0,0,2,1,1,1,2,1,1,1,2,0,0,0,2,        0,1,1,0,0,1,1,0,0,1,1,0,2,2,2,2,        0,0,0,0,0,0,0,0,2,1,1,2,2,1,1,2,
    0,1,1,0,0,1,1,0,2,2,2,2,2,2,2,2,        0,0,2,2,0,0,1,1,0,0,1,1,0,0,2,2,        0,0,2,2,1,1,2,2,1,1,2,2,0,0,2,2,        0,0,0,0,0,0,0,0,0,0,0,0,2,1,1,2,        0,0,0,2,0,0,0,1,0,0,0,2,0,0,0,1,        0,2,2,2,1,2,2,2,0,2,2,2,1,2,2,2,        0,1,0,1,2,2,2,2,2,2,2,2,2,2,2,2,        0,1,1,1,2,0,1,1,2,2,0,1,2,2,2,0,
];

#[rustfmt::skip]
const ANCHOR_SECOND: [usize; 64] = [
    15,15,15,15,15,15,15,15,        15,15,15,15,15,15,15,15,        15, 2, 8, 2, 2, 8, 8,15,        2, 8, 2, 2, 8, 8, 2, 2,        15,15, 6, 8, 2, 8,15,15,        2, 8, 2, 2, 2,15,15, 6,        6, 2, 6, 8,15,15, 2, 2,        15,15,15,15,15, 2, 2,15
];

#[rustfmt::skip]
const ANCHOR_THIRD1: [usize; 64] = [
    3, 3,15,15, 8, 3,15,15,        8, 8, 6, 6, 6, 5, 3, 3,        3, 3, 8,15, 3, 3, 6,10,        5, 8, 8, 6, 8, 5,15,15,        8,15, 3, 5, 6,10, 8,15,        15, 3,15, 5,15,15,15,15,        3,15, 5, 5, 5, 8, 5,10,        5,10, 8,13,15,12, 3, 3
];

#[rustfmt::skip]
const ANCHOR_THIRD2: [usize; 64] = [
    15, 8, 8, 3,15,15, 3, 8,        15,15,15,15,15,15,15, 8,        15, 8,15, 3,15, 8,15, 8,        3,15, 6,10,15,15,10, 8,        15, 3,15,10,10, 8, 9,10,        6,15, 8,15, 3, 6, 6, 8,        15, 3,15,15,15,15,15,15,        15,15,15,15, 3,15,15, 8
];

#[derive(Debug, Clone, Copy)]
struct ModeInfo {
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_sel_bits: u32,
    color_bits: u32,
    alpha_bits: u32,
    endpoint_pbits: bool,
    shared_pbits: bool,
    index_bits: u32,
    index2_bits: u32,
}

impl ModeInfo {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        subsets: usize,
        partition_bits: u32,
        rotation_bits: u32,
        index_sel_bits: u32,
        color_bits: u32,
        alpha_bits: u32,
        endpoint_pbits: bool,
        shared_pbits: bool,
        index_bits: u32,
        index2_bits: u32,
    ) -> ModeInfo {
        ModeInfo {
            subsets,
            partition_bits,
            rotation_bits,
            index_sel_bits,
            color_bits,
            alpha_bits,
            endpoint_pbits,
            shared_pbits,
            index_bits,
            index2_bits,
        }
    }

    fn has_pbit(&self) -> bool {
        self.endpoint_pbits || self.shared_pbits
    }
}

#[rustfmt::skip]
static MODES: [ModeInfo; 8] = [
    ModeInfo::new(3, 4, 0, 0, 4, 0, true,  false, 3, 0),
    ModeInfo::new(2, 6, 0, 0, 6, 0, false, true,  3, 0),
    ModeInfo::new(3, 6, 0, 0, 5, 0, false, false, 2, 0),
    ModeInfo::new(2, 6, 0, 0, 7, 0, true,  false, 2, 0),
    ModeInfo::new(1, 0, 2, 1, 5, 6, false, false, 2, 3),
    ModeInfo::new(1, 0, 2, 0, 7, 8, false, false, 2, 2),
    ModeInfo::new(1, 0, 0, 0, 7, 7, true,  false, 4, 0),
    ModeInfo::new(2, 6, 0, 0, 5, 5, true,  false, 2, 0),
];

/// Expands a `bits`-wide endpoint (plus its P-bit, if any) to 8 bits by
/// replicating the high bits into the low ones.
fn dequantize(raw: u32, bits: u32, pbit: Option<u32>) -> u32 {
    let (v, bits) = match pbit {
        Some(p) => ((raw << 1) | p, bits + 1),
        None => (raw, bits),
    };
    let v = v << (8 - bits);
    v | (v >> bits)
}

fn weights(index_bits: u32) -> &'static [u32] {
    match index_bits {
        2 => &WEIGHTS2,
        3 => &WEIGHTS3,
        _ => &WEIGHTS4,
    }
}

fn interpolate(e0: u32, e1: u32, w: u32) -> u8 {
    (((64 - w) * e0 + w * e1 + 32) >> 6) as u8
}

fn subset_of(subsets: usize, partition: usize, texel: usize) -> usize {
    match subsets {
        1 => 0,
        2 => PARTITION2[partition * 16 + texel],
        _ => PARTITION3[partition * 16 + texel],
    }
}

/// Anchor texel of each subset; anchors store their index with one bit fewer.
fn anchors(subsets: usize, partition: usize) -> [usize; 3] {
    match subsets {
        1 => [0, 0, 0],
        2 => [0, ANCHOR_SECOND[partition], 0],
        _ => [0, ANCHOR_THIRD1[partition], ANCHOR_THIRD2[partition]],
    }
}

pub struct Bc7Unorm;

impl Bc7Unorm {
    fn decode_block<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 16],
        mut writer: F,
    ) -> Result<CellStatus, CellError> {
        let mut stream = BitReader::lsb_first(cell);

        let mut mode = 0;
        while mode < MODES.len() && stream.read_bit()? == 0 {
            mode += 1;
        }
        let Some(info) = MODES.get(mode) else {
            for y in 0..4 {
                for x in 0..4 {
                    writer(x, y, TRANSPARENT_BLACK);
                }
            }
            return Ok(CellStatus::Illegal);
        };

        let partition = stream.read_bits(info.partition_bits)? as usize;
        let rotation = stream.read_bits(info.rotation_bits)?;
        let index_sel = stream.read_bits(info.index_sel_bits)?;

        let num_endpoints = info.subsets * 2;
        let mut endpoints = [[0u32; 4]; 6];
        for c in 0..3 {
            for e in endpoints[..num_endpoints].iter_mut() {
                e[c] = stream.read_bits(info.color_bits)?;
            }
        }
        if info.alpha_bits > 0 {
            for e in endpoints[..num_endpoints].iter_mut() {
                e[3] = stream.read_bits(info.alpha_bits)?;
            }
        }

        let mut pbits = [0u32; 6];
        if info.endpoint_pbits {
            for p in pbits[..num_endpoints].iter_mut() {
                *p = stream.read_bit()?;
            }
        } else if info.shared_pbits {
            for s in 0..info.subsets {
                let p = stream.read_bit()?;
                pbits[2 * s] = p;
                pbits[2 * s + 1] = p;
            }
        }

        for (e, p) in endpoints[..num_endpoints].iter_mut().zip(pbits) {
            let pbit = info.has_pbit().then_some(p);
            for c in 0..3 {
                e[c] = dequantize(e[c], info.color_bits, pbit);
            }
            e[3] = if info.alpha_bits > 0 {
                dequantize(e[3], info.alpha_bits, pbit)
            } else {
                255
            };
        }

        let anchors = anchors(info.subsets, partition);
        let anchors = &anchors[..info.subsets];
        let mut primary = [0u32; 16];
        for (i, idx) in primary.iter_mut().enumerate() {
            let bits = info.index_bits - u32::from(anchors.contains(&i));
            *idx = stream.read_bits(bits)?;
        }
        let mut secondary = [0u32; 16];
        if info.index2_bits > 0 {
            for (i, idx) in secondary.iter_mut().enumerate() {
                let bits = info.index2_bits - u32::from(i == 0);
                *idx = stream.read_bits(bits)?;
            }
        }

        let (color_idx, color_weights, alpha_idx, alpha_weights) = if info.index2_bits == 0 {
            (&primary, weights(info.index_bits), &primary, weights(info.index_bits))
        } else if index_sel == 0 {
            (&primary, weights(info.index_bits), &secondary, weights(info.index2_bits))
        } else {
            (&secondary, weights(info.index2_bits), &primary, weights(info.index_bits))
        };

        for y in 0..4 {
            for x in 0..4 {
                let i = x + y * 4;
                let s = subset_of(info.subsets, partition, i);
                let (e0, e1) = (endpoints[2 * s], endpoints[2 * s + 1]);
                let cw = color_weights[color_idx[i] as usize];
                let aw = alpha_weights[alpha_idx[i] as usize];
                let mut color = [
                    interpolate(e0[0], e1[0], cw),
                    interpolate(e0[1], e1[1], cw),
                    interpolate(e0[2], e1[2], cw),
                    interpolate(e0[3], e1[3], aw),
                ];
                if rotation >= 1 {
                    color.swap(3, (rotation - 1) as usize);
                }
                writer(x, y, color);
            }
        }
        Ok(CellStatus::Decoded)
    }
}

impl TexCodec<16> for Bc7Unorm {
    const CELL_WIDTH: usize = 4;
    const CELL_HEIGHT: usize = 4;

    fn decode<F: FnMut(usize, usize, Rgba8)>(
        cell: &[u8; 16],
        _ctx: &CellContext<'_>,
        writer: F,
    ) -> Result<CellStatus, CellError> {
        Self::decode_block(cell, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs fields LSB-first, the way BC7 blocks are laid out.
    #[derive(Default)]
    struct BitWriter {
        bytes: [u8; 16],
        pos: usize,
    }

    impl BitWriter {
        fn put(&mut self, bits: u32, value: u32) -> &mut Self {
            for i in 0..bits {
                let bit = (value.checked_shr(i).unwrap_or(0) & 1) as u8;
                self.bytes[self.pos / 8] |= bit << (self.pos % 8);
                self.pos += 1;
            }
            self
        }

        fn mode(&mut self, mode: u32) -> &mut Self {
            self.put(mode + 1, 1 << mode)
        }

        fn finish(&self) -> [u8; 16] {
            assert_eq!(self.pos, 128, "block must be exactly 128 bits");
            self.bytes
        }
    }

    fn decode(cell: &[u8; 16]) -> ([[Rgba8; 4]; 4], CellStatus) {
        let mut out = [[[0xAA; 4]; 4]; 4];
        let status = Bc7Unorm::decode(cell, &CellContext::default(), |x, y, v| out[y][x] = v).unwrap();
        (out, status)
    }

    #[test]
    fn dequantize_replicates_high_bits() {
        assert_eq!(dequantize(0b1010, 4, Some(1)), 173);
        assert_eq!(dequantize(31, 5, None), 255);
        assert_eq!(dequantize(0, 5, None), 0);
        assert_eq!(dequantize(0b10000, 5, None), 132);
        assert_eq!(dequantize(127, 7, Some(1)), 255);
        assert_eq!(dequantize(0xC3, 8, None), 0xC3);
    }

    #[test]
    fn interpolation_endpoints() {
        assert_eq!(interpolate(10, 200, 0), 10);
        assert_eq!(interpolate(10, 200, 64), 200);
        assert_eq!(interpolate(0, 255, 32), 128);
    }

    #[test]
    fn mode_tables_fill_128_bits() {
        for (mode, info) in MODES.iter().enumerate() {
            let endpoints = info.subsets as u32 * 2;
            let pbits = if info.endpoint_pbits {
                endpoints
            } else if info.shared_pbits {
                info.subsets as u32
            } else {
                0
            };
            let index2 = if info.index2_bits > 0 { 16 * info.index2_bits - 1 } else { 0 };
            let total = mode as u32 + 1
                + info.partition_bits
                + info.rotation_bits
                + info.index_sel_bits
                + endpoints * (3 * info.color_bits + info.alpha_bits)
                + pbits
                + 16 * info.index_bits - info.subsets as u32
                + index2;
            assert_eq!(total, 128, "mode {mode}");
        }
    }

    #[test]
    fn mode0_three_subsets_with_pbits() {
        let mut w = BitWriter::default();
        w.mode(0).put(4, 0);
        for value in [0b1010, 0, 0xF] {
            for _ in 0..6 {
                w.put(4, value);
            }
        }
        w.put(6, 0b11_1111);
        w.put(45, 0);
        let (out, status) = decode(&w.finish());
        assert_eq!(status, CellStatus::Decoded);
        assert!(out.iter().flatten().all(|px| *px == [173, 8, 255, 255]));
    }

    #[test]
    fn mode1_two_subsets_follow_partition() {
        let mut w = BitWriter::default();
        // partition 13: top half subset 0, bottom half subset 1
        w.mode(1).put(6, 13);
        for r in [63, 63, 0, 0] {
            w.put(6, r);
        }
        for _ in 0..4 {
            w.put(6, 0);
        }
        for b in [0, 0, 63, 63] {
            w.put(6, b);
        }
        w.put(2, 0b11);
        w.put(46, 0);
        let (out, _) = decode(&w.finish());
        for y in 0..4 {
            let expected = if y < 2 { [255, 2, 2, 255] } else { [2, 2, 255, 255] };
            for x in 0..4 {
                assert_eq!(out[y][x], expected, "texel ({x}, {y})");
            }
        }
    }

    #[test]
    fn mode2_three_subsets_without_pbits() {
        let mut w = BitWriter::default();
        w.mode(2).put(6, 0);
        for r in [31, 31, 0, 0, 16, 16] {
            w.put(5, r);
        }
        for g in [0, 0, 31, 31, 16, 16] {
            w.put(5, g);
        }
        w.put(30, 0);
        w.put(29, 0);
        let (out, _) = decode(&w.finish());
        let colors = [[255, 0, 0, 255], [0, 255, 0, 255], [132, 132, 0, 255]];
        for y in 0..4 {
            for x in 0..4 {
                let subset = PARTITION3[x + y * 4];
                assert_eq!(out[y][x], colors[subset], "texel ({x}, {y})");
            }
        }
    }

    #[test]
    fn mode3_pbit_is_the_low_bit() {
        let mut w = BitWriter::default();
        w.mode(3).put(6, 13);
        for r in [100, 100, 0, 0] {
            w.put(7, r);
        }
        w.put(28, 0);
        for b in [0, 0, 127, 127] {
            w.put(7, b);
        }
        w.put(1, 1).put(1, 1).put(1, 0).put(1, 0);
        w.put(30, 0);
        let (out, _) = decode(&w.finish());
        for y in 0..4 {
            let expected = if y < 2 { [201, 1, 1, 255] } else { [0, 0, 254, 255] };
            for x in 0..4 {
                assert_eq!(out[y][x], expected, "texel ({x}, {y})");
            }
        }
    }

    #[test]
    fn mode7_color_and_alpha_share_pbits() {
        let mut w = BitWriter::default();
        w.mode(7).put(6, 13);
        for r in [0b10101, 0, 0, 0] {
            w.put(5, r);
        }
        w.put(20, 0);
        for b in [0, 0, 31, 31] {
            w.put(5, b);
        }
        for a in [31, 31, 0b10000, 0b10000] {
            w.put(5, a);
        }
        w.put(1, 0).put(1, 0).put(1, 1).put(1, 1);
        // texel 1 selects the second endpoint of subset 0
        w.put(1, 0).put(2, 3).put(27, 0);
        let (out, _) = decode(&w.finish());
        assert_eq!(out[0][0], [170, 0, 0, 251]);
        assert_eq!(out[0][1], [0, 0, 0, 251]);
        assert_eq!(out[1][3], [170, 0, 0, 251]);
        assert_eq!(out[2][0], [4, 4, 255, 134]);
        assert_eq!(out[3][3], [4, 4, 255, 134]);
    }

    #[test]
    fn mode6_endpoint_and_index_extremes() {
        let mut w = BitWriter::default();
        w.mode(6);
        for (e0, e1) in [(0, 127), (0, 127), (0, 127), (127, 0)] {
            w.put(7, e0).put(7, e1);
        }
        w.put(1, 0).put(1, 1);
        // texel 0 keeps index 0, texel 1 jumps to the far endpoint
        w.put(3, 0).put(4, 15);
        w.put(4 * 14, 0);
        let (out, _) = decode(&w.finish());
        assert_eq!(out[0][0], [0, 0, 0, 254]);
        assert_eq!(out[0][1], [255, 255, 255, 1]);
        assert_eq!(out[3][3], [0, 0, 0, 254]);
    }

    #[test]
    fn mode5_rotation_swaps_alpha_with_red() {
        let block = |rotation: u32| {
            let mut w = BitWriter::default();
            w.mode(5).put(2, rotation);
            w.put(7, 127).put(7, 127);
            w.put(14, 0).put(14, 0);
            w.put(8, 0x40).put(8, 0x40);
            w.put(31, 0).put(31, 0);
            w.finish()
        };
        let (plain, _) = decode(&block(0));
        assert_eq!(plain[1][1], [255, 0, 0, 0x40]);
        let (rotated, _) = decode(&block(1));
        assert_eq!(rotated[1][1], [0x40, 0, 0, 255]);
        let (blue, _) = decode(&block(3));
        assert_eq!(blue[1][1], [255, 0, 0x40, 0]);
    }

    #[test]
    fn mode4_index_selection_swaps_streams() {
        let block = |index_sel: u32| {
            let mut w = BitWriter::default();
            w.mode(4).put(2, 0).put(1, index_sel);
            for _ in 0..3 {
                w.put(5, 0).put(5, 31);
            }
            w.put(6, 0).put(6, 63);
            // primary stream: every texel at its top index
            w.put(1, 1);
            for _ in 1..16 {
                w.put(2, 3);
            }
            // secondary stream: all zero
            w.put(2, 0).put(45, 0);
            w.finish()
        };
        let (color_primary, _) = decode(&block(0));
        assert_eq!(color_primary[0][1], [255, 255, 255, 0]);
        let (alpha_primary, _) = decode(&block(1));
        assert_eq!(alpha_primary[0][1], [0, 0, 0, 255]);
        // anchor texel: one-bit primary index 1 selects weight 21 of the 2-bit ramp
        assert_eq!(alpha_primary[0][0], [0, 0, 0, 84]);
    }

    #[test]
    fn reserved_mode_is_transparent_black() {
        let mut cell = [0u8; 16];
        cell[1] = 0xFF;
        let (out, status) = decode(&cell);
        assert_eq!(status, CellStatus::Illegal);
        assert!(out.iter().flatten().all(|px| *px == TRANSPARENT_BLACK));
    }

    #[test]
    fn partition_tables_match_anchor_subsets() {
        for p in 0..64 {
            assert_eq!(PARTITION2[p * 16], 0);
            assert_eq!(PARTITION2[p * 16 + ANCHOR_SECOND[p]], 1, "partition {p}");
            assert_eq!(PARTITION3[p * 16 + ANCHOR_THIRD1[p]], 1, "partition {p}");
            assert_eq!(PARTITION3[p * 16 + ANCHOR_THIRD2[p]], 2, "partition {p}");
        }
    }
}

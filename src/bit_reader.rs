use thiserror::Error;

/// Order in which bits are pulled out of each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Most significant bit of each byte first; the first bit read becomes the
    /// high bit of the result. Used by the GX planar formats.
    Normal,
    /// Least significant bit of each byte first; the first bit read becomes the
    /// low bit of the result. Used by BC7.
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bit stream exhausted: requested {requested} bits at bit {position}, {remaining} remain")]
pub struct BitReadError {
    pub position: usize,
    pub requested: u32,
    pub remaining: usize,
}

/// Cursor over a byte slice that hands out fields of arbitrary width.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
    order: BitOrder,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], order: BitOrder) -> Self {
        BitReader { data, bit_pos: 0, order }
    }

    pub fn msb_first(data: &'a [u8]) -> Self {
        Self::new(data, BitOrder::Normal)
    }

    pub fn lsb_first(data: &'a [u8]) -> Self {
        Self::new(data, BitOrder::Reversed)
    }

    pub fn bits_read(&self) -> usize {
        self.bit_pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Consumes the next `n` bits (`n <= 32`). Nothing is consumed on error.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, BitReadError> {
        debug_assert!(n <= 32);
        if n as usize > self.remaining() {
            return Err(BitReadError {
                position: self.bit_pos,
                requested: n,
                remaining: self.remaining(),
            });
        }

        let mut value = 0u32;
        for i in 0..n {
            let byte = self.data[self.bit_pos / 8];
            let offset = (self.bit_pos % 8) as u32;
            match self.order {
                BitOrder::Normal => {
                    let bit = (byte >> (7 - offset)) & 1;
                    value = (value << 1) | bit as u32;
                }
                BitOrder::Reversed => {
                    let bit = (byte >> offset) & 1;
                    value |= (bit as u32) << i;
                }
            }
            self.bit_pos += 1;
        }
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<u32, BitReadError> {
        self.read_bits(1)
    }
}

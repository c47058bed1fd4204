use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// A read past the end of the payload, reported before any byte is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBytes {
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

/// Bounds-checked cursor over an encoded texture payload.
#[derive(Debug)]
pub struct BytesCursor<'a> {
    pub data: &'a [u8],
    pub index: usize,
}

impl<'a> BytesCursor<'a> {
    pub fn new(data: &'a [u8]) -> BytesCursor<'a> {
        BytesCursor { data, index: 0 }
    }

    /// Borrows the next `N` bytes as a fixed-size cell and advances.
    pub fn read_cell<const N: usize>(&mut self) -> Result<&'a [u8; N], OutOfBytes> {
        let cell = self.peek_cell::<N>(self.index)?;
        self.index += N;
        Ok(cell)
    }

    /// Borrows `N` bytes at `offset` without moving the cursor.
    pub fn peek_cell<const N: usize>(&self, offset: usize) -> Result<&'a [u8; N], OutOfBytes> {
        let err = OutOfBytes {
            offset,
            needed: N,
            available: self.data.len(),
        };
        let data: &'a [u8] = self.data;
        let end = offset.checked_add(N).ok_or(err)?;
        if end > data.len() {
            return Err(err);
        }
        data[offset..end].try_into().map_err(|_| err)
    }
}

/// Fixed-width reads used by the block codecs. Cells are always large enough
/// for the offsets they are called with.
pub trait ReadCellTyped {
    fn u16_le(&self, offset: usize) -> u16;
    fn u16_be(&self, offset: usize) -> u16;
}

impl<const N: usize> ReadCellTyped for [u8; N] {
    fn u16_le(&self, offset: usize) -> u16 {
        LittleEndian::read_u16(&self[offset..offset + 2])
    }

    fn u16_be(&self, offset: usize) -> u16 {
        BigEndian::read_u16(&self[offset..offset + 2])
    }
}

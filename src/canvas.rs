use image::RgbaImage;

use crate::compression::Rgba8;

/// Block-aligned RGBA8 scratch grid. Rows are stored bottom-up: image row 0
/// lives in the last storage row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelCanvas {
    /// Zero-filled (transparent black) canvas of the given padded size, or
    /// `None` when its byte length overflows `usize`.
    pub fn new(width: u32, height: u32) -> Option<PixelCanvas> {
        let len = (width as usize).checked_mul(height as usize)?.checked_mul(4)?;
        Some(PixelCanvas { width, height, data: vec![0; len] })
    }

    fn storage_index(&self, x: usize, y: usize) -> Option<usize> {
        let (w, h) = (self.width as usize, self.height as usize);
        if x >= w || y >= h {
            return None;
        }
        Some(((h - 1 - y) * w + x) * 4)
    }

    /// Writes image texel (`x`, `y`). Returns false and leaves the canvas
    /// untouched when the coordinate is outside it.
    pub fn put(&mut self, x: usize, y: usize, v: Rgba8) -> bool {
        match self.storage_index(x, y) {
            Some(i) => {
                self.data[i..i + 4].copy_from_slice(&v);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba8> {
        let i = self.storage_index(x, y)?;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    /// Top-left `width`x`height` region in top-down raster order.
    pub fn crop(&self, width: u32, height: u32) -> RgbaImage {
        let width = width.min(self.width);
        let height = height.min(self.height);
        RgbaImage::from_fn(width, height, |x, y| {
            let px = self.get(x as usize, y as usize).unwrap_or_default();
            image::Rgba(px)
        })
    }
}

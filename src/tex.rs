use std::sync::Arc;

use image::{DynamicImage, Rgba32FImage, RgbaImage};
use log::{trace, warn};

use crate::bc7::Bc7Unorm;
use crate::canvas::PixelCanvas;
use crate::channels::{reconstruct_normal_z, split_channels, ChannelImage};
use crate::compression::{
    check_swizzled_len, Bc1Unorm, Bc3Unorm, Bc4Unorm, Bc5Unorm, CellContext, CellReport, Rgba8, TexCodec,
};
use crate::format::{self, Family, FormatDescriptor, TextureFormat};
use crate::gx::{Cmpr, Palette, Rgb565, Rgb5a3, Rgba32, C14x2, C4, C8, I4, I8, IA4, IA8};
use crate::swizzle::{SwizzleCache, SwizzleMap};
use crate::texerr::{DecodeError, DecodeWarning, Result};

/// One headerless texture payload, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct EncodedTexture<'a> {
    pub data: &'a [u8],
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub palette: Option<&'a Palette>,
}

impl<'a> EncodedTexture<'a> {
    pub fn new(data: &'a [u8], format: u32, width: u32, height: u32) -> EncodedTexture<'a> {
        EncodedTexture { data, format, width, height, palette: None }
    }

    pub fn with_palette(mut self, palette: &'a Palette) -> EncodedTexture<'a> {
        self.palette = Some(palette);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Rebuild blue from red and green for BC5 normal maps.
    pub normalize_bc5: bool,
    /// Also produce one grayscale image per non-flat channel.
    pub split_channels: bool,
}

impl DecodeOptions {
    pub fn normalize_bc5(mut self, on: bool) -> DecodeOptions {
        self.normalize_bc5 = on;
        self
    }

    pub fn split_channels(mut self, on: bool) -> DecodeOptions {
        self.split_channels = on;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub format: TextureFormat,
    /// Cropped to the nominal size, top row first.
    pub image: RgbaImage,
    /// Empty unless `split_channels` was requested.
    pub channels: Vec<ChannelImage>,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedTexture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn to_rgba32f(&self) -> Rgba32FImage {
        DynamicImage::ImageRgba8(self.image.clone()).to_rgba32f()
    }
}

#[derive(Debug, Clone)]
pub struct TextureDecoder {
    cache: Arc<SwizzleCache>,
    options: DecodeOptions,
}

impl Default for TextureDecoder {
    fn default() -> Self {
        TextureDecoder::new(DecodeOptions::default())
    }
}

impl TextureDecoder {
    /// Decoder backed by the process-wide swizzle cache.
    pub fn new(options: DecodeOptions) -> TextureDecoder {
        TextureDecoder::with_cache(SwizzleCache::global(), options)
    }

    pub fn with_cache(cache: Arc<SwizzleCache>, options: DecodeOptions) -> TextureDecoder {
        TextureDecoder { cache, options }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn cache(&self) -> &Arc<SwizzleCache> {
        &self.cache
    }

    pub fn decode(&self, tex: &EncodedTexture<'_>) -> Result<DecodedTexture> {
        let invalid = || DecodeError::InvalidDimensions { width: tex.width, height: tex.height };
        if tex.width == 0 || tex.height == 0 {
            return Err(invalid());
        }
        let desc = format::lookup(tex.format).ok_or(DecodeError::UnsupportedFormat { id: tex.format })?;
        if desc.format.uses_palette() && tex.palette.is_none() {
            return Err(DecodeError::MissingPalette { format: desc.format });
        }
        let (padded_w, padded_h) = desc.padded_size(tex.width, tex.height).ok_or_else(invalid)?;
        let min_len = desc.min_payload_size(tex.width, tex.height).ok_or_else(invalid)?;
        trace!(
            "decoding {} {}x{} from {} bytes",
            desc.format,
            tex.width,
            tex.height,
            tex.data.len()
        );

        let map = match desc.family {
            Family::Legacy => None,
            Family::BlockCompressed => {
                let (tiles_y, tiles_x) = desc.tile_grid(tex.width, tex.height);
                Some(self.cache.get_or_build(tiles_y, tiles_x)?)
            }
        };
        if tex.data.len() < min_len {
            match &map {
                Some(map) => check_swizzled_len(tex.data.len(), desc, tex.width, tex.height, map)?,
                None => return Err(legacy_truncation(tex, desc)),
            }
        }

        let mut canvas = PixelCanvas::new(padded_w, padded_h).ok_or_else(invalid)?;
        let mut dropped = 0usize;
        let normalize = self.options.normalize_bc5 && desc.format == TextureFormat::Bc5Unorm;
        let writer = |x: usize, y: usize, mut v: Rgba8| {
            if normalize {
                v[2] = reconstruct_normal_z(v[0], v[1]);
            }
            if !canvas.put(x, y, v) {
                dropped += 1;
            }
        };
        let ctx = CellContext { palette: tex.palette };

        let report = match &map {
            None => decode_legacy(tex, desc, &ctx, writer)?,
            Some(map) => decode_block_compressed(tex, desc, map, &ctx, writer)?,
        };
        if dropped > 0 {
            warn!("{}: {dropped} texels fell outside the canvas", desc.format);
        }

        let mut warnings = Vec::new();
        if let Some(first) = report.illegal.first() {
            let warning = DecodeWarning::IllegalBlocks {
                format: desc.format,
                count: report.illegal.len(),
                first_block: (first.block_x, first.block_y),
                first_offset: first.offset,
            };
            warn!("{warning}");
            warnings.push(warning);
        }

        let image = canvas.crop(tex.width, tex.height);
        let channels = if self.options.split_channels {
            split_channels(&image)
        } else {
            Vec::new()
        };
        Ok(DecodedTexture { format: desc.format, image, channels, warnings })
    }

    /// Decodes every texture independently; one failure never affects the rest.
    pub fn decode_batch(&self, textures: &[EncodedTexture<'_>]) -> Vec<Result<DecodedTexture>> {
        textures
            .iter()
            .enumerate()
            .map(|(i, tex)| {
                let res = self.decode(tex);
                if let Err(e) = &res {
                    warn!("texture {i}: {e}");
                }
                res
            })
            .collect()
    }
}

/// The cell a raster-order walk over a short legacy payload stops at.
fn legacy_truncation(tex: &EncodedTexture<'_>, desc: &FormatDescriptor) -> DecodeError {
    let needed = desc.bytes_per_block as usize;
    let (blocks_x, _) = desc.block_grid(tex.width, tex.height);
    let cell = tex.data.len() / needed;
    DecodeError::TruncatedInput {
        format: desc.format,
        offset: cell * needed,
        needed,
        available: tex.data.len(),
        block_x: (cell % blocks_x as usize) as u32,
        block_y: (cell / blocks_x as usize) as u32,
    }
}

fn decode_block_compressed<F: FnMut(usize, usize, Rgba8)>(
    tex: &EncodedTexture<'_>,
    desc: &FormatDescriptor,
    map: &SwizzleMap,
    ctx: &CellContext<'_>,
    writer: F,
) -> Result<CellReport> {
    let (data, w, h) = (tex.data, tex.width, tex.height);
    match desc.format {
        TextureFormat::Bc1Unorm => Bc1Unorm::decode_image_swizzled(data, desc, w, h, map, ctx, writer),
        TextureFormat::Bc3Unorm => Bc3Unorm::decode_image_swizzled(data, desc, w, h, map, ctx, writer),
        TextureFormat::Bc4Unorm => Bc4Unorm::decode_image_swizzled(data, desc, w, h, map, ctx, writer),
        TextureFormat::Bc5Unorm => Bc5Unorm::decode_image_swizzled(data, desc, w, h, map, ctx, writer),
        TextureFormat::Bc7Unorm => Bc7Unorm::decode_image_swizzled(data, desc, w, h, map, ctx, writer),
        _ => Err(DecodeError::UnsupportedFormat { id: desc.id }),
    }
}

fn decode_legacy<F: FnMut(usize, usize, Rgba8)>(
    tex: &EncodedTexture<'_>,
    desc: &FormatDescriptor,
    ctx: &CellContext<'_>,
    writer: F,
) -> Result<CellReport> {
    let (data, w, h) = (tex.data, tex.width, tex.height);
    match desc.format {
        TextureFormat::I4 => I4::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::I8 => I8::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::IA4 => IA4::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::IA8 => IA8::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::Rgb565 => Rgb565::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::Rgb5a3 => Rgb5a3::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::Rgba32 => Rgba32::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::C4 => C4::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::C8 => C8::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::C14x2 => C14x2::decode_image_linear(data, desc, w, h, ctx, writer),
        TextureFormat::Cmpr => Cmpr::decode_image_linear(data, desc, w, h, ctx, writer),
        _ => Err(DecodeError::UnsupportedFormat { id: desc.id }),
    }
}

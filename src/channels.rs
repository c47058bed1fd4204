use image::{GrayImage, Luma, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }

    /// Lowercase name, used as a file suffix by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        }
    }
}

/// One channel of a decoded texture as a grayscale image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelImage {
    pub channel: Channel,
    pub image: GrayImage,
}

/// Splits `image` into grayscale views, leaving out any channel that is
/// entirely 0 or entirely 255. Other constant values are kept.
pub fn split_channels(image: &RgbaImage) -> Vec<ChannelImage> {
    Channel::ALL
        .iter()
        .filter_map(|&channel| {
            let c = channel.index();
            let mut values = image.pixels().map(|p| p.0[c]);
            let flat = match values.next() {
                Some(first @ (0 | 255)) => values.all(|v| v == first),
                _ => false,
            };
            if flat {
                return None;
            }
            let gray = GrayImage::from_fn(image.width(), image.height(), |x, y| {
                Luma([image.get_pixel(x, y).0[c]])
            });
            Some(ChannelImage { channel, image: gray })
        })
        .collect()
}

/// Rebuilds the Z component of a tangent-space normal from its X and Y,
/// stored directly as a 0..1 channel value. A vector already longer than
/// one gets a flat 0.5.
pub fn reconstruct_normal_z(r: u8, g: u8) -> u8 {
    let x = r as f32 / 255.0 * 2.0 - 1.0;
    let y = g as f32 / 255.0 * 2.0 - 1.0;
    let l = 1.0 - x * x - y * y;
    let z = if l < 0.0 { 0.5 } else { l.sqrt() };
    (z * 255.0).round() as u8
}

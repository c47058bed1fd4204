pub mod bc7;
pub mod bit_reader;
pub mod bitfield;
pub mod byte_reader;
pub mod canvas;
pub mod channels;
pub mod compression;
pub mod format;
pub mod gx;
pub mod swizzle;
pub mod tex;
pub mod texerr;

pub use channels::{Channel, ChannelImage};
pub use format::{FormatDescriptor, TextureFormat};
pub use gx::Palette;
pub use swizzle::{SwizzleCache, SwizzleMap};
pub use tex::{DecodeOptions, DecodedTexture, EncodedTexture, TextureDecoder};
pub use texerr::{DecodeError, DecodeWarning};

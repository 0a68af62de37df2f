//! Texture format identifiers and the decoded image type.

use serde::Serialize;

// ============================================================================
// Texel Encodings
// ============================================================================

/// GX texel encodings understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TexelEncoding {
    /// 4-bit intensity.
    I4,
    /// 4-bit intensity with 4-bit alpha.
    Ia4,
    /// 8-bit intensity.
    I8,
    /// 8-bit intensity with 8-bit alpha.
    Ia8,
    /// Opaque 5-6-5 color.
    Rgb565,
    /// 5-5-5 opaque or 4-4-4-3 translucent color.
    Rgb5a3,
    /// 8-bit per channel color, split into AR and GB planes per block.
    Rgba32,
    /// Block-compressed color, DXT1-like.
    Cmpr,
    /// 4-bit palette index.
    Ci4,
    /// 8-bit palette index.
    Ci8,
}

impl TexelEncoding {
    /// Decode the encoding field of a texture header.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0x40 => Some(Self::I4),
            0x41 => Some(Self::Ia4),
            0x42 => Some(Self::I8),
            0x43 => Some(Self::Ia8),
            0x44 => Some(Self::Rgb565),
            0x45 => Some(Self::Rgba32),
            0x48 => Some(Self::Ci4),
            0x49 => Some(Self::Ci8),
            0x90 => Some(Self::Rgb5a3),
            0xB0 => Some(Self::Cmpr),
            _ => None,
        }
    }

    /// The header code for this encoding.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::I4 => 0x40,
            Self::Ia4 => 0x41,
            Self::I8 => 0x42,
            Self::Ia8 => 0x43,
            Self::Rgb565 => 0x44,
            Self::Rgba32 => 0x45,
            Self::Ci4 => 0x48,
            Self::Ci8 => 0x49,
            Self::Rgb5a3 => 0x90,
            Self::Cmpr => 0xB0,
        }
    }

    /// Block dimensions in texels (width, height).
    #[must_use]
    pub const fn block_dims(self) -> (usize, usize) {
        match self {
            Self::I4 | Self::Ci4 | Self::Cmpr => (8, 8),
            Self::Ia4 | Self::I8 | Self::Ci8 => (8, 4),
            Self::Ia8 | Self::Rgb565 | Self::Rgb5a3 | Self::Rgba32 => (4, 4),
        }
    }

    /// Storage cost of one texel in bits.
    #[must_use]
    pub const fn bits_per_texel(self) -> usize {
        match self {
            Self::I4 | Self::Ci4 | Self::Cmpr => 4,
            Self::Ia4 | Self::I8 | Self::Ci8 => 8,
            Self::Ia8 | Self::Rgb565 | Self::Rgb5a3 => 16,
            Self::Rgba32 => 32,
        }
    }

    /// Size in bytes of a `width` x `height` image, including block padding.
    #[must_use]
    pub const fn encoded_size(self, width: usize, height: usize) -> usize {
        let (bw, bh) = self.block_dims();
        let blocks = width.div_ceil(bw) * height.div_ceil(bh);
        blocks * bw * bh * self.bits_per_texel() / 8
    }

    /// Maximum palette size for indexed encodings.
    #[must_use]
    pub const fn palette_capacity(self) -> Option<usize> {
        match self {
            Self::Ci4 => Some(16),
            Self::Ci8 => Some(256),
            _ => None,
        }
    }

    /// Whether texels index a separate palette.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        self.palette_capacity().is_some()
    }
}

/// Encodings a palette entry can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaletteEncoding {
    Ia8,
    Rgb565,
    Rgb5a3,
}

impl PaletteEncoding {
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ia8),
            1 => Some(Self::Rgb565),
            2 => Some(Self::Rgb5a3),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Ia8 => 0,
            Self::Rgb565 => 1,
            Self::Rgb5a3 => 2,
        }
    }
}

/// Texture coordinate wrap behaviour along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

impl WrapMode {
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Clamp),
            1 => Some(Self::Repeat),
            2 => Some(Self::Mirror),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Clamp => 0,
            Self::Repeat => 1,
            Self::Mirror => 2,
        }
    }
}

// ============================================================================
// Images
// ============================================================================

/// Decoded palette of an indexed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// How entries are stored on disk.
    pub encoding: PaletteEncoding,
    /// Entries in index order, as RGBA.
    pub colors: Vec<[u8; 4]>,
}

/// A decoded texture payload.
///
/// `pixels` is RGBA8, row-major, top row first. `encoding` records the storage
/// format the image is written back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub encoding: TexelEncoding,
    /// Present for indexed encodings. When absent on write, a palette is built
    /// from the pixels.
    pub palette: Option<Palette>,
    /// Texels stored in the padding of partial blocks, in storage order.
    /// Empty unless decoded from a payload whose size is not a whole number
    /// of blocks.
    pub padding: Vec<[u8; 4]>,
}

impl Image {
    /// Create an image from an RGBA8 buffer.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, encoding: TexelEncoding) -> crate::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(crate::Error::InvalidImageSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            encoding,
            palette: None,
            padding: Vec::new(),
        })
    }

    /// RGBA value at (x, y), top-left origin.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_codes_round_trip() {
        for code in [0x40, 0x41, 0x42, 0x43, 0x44, 0x45, 0x48, 0x49, 0x90, 0xB0] {
            let encoding = TexelEncoding::from_code(code).unwrap();
            assert_eq!(encoding.code(), code);
        }
        assert_eq!(TexelEncoding::from_code(0x30), None);
    }

    #[test]
    fn test_encoded_sizes() {
        assert_eq!(TexelEncoding::Cmpr.encoded_size(8, 8), 32);
        assert_eq!(TexelEncoding::Rgba32.encoded_size(4, 4), 64);
        assert_eq!(TexelEncoding::I4.encoded_size(8, 8), 32);
        assert_eq!(TexelEncoding::Rgb5a3.encoded_size(4, 4), 32);
        // partial blocks are padded
        assert_eq!(TexelEncoding::I8.encoded_size(9, 3), 64);
    }

    #[test]
    fn test_image_size_checked() {
        assert!(Image::new(2, 2, vec![0; 16], TexelEncoding::I8).is_ok());
        assert!(Image::new(2, 2, vec![0; 12], TexelEncoding::I8).is_err());
    }
}

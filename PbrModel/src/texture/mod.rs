//! GX texel codec
//!
//! Converts between the console GPU's tiled texel encodings and linear RGBA8
//! buffers. Texels are stored in fixed-size blocks scanned left to right, top
//! to bottom; within a block, rows are scanned the same way. The on-disk row
//! order is the reverse of the in-memory [`Image`] row order, and the codec
//! applies the flip while re-tiling.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

pub mod cmpr;
mod decode;
mod encode;
pub mod pixel;
mod types;

use std::path::Path;

use image::RgbaImage;

use crate::error::{Error, Result};

pub use decode::{decode_palette, decode_texels, decode_texels_padded};
pub use encode::{build_palette, encode_palette, encode_texels, encode_texels_padded};
pub use types::{Image, Palette, PaletteEncoding, TexelEncoding, WrapMode};

/// Palette format used when an indexed image is written without one.
pub const DEFAULT_PALETTE_ENCODING: PaletteEncoding = PaletteEncoding::Rgb5a3;

/// Texel and palette payloads ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTexture {
    pub texels: Vec<u8>,
    pub palette: Option<EncodedPalette>,
}

/// An encoded palette blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPalette {
    pub encoding: PaletteEncoding,
    pub data: Vec<u8>,
    pub count: u16,
}

/// Decode a texel payload (and its palette blob, for indexed encodings).
pub fn decode_image(
    texels: &[u8],
    width: u16,
    height: u16,
    encoding: TexelEncoding,
    palette: Option<(&[u8], usize, PaletteEncoding)>,
) -> Result<Image> {
    let palette = palette
        .map(|(data, count, palette_encoding)| {
            decode_palette(data, count, palette_encoding).map(|colors| Palette {
                encoding: palette_encoding,
                colors,
            })
        })
        .transpose()?;

    let (pixels, padding) = decode_texels_padded(
        texels,
        width as usize,
        height as usize,
        encoding,
        palette.as_ref().map(|p| p.colors.as_slice()),
    )?;

    Ok(Image {
        width: width as u32,
        height: height as u32,
        pixels,
        encoding,
        palette,
        padding,
    })
}

/// Encode an image with its own encoding.
///
/// Indexed images without a palette get one built from their distinct colors.
pub fn encode_image(image: &Image) -> Result<EncodedTexture> {
    let width = image.width as usize;
    let height = image.height as usize;

    let Some(capacity) = image.encoding.palette_capacity() else {
        let texels = encode_texels_padded(&image.pixels, &image.padding, width, height, image.encoding, None)?;
        return Ok(EncodedTexture { texels, palette: None });
    };

    let (palette_encoding, colors) = match &image.palette {
        Some(palette) => (palette.encoding, palette.colors.clone()),
        None => (DEFAULT_PALETTE_ENCODING, build_palette(&image.pixels, capacity)?),
    };
    if colors.len() > capacity {
        return Err(Error::PaletteOverflow {
            colors: colors.len(),
            capacity,
        });
    }

    let data = encode_palette(&colors, palette_encoding);
    // Match against entries as they will decode, not as authored.
    let stored = decode_palette(&data, colors.len(), palette_encoding)?;
    let texels = encode_texels_padded(
        &image.pixels,
        &image.padding,
        width,
        height,
        image.encoding,
        Some(&stored),
    )?;

    Ok(EncodedTexture {
        texels,
        palette: Some(EncodedPalette {
            encoding: palette_encoding,
            data,
            count: colors.len() as u16,
        }),
    })
}

/// Save an image as PNG.
pub fn export_png<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let buffer = RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or(
        Error::InvalidImageSize {
            width: image.width,
            height: image.height,
            expected: image.width as usize * image.height as usize * 4,
            actual: image.pixels.len(),
        },
    )?;
    buffer.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
    Ok(())
}

/// Load a PNG (or any format the `image` crate reads) for writing as `encoding`.
pub fn import_png<P: AsRef<Path>>(path: P, encoding: TexelEncoding) -> Result<Image> {
    let rgba = image::open(path.as_ref())?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Image::new(width, height, rgba.into_raw(), encoding)
}

// ============================================================================
// Tiling
// ============================================================================

/// Disk positions `(x, y)` of every texel slot, in storage order.
///
/// Includes the padding slots of partial blocks.
pub(crate) fn tiled_positions(
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let blocks_x = width.div_ceil(block_width);
    let blocks_y = height.div_ceil(block_height);
    (0..blocks_y).flat_map(move |by| {
        (0..blocks_x).flat_map(move |bx| {
            (0..block_height).flat_map(move |ty| {
                (0..block_width).map(move |tx| (bx * block_width + tx, by * block_height + ty))
            })
        })
    })
}

/// Byte offset in a top-row-first RGBA8 buffer of the texel stored at disk
/// position (x, y), or `None` for padding.
pub(crate) fn memory_offset(x: usize, y: usize, width: usize, height: usize) -> Option<usize> {
    (x < width && y < height).then(|| ((height - 1 - y) * width + x) * 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiled_order() {
        let positions: Vec<_> = tiled_positions(8, 4, 4, 2).take(10).collect();
        assert_eq!(
            positions,
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1), (3, 1), (4, 0), (5, 0)]
        );
        assert_eq!(tiled_positions(5, 5, 4, 4).count(), 64);
    }

    #[test]
    fn test_rgb5a3_scenario() {
        // 4x4 RGB5A3: red, green, blue, then 13 half-transparent white texels
        let mut values = vec![0xFC00u16, 0x83E0, 0x801F];
        values.extend(std::iter::repeat_n(0x4FFFu16, 13));
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();

        let image = decode_image(&payload, 4, 4, TexelEncoding::Rgb5a3, None).unwrap();
        assert_eq!(image.pixels.len(), 64);

        // storage slot k sits at disk row k / 4, which is memory row 3 - k / 4
        assert_eq!(image.pixel(0, 3), Some([0xF8, 0, 0, 0xFF]));
        assert_eq!(image.pixel(1, 3), Some([0, 0xF8, 0, 0xFF]));
        assert_eq!(image.pixel(2, 3), Some([0, 0, 0xF8, 0xFF]));
        for y in 0..4 {
            for x in 0..4 {
                if y == 3 && x < 3 {
                    continue;
                }
                assert_eq!(image.pixel(x, y), Some([0xFF, 0xFF, 0xFF, 0x80]));
            }
        }

        let encoded = encode_image(&image).unwrap();
        assert_eq!(encoded.texels, payload);
        assert!(encoded.palette.is_none());
    }

    #[test]
    fn test_partial_block_padding_kept() {
        // 5x3 I8 fills one 8x4 block, 17 slots of it padding
        let payload: Vec<u8> = (0..32u8).map(|i| i.wrapping_mul(29)).collect();
        let image = decode_image(&payload, 5, 3, TexelEncoding::I8, None).unwrap();
        assert_eq!(image.padding.len(), 17);
        assert_eq!(encode_image(&image).unwrap().texels, payload);

        // without stored padding the slots are written as zero
        let fresh = Image::new(5, 3, image.pixels.clone(), TexelEncoding::I8).unwrap();
        let texels = encode_image(&fresh).unwrap().texels;
        for (i, &texel) in texels.iter().enumerate() {
            let padded = i % 8 >= 5 || i / 8 >= 3;
            assert_eq!(texel, if padded { 0 } else { payload[i] }, "slot {i}");
        }
    }

    #[test]
    fn test_indexed_image_builds_palette() {
        let mut pixels = Vec::new();
        for i in 0..64 {
            pixels.extend_from_slice(if i % 3 == 0 { &[0xFF, 0, 0, 0xFF] } else { &[0, 0, 0xFF, 0xFF] });
        }
        let image = Image::new(8, 8, pixels, TexelEncoding::Ci4).unwrap();
        let encoded = encode_image(&image).unwrap();
        let palette = encoded.palette.unwrap();
        assert_eq!(palette.count, 2);
        assert_eq!(palette.encoding, DEFAULT_PALETTE_ENCODING);

        let decoded = decode_image(
            &encoded.texels,
            8,
            8,
            TexelEncoding::Ci4,
            Some((&palette.data, 2, palette.encoding)),
        )
        .unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([0xF8, 0, 0, 0xFF]));
        assert_eq!(decoded.pixel(1, 0), Some([0, 0, 0xF8, 0xFF]));
    }

    #[test]
    fn test_png_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texture.png");
        let image = Image::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8], TexelEncoding::Rgba32).unwrap();
        export_png(&image, &path).unwrap();
        let loaded = import_png(&path, TexelEncoding::Rgba32).unwrap();
        assert_eq!(loaded, image);
    }
}

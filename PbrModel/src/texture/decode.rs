//! Tiled texel data to linear RGBA.

use super::cmpr;
use super::pixel::{ia8_to_rgba, rgb5a3_to_rgba, rgb565_to_rgba};
use super::types::{PaletteEncoding, TexelEncoding};
use super::{memory_offset, tiled_positions};
use crate::error::{Error, Result};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Decode `data` into a top-row-first RGBA8 buffer of `width * height * 4` bytes.
///
/// Indexed encodings look texels up in `palette`; indices past its end decode
/// as transparent black.
pub fn decode_texels(
    data: &[u8],
    width: usize,
    height: usize,
    encoding: TexelEncoding,
    palette: Option<&[[u8; 4]]>,
) -> Result<Vec<u8>> {
    decode_texels_padded(data, width, height, encoding, palette).map(|(pixels, _)| pixels)
}

/// Like [`decode_texels`], also returning the texels stored in the padding
/// of partial blocks, in storage order.
pub fn decode_texels_padded(
    data: &[u8],
    width: usize,
    height: usize,
    encoding: TexelEncoding,
    palette: Option<&[[u8; 4]]>,
) -> Result<(Vec<u8>, Vec<[u8; 4]>)> {
    let expected = encoding.encoded_size(width, height);
    if data.len() < expected {
        return Err(Error::InvalidImageSize {
            width: width as u32,
            height: height as u32,
            expected,
            actual: data.len(),
        });
    }

    let mut rgba = vec![0u8; width * height * 4];
    let mut padding = Vec::new();
    if encoding == TexelEncoding::Cmpr {
        decode_cmpr(data, width, height, &mut rgba, &mut padding);
        return Ok((rgba, padding));
    }

    let palette = palette.unwrap_or(&[]);
    let lookup = |index: usize| palette.get(index).copied().unwrap_or(TRANSPARENT);
    let (bw, bh) = encoding.block_dims();

    for (i, (x, y)) in tiled_positions(width, height, bw, bh).enumerate() {
        let texel = match encoding {
            TexelEncoding::I4 => {
                let v = nibble(data, i) * 0x11;
                [v, v, v, 0xFF]
            }
            TexelEncoding::Ia4 => {
                let b = data[i];
                let a = (b >> 4) * 0x11;
                let v = (b & 0x0F) * 0x11;
                [v, v, v, a]
            }
            TexelEncoding::I8 => {
                let v = data[i];
                [v, v, v, 0xFF]
            }
            TexelEncoding::Ia8 => ia8_to_rgba(half_word(data, i)),
            TexelEncoding::Rgb565 => rgb565_to_rgba(half_word(data, i)),
            TexelEncoding::Rgb5a3 => rgb5a3_to_rgba(half_word(data, i)),
            TexelEncoding::Rgba32 => {
                let base = (i / 16) * 64 + (i % 16) * 2;
                [data[base + 1], data[base + 32], data[base + 33], data[base]]
            }
            TexelEncoding::Ci4 => lookup(nibble(data, i) as usize),
            TexelEncoding::Ci8 => lookup(data[i] as usize),
            TexelEncoding::Cmpr => TRANSPARENT,
        };
        match memory_offset(x, y, width, height) {
            Some(dst) => rgba[dst..dst + 4].copy_from_slice(&texel),
            None => padding.push(texel),
        }
    }

    Ok((rgba, padding))
}

/// Decode `count` palette entries.
pub fn decode_palette(data: &[u8], count: usize, encoding: PaletteEncoding) -> Result<Vec<[u8; 4]>> {
    if data.len() < count * 2 {
        return Err(Error::InvalidImageSize {
            width: count as u32,
            height: 1,
            expected: count * 2,
            actual: data.len(),
        });
    }
    Ok((0..count)
        .map(|i| {
            let value = half_word(data, i);
            match encoding {
                PaletteEncoding::Ia8 => ia8_to_rgba(value),
                PaletteEncoding::Rgb565 => rgb565_to_rgba(value),
                PaletteEncoding::Rgb5a3 => rgb5a3_to_rgba(value),
            }
        })
        .collect())
}

fn decode_cmpr(data: &[u8], width: usize, height: usize, rgba: &mut [u8], padding: &mut Vec<[u8; 4]>) {
    let blocks_x = width.div_ceil(8);
    let blocks_y = height.div_ceil(8);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = (by * blocks_x + bx) * cmpr::BLOCK_SIZE;
            for sub in 0..4 {
                let start = block + sub * cmpr::SUBBLOCK_SIZE;
                let texels = cmpr::decode_subblock(&data[start..start + cmpr::SUBBLOCK_SIZE]);
                let sx = bx * 8 + (sub % 2) * 4;
                let sy = by * 8 + (sub / 2) * 4;
                for (k, texel) in texels.iter().enumerate() {
                    match memory_offset(sx + k % 4, sy + k / 4, width, height) {
                        Some(dst) => rgba[dst..dst + 4].copy_from_slice(texel),
                        None => padding.push(*texel),
                    }
                }
            }
        }
    }
}

fn nibble(data: &[u8], index: usize) -> u8 {
    let byte = data[index / 2];
    if index % 2 == 0 { byte >> 4 } else { byte & 0x0F }
}

fn half_word(data: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([data[index * 2], data[index * 2 + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_size() {
        for encoding in [
            TexelEncoding::I4,
            TexelEncoding::Ia4,
            TexelEncoding::I8,
            TexelEncoding::Ia8,
            TexelEncoding::Rgb565,
            TexelEncoding::Rgb5a3,
            TexelEncoding::Rgba32,
            TexelEncoding::Cmpr,
            TexelEncoding::Ci4,
            TexelEncoding::Ci8,
        ] {
            let data = vec![0u8; encoding.encoded_size(12, 6)];
            let rgba = decode_texels(&data, 12, 6, encoding, None).unwrap();
            assert_eq!(rgba.len(), 12 * 6 * 4, "{encoding:?}");
        }
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = decode_texels(&[0u8; 16], 4, 4, TexelEncoding::Rgb565, None).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize { expected: 32, actual: 16, .. }));
    }

    #[test]
    fn test_rows_flipped() {
        // one I8 block: 8 texels wide, 4 rows; disk row n holds value n
        let mut data = vec![0u8; 32];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = (i / 8) as u8;
        }
        let rgba = decode_texels(&data, 8, 4, TexelEncoding::I8, None).unwrap();
        // top memory row is the last disk row
        assert_eq!(rgba[0], 3);
        assert_eq!(rgba[3 * 8 * 4], 0);
    }

    #[test]
    fn test_ia4_channels() {
        let data = vec![0xA5u8; 32];
        let rgba = decode_texels(&data, 8, 4, TexelEncoding::Ia4, None).unwrap();
        assert_eq!(&rgba[0..4], &[0x55, 0x55, 0x55, 0xAA]);
    }

    #[test]
    fn test_rgba32_planes() {
        let mut data = vec![0u8; 64];
        // first texel on disk: A=1 R=2 in the AR plane, G=3 B=4 in the GB plane
        data[0] = 1;
        data[1] = 2;
        data[32] = 3;
        data[33] = 4;
        let rgba = decode_texels(&data, 4, 4, TexelEncoding::Rgba32, None).unwrap();
        // disk (0, 0) lands on the bottom memory row
        let dst = 3 * 4 * 4;
        assert_eq!(&rgba[dst..dst + 4], &[2, 3, 4, 1]);
    }

    #[test]
    fn test_palette_lookup() {
        let palette = [[1, 2, 3, 4], [5, 6, 7, 8]];
        let mut data = vec![0u8; 32];
        data[0] = 0x10;
        let rgba = decode_texels(&data, 8, 8, TexelEncoding::Ci4, Some(&palette)).unwrap();
        let dst = 7 * 8 * 4;
        assert_eq!(&rgba[dst..dst + 4], &[5, 6, 7, 8]);
        assert_eq!(&rgba[dst + 4..dst + 8], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_palette_entries() {
        let data = [0xFC, 0x00, 0x4F, 0xFF];
        let colors = decode_palette(&data, 2, PaletteEncoding::Rgb5a3).unwrap();
        assert_eq!(colors, vec![[0xF8, 0, 0, 0xFF], [0xFF, 0xFF, 0xFF, 0x80]]);
    }
}

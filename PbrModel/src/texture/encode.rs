//! Linear RGBA to tiled texel data.

use super::cmpr;
use super::pixel::{intensity, nearest_index, rgb_to_565, rgba_to_ia8, rgba_to_rgb5a3, to_nibble};
use super::types::{PaletteEncoding, TexelEncoding};
use super::{memory_offset, tiled_positions};
use crate::error::{Error, Result};

/// Encode a top-row-first RGBA8 buffer into tiled texel data.
///
/// Indexed encodings store the index of the nearest `palette` entry.
pub fn encode_texels(
    pixels: &[u8],
    width: usize,
    height: usize,
    encoding: TexelEncoding,
    palette: Option<&[[u8; 4]]>,
) -> Result<Vec<u8>> {
    encode_texels_padded(pixels, &[], width, height, encoding, palette)
}

/// Like [`encode_texels`], filling the padding of partial blocks from
/// `padding` (storage order).
///
/// `padding` is used only when it holds exactly one texel per padding slot.
/// Otherwise padding is transparent black, except for CMPR, which repeats the
/// nearest edge texel so padding never forces the three-color form.
pub fn encode_texels_padded(
    pixels: &[u8],
    padding: &[[u8; 4]],
    width: usize,
    height: usize,
    encoding: TexelEncoding,
    palette: Option<&[[u8; 4]]>,
) -> Result<Vec<u8>> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(Error::InvalidImageSize {
            width: width as u32,
            height: height as u32,
            expected,
            actual: pixels.len(),
        });
    }

    let (bw, bh) = encoding.block_dims();
    let slots = width.div_ceil(bw) * bw * height.div_ceil(bh) * bh - width * height;
    let padding: &[[u8; 4]] = if padding.len() == slots { padding } else { &[] };
    let mut stored = padding.iter().copied();

    let mut out = vec![0u8; encoding.encoded_size(width, height)];
    if encoding == TexelEncoding::Cmpr {
        encode_cmpr(pixels, &mut stored, width, height, &mut out);
        return Ok(out);
    }

    let palette = palette.unwrap_or(&[]);

    for (i, (x, y)) in tiled_positions(width, height, bw, bh).enumerate() {
        let texel = sample(pixels, width, height, x, y)
            .or_else(|| stored.next())
            .unwrap_or([0; 4]);
        match encoding {
            TexelEncoding::I4 => put_nibble(&mut out, i, to_nibble(intensity(texel))),
            TexelEncoding::Ia4 => {
                out[i] = (to_nibble(texel[3]) << 4) | to_nibble(intensity(texel));
            }
            TexelEncoding::I8 => out[i] = intensity(texel),
            TexelEncoding::Ia8 => put_half_word(&mut out, i, rgba_to_ia8(texel)),
            TexelEncoding::Rgb565 => {
                put_half_word(&mut out, i, rgb_to_565(texel[0], texel[1], texel[2]));
            }
            TexelEncoding::Rgb5a3 => put_half_word(&mut out, i, rgba_to_rgb5a3(texel)),
            TexelEncoding::Rgba32 => {
                let base = (i / 16) * 64 + (i % 16) * 2;
                out[base] = texel[3];
                out[base + 1] = texel[0];
                out[base + 32] = texel[1];
                out[base + 33] = texel[2];
            }
            TexelEncoding::Ci4 => put_nibble(&mut out, i, nearest_index(texel, palette) as u8),
            TexelEncoding::Ci8 => out[i] = nearest_index(texel, palette) as u8,
            TexelEncoding::Cmpr => {}
        }
    }

    Ok(out)
}

/// Encode palette entries, two bytes each.
#[must_use]
pub fn encode_palette(colors: &[[u8; 4]], encoding: PaletteEncoding) -> Vec<u8> {
    colors
        .iter()
        .flat_map(|&color| {
            let value = match encoding {
                PaletteEncoding::Ia8 => rgba_to_ia8(color),
                PaletteEncoding::Rgb565 => rgb_to_565(color[0], color[1], color[2]),
                PaletteEncoding::Rgb5a3 => rgba_to_rgb5a3(color),
            };
            value.to_be_bytes()
        })
        .collect()
}

/// Collect the distinct colors of `pixels` in first-occurrence order.
pub fn build_palette(pixels: &[u8], capacity: usize) -> Result<Vec<[u8; 4]>> {
    let mut colors: Vec<[u8; 4]> = Vec::new();
    for chunk in pixels.chunks_exact(4) {
        let color = [chunk[0], chunk[1], chunk[2], chunk[3]];
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    if colors.len() > capacity {
        return Err(Error::PaletteOverflow {
            colors: colors.len(),
            capacity,
        });
    }
    Ok(colors)
}

fn encode_cmpr(
    pixels: &[u8],
    padding: &mut impl Iterator<Item = [u8; 4]>,
    width: usize,
    height: usize,
    out: &mut [u8],
) {
    let blocks_x = width.div_ceil(8);
    let blocks_y = height.div_ceil(8);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = (by * blocks_x + bx) * cmpr::BLOCK_SIZE;
            for sub in 0..4 {
                let sx = bx * 8 + (sub % 2) * 4;
                let sy = by * 8 + (sub / 2) * 4;
                let mut texels = [[0u8; 4]; 16];
                for (k, texel) in texels.iter_mut().enumerate() {
                    let (x, y) = (sx + k % 4, sy + k / 4);
                    *texel = sample(pixels, width, height, x, y)
                        .or_else(|| padding.next())
                        .or_else(|| sample(pixels, width, height, x.min(width - 1), y.min(height - 1)))
                        .unwrap_or([0; 4]);
                }
                let start = block + sub * cmpr::SUBBLOCK_SIZE;
                out[start..start + cmpr::SUBBLOCK_SIZE].copy_from_slice(&cmpr::encode_subblock(&texels));
            }
        }
    }
}

/// Texel at disk position (x, y), or `None` for block padding.
fn sample(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> Option<[u8; 4]> {
    memory_offset(x, y, width, height).map(|i| [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]])
}

fn put_nibble(out: &mut [u8], index: usize, value: u8) {
    let shift = if index % 2 == 0 { 4 } else { 0 };
    out[index / 2] |= (value & 0x0F) << shift;
}

fn put_half_word(out: &mut [u8], index: usize, value: u16) {
    out[index * 2..index * 2 + 2].copy_from_slice(&value.to_be_bytes());
}

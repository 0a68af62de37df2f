//! CMPR block compression.
//!
//! A CMPR block covers 8x8 texels as four 4x4 sub-blocks stored top-left,
//! top-right, bottom-left, bottom-right. Each sub-block is two big-endian
//! RGB565 endpoints followed by sixteen 2-bit indices, one byte per row,
//! leftmost texel in the high bits.

use super::pixel::{rgb_to_565, rgb565_to_rgba};

/// Bytes per 4x4 sub-block.
pub const SUBBLOCK_SIZE: usize = 8;

/// Bytes per 8x8 block.
pub const BLOCK_SIZE: usize = 4 * SUBBLOCK_SIZE;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Linear blend of the color channels, truncating toward zero.
fn interpolate(c0: [u8; 4], c1: [u8; 4], weight: f64) -> [u8; 4] {
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - weight) + b as f64 * weight) as u8;
    [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2]), 0xFF]
}

/// The four colors selectable by a sub-block's indices.
///
/// When `c0 > c1` as packed integers the two derived colors sit at 1/3 and 2/3
/// between the endpoints. Otherwise the third color is the midpoint and the
/// fourth is transparent black.
#[must_use]
pub fn palette(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let color0 = rgb565_to_rgba(c0);
    let color1 = rgb565_to_rgba(c1);
    if c0 > c1 {
        [
            color0,
            color1,
            interpolate(color0, color1, 1.0 / 3.0),
            interpolate(color0, color1, 2.0 / 3.0),
        ]
    } else {
        [color0, color1, interpolate(color0, color1, 0.5), TRANSPARENT]
    }
}

/// Decode one sub-block into row-major texels.
#[must_use]
pub fn decode_subblock(block: &[u8]) -> [[u8; 4]; 16] {
    let c0 = u16::from_be_bytes([block[0], block[1]]);
    let c1 = u16::from_be_bytes([block[2], block[3]]);
    let colors = palette(c0, c1);

    let mut texels = [TRANSPARENT; 16];
    for row in 0..4 {
        let bits = block[4 + row];
        for col in 0..4 {
            let index = (bits >> (6 - 2 * col)) & 0x3;
            texels[row * 4 + col] = colors[index as usize];
        }
    }
    texels
}

/// Encode one sub-block from row-major texels.
///
/// Texels that all come from one sub-block's palette are encoded against
/// that palette, so decoded data re-encodes to the same bytes. Other input
/// falls back to [`approximate_subblock`].
#[must_use]
pub fn encode_subblock(texels: &[[u8; 4]; 16]) -> [u8; SUBBLOCK_SIZE] {
    exact_subblock(texels).unwrap_or_else(|| approximate_subblock(texels))
}

/// Recover the endpoints of a sub-block from its decoded texels.
///
/// Both endpoints must appear among the texels. Of the endpoint pairs whose
/// palette holds every texel, the one spanning the widest color range wins,
/// with the four-color form preferred on a tie.
fn exact_subblock(texels: &[[u8; 4]; 16]) -> Option<[u8; SUBBLOCK_SIZE]> {
    let mut distinct: Vec<[u8; 4]> = Vec::with_capacity(4);
    for texel in texels {
        if !distinct.contains(texel) {
            if distinct.len() == 4 {
                return None;
            }
            distinct.push(*texel);
        }
    }

    let endpoints: Vec<u16> = distinct
        .iter()
        .filter(|c| c[3] == 0xFF)
        .map(|c| rgb_to_565(c[0], c[1], c[2]))
        .filter(|&packed| distinct.contains(&rgb565_to_rgba(packed)))
        .collect();

    let mut best: Option<((u32, bool), u16, u16)> = None;
    for &c0 in &endpoints {
        for &c1 in &endpoints {
            let colors = palette(c0, c1);
            if !distinct.iter().all(|t| colors.contains(t)) {
                continue;
            }
            let score = (distance(colors[0], colors[1]), c0 > c1);
            if best.is_none_or(|(top, _, _)| score > top) {
                best = Some((score, c0, c1));
            }
        }
    }

    let (_, c0, c1) = best?;
    let colors = palette(c0, c1);
    let index_of = |texel: [u8; 4]| colors.iter().position(|c| *c == texel).unwrap_or(0);
    Some(pack(c0, c1, index_of, texels))
}

/// Encode arbitrary texels.
///
/// Endpoints are the two visible texels furthest apart. A sub-block with any
/// texel below half alpha uses the three-color form so those texels can
/// select transparent black.
#[must_use]
pub fn approximate_subblock(texels: &[[u8; 4]; 16]) -> [u8; SUBBLOCK_SIZE] {
    let has_transparency = texels.iter().any(|t| t[3] < 0x80);
    let (a, b) = find_endpoint_colors(texels);

    let (c0, c1) = if has_transparency {
        // c0 <= c1 selects the three-color form
        (a.min(b), a.max(b))
    } else {
        (a.max(b), a.min(b))
    };
    let colors = palette(c0, c1);
    let selectable = if c0 > c1 { &colors[..] } else { &colors[..3] };

    let index_of = |texel: [u8; 4]| {
        if has_transparency && texel[3] < 0x80 {
            3
        } else {
            nearest_rgb(texel, selectable)
        }
    };
    pack(c0, c1, index_of, texels)
}

fn pack(
    c0: u16,
    c1: u16,
    index_of: impl Fn([u8; 4]) -> usize,
    texels: &[[u8; 4]; 16],
) -> [u8; SUBBLOCK_SIZE] {
    let mut out = [0u8; SUBBLOCK_SIZE];
    out[0..2].copy_from_slice(&c0.to_be_bytes());
    out[2..4].copy_from_slice(&c1.to_be_bytes());
    for row in 0..4 {
        let mut bits = 0u8;
        for col in 0..4 {
            bits |= (index_of(texels[row * 4 + col]) as u8 & 0x3) << (6 - 2 * col);
        }
        out[4 + row] = bits;
    }
    out
}

/// Packed endpoints of the two visible texels furthest apart.
fn find_endpoint_colors(texels: &[[u8; 4]; 16]) -> (u16, u16) {
    let visible: Vec<[u8; 4]> = texels.iter().filter(|t| t[3] >= 0x80).copied().collect();
    let mut pair = visible.first().map_or(([0u8; 4], [0u8; 4]), |&a| (a, a));
    let mut widest = 0;
    for (i, &a) in visible.iter().enumerate() {
        for &b in &visible[i + 1..] {
            let d = distance(a, b);
            if d > widest {
                widest = d;
                pair = (a, b);
            }
        }
    }

    let (a, b) = pair;
    (rgb_to_565(a[0], a[1], a[2]), rgb_to_565(b[0], b[1], b[2]))
}

/// Squared RGB distance.
fn distance(a: [u8; 4], b: [u8; 4]) -> u32 {
    (0..3)
        .map(|c| {
            let d = i32::from(a[c]) - i32::from(b[c]);
            (d * d) as u32
        })
        .sum()
}

fn nearest_rgb(texel: [u8; 4], colors: &[[u8; 4]]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (i, &color) in colors.iter().enumerate() {
        let dist = distance(texel, color);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_break_four_color() {
        // red > blue as packed integers
        let colors = palette(0xF800, 0x001F);
        assert_eq!(colors[0], [0xF8, 0, 0, 0xFF]);
        assert_eq!(colors[1], [0, 0, 0xF8, 0xFF]);
        assert_eq!(colors[2], [165, 0, 82, 0xFF]);
        assert_eq!(colors[3], [82, 0, 165, 0xFF]);
    }

    #[test]
    fn test_tie_break_three_color() {
        let colors = palette(0x001F, 0xF800);
        assert_eq!(colors[2], [124, 0, 124, 0xFF]);
        assert_eq!(colors[3], [0, 0, 0, 0]);

        // equal endpoints also select the three-color form
        let colors = palette(0x1234, 0x1234);
        assert_eq!(colors[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_index_order() {
        // row 0 selects 0,1,2,3 left to right; other rows select color 1
        let block = [0xF8, 0x00, 0x00, 0x1F, 0b00_01_10_11, 0x55, 0x55, 0x55];
        let texels = decode_subblock(&block);
        let colors = palette(0xF800, 0x001F);
        assert_eq!(&texels[0..4], &colors[..]);
        assert!(texels[4..].iter().all(|&t| t == colors[1]));
    }

    #[test]
    fn test_encode_solid_block() {
        let texels = [[0xF8, 0, 0, 0xFF]; 16];
        let encoded = encode_subblock(&texels);
        let decoded = decode_subblock(&encoded);
        assert!(decoded.iter().all(|&t| t == [0xF8, 0, 0, 0xFF]));
    }

    #[test]
    fn test_encode_transparency() {
        let mut texels = [[0xFF, 0xFF, 0xFF, 0xFF]; 16];
        texels[5] = [0, 0, 0, 0];
        let encoded = encode_subblock(&texels);
        let c0 = u16::from_be_bytes([encoded[0], encoded[1]]);
        let c1 = u16::from_be_bytes([encoded[2], encoded[3]]);
        assert!(c0 <= c1);
        let decoded = decode_subblock(&encoded);
        assert_eq!(decoded[5], [0, 0, 0, 0]);
        assert_eq!(decoded[0], [0xF8, 0xFC, 0xF8, 0xFF]);
    }

    /// Sub-blocks in one mode whose bytes are fully determined by their
    /// texels: both endpoints are referenced, the four palette entries
    /// differ, and the opposite endpoint order cannot produce the same texels.
    fn recoverable_blocks(four_color: bool) -> Vec<[u8; SUBBLOCK_SIZE]> {
        let mut state = 0x2545_F491_u32;
        let mut next = move || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 8) as u16
        };

        let mut blocks = Vec::new();
        for _ in 0..512 {
            let (a, b) = (next(), next());
            if a == b {
                continue;
            }
            let (c0, c1) = if four_color { (a.max(b), a.min(b)) } else { (a.min(b), a.max(b)) };
            let mut block = [0u8; SUBBLOCK_SIZE];
            block[0..2].copy_from_slice(&c0.to_be_bytes());
            block[2..4].copy_from_slice(&c1.to_be_bytes());
            for byte in &mut block[4..] {
                *byte = next() as u8;
            }

            let texels = decode_subblock(&block);
            let colors = palette(c0, c1);
            let distinct = (0..4).all(|i| (i + 1..4).all(|j| colors[i] != colors[j]));
            let swapped = palette(c1, c0);
            if distinct
                && texels.contains(&colors[0])
                && texels.contains(&colors[1])
                && !texels.iter().all(|t| swapped.contains(t))
            {
                blocks.push(block);
            }
        }
        blocks
    }

    #[test]
    fn test_decoded_blocks_reencode_exactly() {
        for four_color in [true, false] {
            let blocks = recoverable_blocks(four_color);
            assert!(blocks.len() > 100, "only {} blocks generated", blocks.len());
            for block in blocks {
                assert_eq!(encode_subblock(&decode_subblock(&block)), block, "{block:02x?}");
            }
        }
    }

    #[test]
    fn test_red_blue_block_keeps_endpoints() {
        let block = [0xF8, 0x00, 0x00, 0x1F, 0x1B, 0x1B, 0x1B, 0x1B];
        assert_eq!(encode_subblock(&decode_subblock(&block)), block);
    }

    #[test]
    fn test_approximate_uses_widest_pair() {
        let mut texels = [[0x80, 0x80, 0x80, 0xFF]; 16];
        texels[0] = [0xF8, 0, 0, 0xFF];
        texels[15] = [0, 0, 0xF8, 0xFF];
        let decoded = decode_subblock(&approximate_subblock(&texels));
        assert_eq!(decoded[0], [0xF8, 0, 0, 0xFF]);
        assert_eq!(decoded[15], [0, 0, 0xF8, 0xFF]);
    }
}

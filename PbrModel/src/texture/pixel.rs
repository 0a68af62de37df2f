//! Per-texel packing for 16-bit color formats.

/// Unpack an RGB565 value. Alpha is opaque.
#[must_use]
pub fn rgb565_to_rgba(value: u16) -> [u8; 4] {
    let [hi, lo] = value.to_be_bytes();
    let r = hi & 0xF8;
    let g = ((hi & 0x07) << 5) | ((lo & 0xE0) >> 3);
    let b = (lo & 0x1F) << 3;
    [r, g, b, 0xFF]
}

/// Pack RGB into 5-6-5, dropping low bits.
#[must_use]
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    (r5 << 11) | (g6 << 5) | b5
}

/// Unpack an RGB5A3 value.
///
/// With the top bit set the texel is opaque 5-5-5; otherwise it is 4-4-4 color
/// with a 3-bit alpha.
#[must_use]
pub fn rgb5a3_to_rgba(value: u16) -> [u8; 4] {
    let [hi, lo] = value.to_be_bytes();
    if hi & 0x80 == 0 {
        let r = (hi & 0x0F) * 0x11;
        let g = ((lo & 0xF0) >> 4) * 0x11;
        let b = (lo & 0x0F) * 0x11;
        let a = (hi & 0x70) << 1;
        [r, g, b, a]
    } else {
        let r = (hi & 0x7C) << 1;
        let g = ((hi & 0x03) << 6) | ((lo & 0xE0) >> 2);
        let b = (lo & 0x1F) << 3;
        [r, g, b, 0xFF]
    }
}

/// Pack RGBA into RGB5A3. Only fully opaque texels use the 5-5-5 form.
#[must_use]
pub fn rgba_to_rgb5a3(rgba: [u8; 4]) -> u16 {
    let [r, g, b, a] = rgba.map(u16::from);
    if a == 0xFF {
        0x8000 | ((r >> 3) << 10) | ((g >> 3) << 5) | (b >> 3)
    } else {
        ((a >> 5) << 12) | ((r / 0x11) << 8) | ((g / 0x11) << 4) | (b / 0x11)
    }
}

/// Unpack an IA8 value: alpha in the high byte, intensity in the low byte.
#[must_use]
pub fn ia8_to_rgba(value: u16) -> [u8; 4] {
    let [a, i] = value.to_be_bytes();
    [i, i, i, a]
}

/// Pack RGBA into IA8.
#[must_use]
pub fn rgba_to_ia8(rgba: [u8; 4]) -> u16 {
    u16::from_be_bytes([rgba[3], intensity(rgba)])
}

/// Mean of the color channels.
#[must_use]
pub fn intensity(rgba: [u8; 4]) -> u8 {
    ((rgba[0] as u16 + rgba[1] as u16 + rgba[2] as u16) / 3) as u8
}

/// Reduce an 8-bit channel to 4 bits, rounding to nearest.
#[must_use]
pub fn to_nibble(value: u8) -> u8 {
    ((value as u16 * 15 + 127) / 255) as u8
}

/// Index of the palette entry closest to `pixel` (squared RGBA distance).
#[must_use]
pub fn nearest_index(pixel: [u8; 4], palette: &[[u8; 4]]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;

    for (i, color) in palette.iter().enumerate() {
        let dist: u32 = (0..4)
            .map(|c| {
                let d = pixel[c] as i32 - color[c] as i32;
                (d * d) as u32
            })
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
            if dist == 0 {
                break;
            }
        }
    }

    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_565() {
        assert_eq!(rgb_to_565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb_to_565(0, 0, 0), 0x0000);
        assert_eq!(rgb_to_565(255, 0, 0), 0xF800); // Red
        assert_eq!(rgb_to_565(0, 255, 0), 0x07E0); // Green
        assert_eq!(rgb_to_565(0, 0, 255), 0x001F); // Blue
    }

    #[test]
    fn test_rgb565_unpack() {
        assert_eq!(rgb565_to_rgba(0xF800), [0xF8, 0, 0, 0xFF]);
        assert_eq!(rgb565_to_rgba(0x07E0), [0, 0xFC, 0, 0xFF]);
        assert_eq!(rgb565_to_rgba(0x001F), [0, 0, 0xF8, 0xFF]);
    }

    #[test]
    fn test_rgb5a3_modes() {
        assert_eq!(rgb5a3_to_rgba(0xFC00), [0xF8, 0, 0, 0xFF]);
        // 50% white: alpha 4 of 7, color 0xFFF
        assert_eq!(rgb5a3_to_rgba(0x4FFF), [0xFF, 0xFF, 0xFF, 0x80]);
        assert_eq!(rgba_to_rgb5a3([0xFF, 0xFF, 0xFF, 0x80]), 0x4FFF);
        assert_eq!(rgba_to_rgb5a3([0xF8, 0, 0, 0xFF]), 0xFC00);
    }

    #[test]
    fn test_rgb5a3_pack_is_inverse() {
        for value in 0..=u16::MAX {
            assert_eq!(rgba_to_rgb5a3(rgb5a3_to_rgba(value)), value);
        }
    }

    #[test]
    fn test_ia8() {
        assert_eq!(ia8_to_rgba(0x80FF), [0xFF, 0xFF, 0xFF, 0x80]);
        assert_eq!(rgba_to_ia8([0x40, 0x40, 0x40, 0x10]), 0x1040);
    }

    #[test]
    fn test_nibble_rounding() {
        for n in 0..16u8 {
            assert_eq!(to_nibble(n * 0x11), n);
        }
    }
}

//! Fixed-point quantization of keyframe values.
//!
//! Values are stored as signed integers scaled by `2^exponent`. The encoder
//! picks the largest exponent (at most [`MAX_EXPONENT`]) that keeps every
//! scaled value inside the integer range.

/// Upper bound on the scale exponent.
pub const MAX_EXPONENT: i8 = 14;

/// Choose the scale exponent for `values` stored in `bits`-bit signed slots.
///
/// Returns the largest `e <= 14` with `max(|v|) * 2^e < 2^(bits - 1)`, or 0
/// when every value is zero.
#[must_use]
pub fn choose_exponent(values: &[f32], bits: u32) -> i8 {
    let max = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return 0;
    }

    let limit = f64::from(1u32 << (bits - 1));
    let max = f64::from(max);
    let mut exponent = MAX_EXPONENT;
    while exponent > i8::MIN && max * 2f64.powi(i32::from(exponent)) >= limit {
        exponent -= 1;
    }
    exponent
}

/// Whether `exponent` keeps every value in range.
#[must_use]
pub fn exponent_fits(values: &[f32], bits: u32, exponent: i8) -> bool {
    let limit = f64::from(1u32 << (bits - 1));
    let scale = 2f64.powi(i32::from(exponent));
    exponent <= MAX_EXPONENT && values.iter().all(|v| f64::from(v.abs()) * scale < limit)
}

/// Scale and round a value to a 16-bit fixed-point slot.
#[must_use]
pub fn quantize16(value: f32, exponent: i8) -> i16 {
    let scaled = (f64::from(value) * 2f64.powi(i32::from(exponent))).round();
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Scale and round a value to an 8-bit fixed-point slot.
#[must_use]
pub fn quantize8(value: f32, exponent: i8) -> i8 {
    let scaled = (f64::from(value) * 2f64.powi(i32::from(exponent))).round();
    scaled.clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8
}

/// Recover a value from its fixed-point slot.
#[must_use]
pub fn dequantize(raw: i32, exponent: i8) -> f32 {
    (f64::from(raw) / 2f64.powi(i32::from(exponent))) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponent_is_maximal() {
        let values = [1.5f32, -0.25, 3.0];
        let e = choose_exponent(&values, 16);
        assert_eq!(e, 13);
        // 3.0 * 2^13 = 24576 fits, 3.0 * 2^14 = 49152 does not
        assert!(exponent_fits(&values, 16, e));
        assert!(!exponent_fits(&values, 16, e + 1));
    }

    #[test]
    fn test_exponent_capped_and_zero() {
        assert_eq!(choose_exponent(&[0.001], 16), MAX_EXPONENT);
        assert_eq!(choose_exponent(&[0.0, -0.0], 16), 0);
        assert_eq!(choose_exponent(&[], 16), 0);
    }

    #[test]
    fn test_large_values_use_negative_exponent() {
        let e = choose_exponent(&[100_000.0], 16);
        assert_eq!(e, -2);
        assert_eq!(quantize16(100_000.0, e), 25_000);
        assert_eq!(dequantize(25_000, e), 100_000.0);
    }

    #[test]
    fn test_round_trip_error_bounded() {
        let values = [0.1f32, 0.7, -1.3, 2.9];
        let e = choose_exponent(&values, 16);
        let step = 1.0 / 2f32.powi(i32::from(e));
        for v in values {
            let back = dequantize(i32::from(quantize16(v, e)), e);
            assert!((back - v).abs() <= step / 2.0 + f32::EPSILON);
        }
    }

    #[test]
    fn test_eight_bit_range() {
        let e = choose_exponent(&[1.0], 8);
        // 1.0 * 2^6 = 64 < 128, 1.0 * 2^7 = 128 does not fit
        assert_eq!(e, 6);
        assert_eq!(quantize8(1.0, e), 64);
    }
}

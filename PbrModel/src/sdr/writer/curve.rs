//! Animation curve layout.
//!
//! Curves whose values are stored as vectors or quaternions are written back
//! as plain floats; every other format keeps its storage.

use indexmap::IndexMap;

use super::{SerializeContext, count_u16};
use crate::animation::quantize::{choose_exponent, dequantize, quantize8, quantize16};
use crate::animation::{FCurve, Interpolation, Keyframe, MIN_DURATION, ValueFormat, hermite};
use crate::binary::align_up;
use crate::error::Result;
use crate::sdr::constants::{
    CD_AXIS, CD_COMPONENT, CD_EXPONENT, CD_FORMAT, CD_KEYS, CH_ACTION, CH_COUNT, CH_DESCRIPTORS,
    CH_LENGTH, CH_NEXT, CURVE_HEADER_SIZE, DESCRIPTOR_SIZE, FR_INTERPOLATION, FR_LEFT_HANDLE,
    FR_RIGHT_HANDLE, FR_TIME, FR_VALUE, FRAME_SIZE, KB_END_TIME, KB_FRAME_COUNT, KB_FRAMES,
    KB_HANDLE_COUNT, KB_HANDLES, KB_SENTINEL, KB_VALUE_COUNT, KB_VALUES, KEY_BLOCK_SENTINEL,
    KEY_BLOCK_SIZE,
};

/// One per-action chain entry: action index, track length, curves.
pub(super) type ChainTrack<'c> = (usize, f32, &'c [FCurve]);

/// A stored value, compared bit-exactly for sharing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StoredValue {
    Float(u32),
    Fixed8(i8),
    Fixed16(i16),
}

impl SerializeContext<'_> {
    /// Write one curve header per track, chained by their `next` pointers.
    ///
    /// Returns the address of the first header, or `None` for no tracks.
    pub(super) fn write_curve_chain(&mut self, tracks: &[ChainTrack<'_>]) -> Result<Option<usize>> {
        let mut first = None;
        let mut previous: Option<usize> = None;

        for &(action, length, curves) in tracks {
            let header = self.allocate(CURVE_HEADER_SIZE, 4);
            match previous {
                Some(previous) => self.out.write_ptr(previous, CH_NEXT, header),
                None => first = Some(header),
            }
            previous = Some(header);

            self.out.write_field(header, CH_ACTION, count_u16(action, "actions")?);
            self.out.write_field(header, CH_COUNT, count_u16(curves.len(), "curves")?);
            // zero-length clips stall the game
            self.out.write_field(header, CH_LENGTH, length.max(MIN_DURATION));

            if curves.is_empty() {
                continue;
            }
            let descriptors = self.allocate(curves.len() * DESCRIPTOR_SIZE, 4);
            self.out.write_ptr(header, CH_DESCRIPTORS, descriptors);
            for (k, curve) in curves.iter().enumerate() {
                self.write_curve(descriptors + k * DESCRIPTOR_SIZE, curve)?;
            }
        }

        Ok(first)
    }

    fn write_curve(&mut self, descriptor: usize, curve: &FCurve) -> Result<()> {
        let format = match curve.format {
            ValueFormat::Vec3 | ValueFormat::Quaternion => ValueFormat::Float,
            other => other,
        };

        let keyframes = sorted_keyframes(&curve.keyframes);
        let values: Vec<f32> = keyframes.iter().map(|k| k.value).collect();

        // the stored exponent is ignored, values always get the finest scale
        let exponent = match format {
            ValueFormat::Fixed8 => choose_exponent(&values, 8),
            ValueFormat::Fixed16 => choose_exponent(&values, 16),
            _ => 0,
        };

        self.out.write_field(descriptor, CD_COMPONENT, curve.component.code());
        self.out.write_field(descriptor, CD_AXIS, curve.axis.saturating_add(1));
        self.out.write_field(descriptor, CD_FORMAT, format.code());
        self.out.write_field(descriptor, CD_EXPONENT, exponent);

        if keyframes.is_empty() {
            return Ok(());
        }
        let frame_count = count_u16(keyframes.len(), "keyframes")?;

        let block = self.allocate(KEY_BLOCK_SIZE, 4);
        self.out.write_ptr(descriptor, CD_KEYS, block);

        // values, shared between keyframes that store the same bits
        let mut table: IndexMap<StoredValue, u16> = IndexMap::new();
        let mut value_indices = Vec::with_capacity(keyframes.len());
        let mut decoded = Vec::with_capacity(keyframes.len());
        for &value in &values {
            let (stored, back) = match format {
                ValueFormat::Fixed8 => {
                    let q = quantize8(value, exponent);
                    (StoredValue::Fixed8(q), dequantize(i32::from(q), exponent))
                }
                ValueFormat::Fixed16 => {
                    let q = quantize16(value, exponent);
                    (StoredValue::Fixed16(q), dequantize(i32::from(q), exponent))
                }
                _ => (StoredValue::Float(value.to_bits()), value),
            };
            let next = table.len() as u16;
            value_indices.push(*table.entry(stored).or_insert(next));
            decoded.push(back);
        }

        let values_at = self.allocate(table.len() * format.stride(), 4);
        for (i, stored) in table.keys().enumerate() {
            match *stored {
                StoredValue::Float(bits) => self.out.write_field(values_at, i * 4, f32::from_bits(bits)),
                StoredValue::Fixed8(q) => self.out.write_field(values_at, i, q),
                StoredValue::Fixed16(q) => self.out.write_field(values_at, i * 2, q),
            }
        }
        self.cursor = align_up(self.cursor, 4);
        self.out.reserve_to(self.cursor);

        // left and right handles for every keyframe once any segment is Hermite
        let hermite = keyframes.iter().any(|k| k.interpolation == Interpolation::Hermite);
        let handles_at = if hermite {
            let at = self.allocate(keyframes.len() * 8, 4);
            for i in 0..decoded.len() {
                let left = i
                    .checked_sub(1)
                    .map_or(0.0, |p| hermite::handle_toward(decoded[i], decoded[p]));
                let right = decoded
                    .get(i + 1)
                    .map_or(0.0, |&n| hermite::handle_toward(decoded[i], n));
                self.out.write_field(at, i * 8, left);
                self.out.write_field(at, i * 8 + 4, right);
            }
            Some(at)
        } else {
            None
        };

        let frames = self.allocate(keyframes.len() * FRAME_SIZE, 4);
        for (i, keyframe) in keyframes.iter().enumerate() {
            let entry = frames + i * FRAME_SIZE;
            self.out.write_field(entry, FR_INTERPOLATION, keyframe.interpolation.code());
            self.out.write_field(entry, FR_VALUE, value_indices[i]);
            if hermite {
                self.out.write_field(entry, FR_LEFT_HANDLE, (i * 2) as u16);
                self.out.write_field(entry, FR_RIGHT_HANDLE, (i * 2 + 1) as u16);
            }
            self.out.write_field(entry, FR_TIME, keyframe.time);
        }

        self.out.write_ptr(block, KB_VALUES, values_at);
        if let Some(at) = handles_at {
            self.out.write_ptr(block, KB_HANDLES, at);
            self.out.write_field(block, KB_HANDLE_COUNT, count_u16(keyframes.len() * 2, "handles")?);
        }
        self.out.write_field(block, KB_VALUE_COUNT, table.len() as u16);
        self.out.write_field(block, KB_END_TIME, keyframes.last().map_or(0.0, |k| k.time));
        self.out.write_ptr(block, KB_FRAMES, frames);
        self.out.write_field(block, KB_FRAME_COUNT, frame_count);
        self.out.write_field(block, KB_SENTINEL, KEY_BLOCK_SENTINEL);

        Ok(())
    }
}

/// Keyframes in time order, one per distinct time. Of several keyframes at
/// the same time the one listed last wins.
fn sorted_keyframes(keyframes: &[Keyframe]) -> Vec<Keyframe> {
    let mut sorted = keyframes.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut unique: Vec<Keyframe> = Vec::with_capacity(sorted.len());
    for keyframe in sorted {
        match unique.last_mut() {
            Some(last) if last.time == keyframe.time => {
                tracing::debug!("dropping duplicate keyframe at {}", keyframe.time);
                *last = keyframe;
            }
            _ => unique.push(keyframe),
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_times_keep_last() {
        let keyframes = [
            Keyframe::new(1.0, 5.0, Interpolation::Linear),
            Keyframe::new(0.0, 1.0, Interpolation::Linear),
            Keyframe::new(1.0, 7.0, Interpolation::Constant),
        ];
        let sorted = sorted_keyframes(&keyframes);
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].value, 1.0);
        assert_eq!(sorted[1].value, 7.0);
        assert_eq!(sorted[1].interpolation, Interpolation::Constant);
    }
}

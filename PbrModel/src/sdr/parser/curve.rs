//! Animation curve parsing.

use std::collections::HashSet;

use super::ParseContext;
use crate::animation::quantize::dequantize;
use crate::animation::{CurveComponent, FCurve, Interpolation, Keyframe, ValueFormat, hermite};
use crate::error::{Error, Result, Warning};
use crate::sdr::constants::{
    CD_AXIS, CD_COMPONENT, CD_EXPONENT, CD_FORMAT, CD_KEYS, CH_ACTION, CH_COUNT, CH_DESCRIPTORS,
    CH_LENGTH, CH_NEXT, DESCRIPTOR_SIZE, FR_INTERPOLATION, FR_LEFT_HANDLE, FR_RIGHT_HANDLE,
    FR_TIME, FR_VALUE, FRAME_SIZE, KB_FRAME_COUNT, KB_FRAMES, KB_HANDLE_COUNT, KB_HANDLES,
    KB_VALUE_COUNT, KB_VALUES,
};

/// One per-action entry of a curve chain: action index, length, curves.
pub(super) type ChainEntry = (usize, f32, Vec<FCurve>);

/// A frame as stored, before slopes are resolved.
struct RawFrame {
    keyframe: Keyframe,
    handles: Option<(f32, f32)>,
}

impl ParseContext<'_> {
    /// Walk a chain of per-action curve headers.
    ///
    /// Stops at a null `next` pointer or after `limit` entries.
    pub(super) fn read_curve_chain(&mut self, first: usize, limit: Option<usize>) -> Result<Vec<ChainEntry>> {
        let mut entries = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first);

        while let Some(header) = next {
            if limit.is_some_and(|limit| entries.len() >= limit) {
                break;
            }
            if !visited.insert(header) {
                tracing::debug!("curve chain loops back to {header:#x}");
                break;
            }

            let action: u16 = self.reader.read_field(header, CH_ACTION)?;
            let count: u16 = self.reader.read_field(header, CH_COUNT)?;
            let length: f32 = self.reader.read_field(header, CH_LENGTH)?;
            let descriptors = self.reader.read_ptr(header, CH_DESCRIPTORS)?;
            next = self.reader.read_ptr(header, CH_NEXT)?;

            let curves = match descriptors {
                Some(list) => (0..usize::from(count))
                    .map(|i| self.read_curve(list + i * DESCRIPTOR_SIZE))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            entries.push((usize::from(action), length, curves));
        }

        Ok(entries)
    }

    fn read_curve(&mut self, descriptor: usize) -> Result<FCurve> {
        let component_code: u8 = self.reader.read_field(descriptor, CD_COMPONENT)?;
        let component = CurveComponent::from_code(component_code).ok_or(Error::UnknownCurveFormat {
            address: descriptor + CD_COMPONENT,
            code: component_code,
        })?;
        let axis = self.reader.read_field::<u8>(descriptor, CD_AXIS)?.saturating_sub(1);
        let format_code: u8 = self.reader.read_field(descriptor, CD_FORMAT)?;
        let format = ValueFormat::from_code(format_code).ok_or(Error::UnknownCurveFormat {
            address: descriptor + CD_FORMAT,
            code: format_code,
        })?;
        let exponent: i8 = self.reader.read_field(descriptor, CD_EXPONENT)?;

        let keyframes = match self.reader.read_ptr(descriptor, CD_KEYS)? {
            Some(block) => self.read_keyframes(block, format, axis, exponent)?,
            None => Vec::new(),
        };

        Ok(FCurve {
            component,
            axis,
            format,
            exponent: format.is_fixed().then_some(exponent),
            keyframes,
        })
    }

    fn read_keyframes(&mut self, block: usize, format: ValueFormat, axis: u8, exponent: i8) -> Result<Vec<Keyframe>> {
        let value_count: u16 = self.reader.read_field(block, KB_VALUE_COUNT)?;
        let handle_count: u16 = self.reader.read_field(block, KB_HANDLE_COUNT)?;
        let frame_count: u16 = self.reader.read_field(block, KB_FRAME_COUNT)?;

        let values = match self.reader.read_ptr(block, KB_VALUES)? {
            Some(table) => (0..usize::from(value_count))
                .map(|i| self.read_value(table, i, format, axis, exponent))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let handles: Vec<f32> = match self.reader.read_ptr(block, KB_HANDLES)? {
            Some(table) => (0..usize::from(handle_count))
                .map(|i| self.reader.read_field(table, i * 4))
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };

        let Some(frames) = self.reader.read_ptr(block, KB_FRAMES)? else {
            return Ok(Vec::new());
        };

        let mut raw = Vec::with_capacity(usize::from(frame_count));
        for i in 0..usize::from(frame_count) {
            let entry = frames + i * FRAME_SIZE;
            let code: u16 = self.reader.read_field(entry, FR_INTERPOLATION)?;
            let interpolation = Interpolation::from_code(code).ok_or(Error::UnknownInterpolation {
                address: entry,
                code,
            })?;
            let value_index: u16 = self.reader.read_field(entry, FR_VALUE)?;
            let value = *values.get(usize::from(value_index)).ok_or(Error::DanglingReference {
                kind: "keyframe value",
                address: entry + FR_VALUE,
                target: usize::from(value_index),
            })?;
            let time: f32 = self.reader.read_field(entry, FR_TIME)?;

            // only Hermite frames carry handle indices; others hold 0xFFFF
            let handles = if interpolation == Interpolation::Hermite && !handles.is_empty() {
                let left = self.read_handle(&handles, entry, FR_LEFT_HANDLE)?;
                let right = self.read_handle(&handles, entry, FR_RIGHT_HANDLE)?;
                Some((left, right))
            } else {
                None
            };

            raw.push(RawFrame {
                keyframe: Keyframe::new(time, value, interpolation),
                handles,
            });
        }

        raw.sort_by(|a, b| a.keyframe.time.total_cmp(&b.keyframe.time));
        let mut deduped: Vec<RawFrame> = Vec::with_capacity(raw.len());
        for frame in raw {
            match deduped.last_mut() {
                Some(last) if last.keyframe.time == frame.keyframe.time => {
                    self.warn(Warning::DuplicateKeyframeTime {
                        address: block,
                        time: frame.keyframe.time,
                    });
                    *last = frame;
                }
                _ => deduped.push(frame),
            }
        }

        Ok(resolve_slopes(&deduped))
    }

    fn read_value(&mut self, table: usize, index: usize, format: ValueFormat, axis: u8, exponent: i8) -> Result<f32> {
        let component = usize::from(axis);
        match format {
            ValueFormat::Float => self.reader.read_field(table, index * 4),
            ValueFormat::Vec3 => self.reader.read_field(table, index * 12 + component.min(2) * 4),
            ValueFormat::Quaternion => self.reader.read_field(table, index * 16 + component.min(3) * 4),
            ValueFormat::Fixed8 => {
                let raw: i8 = self.reader.read_field(table, index)?;
                Ok(dequantize(i32::from(raw), exponent))
            }
            ValueFormat::Fixed16 => {
                let raw: i16 = self.reader.read_field(table, index * 2)?;
                Ok(dequantize(i32::from(raw), exponent))
            }
        }
    }

    fn read_handle(&mut self, handles: &[f32], entry: usize, field: usize) -> Result<f32> {
        let index: u16 = self.reader.read_field(entry, field)?;
        handles.get(usize::from(index)).copied().ok_or(Error::DanglingReference {
            kind: "keyframe handle",
            address: entry + field,
            target: usize::from(index),
        })
    }
}

/// Turn stored handles into slopes using the time to each neighbour.
fn resolve_slopes(frames: &[RawFrame]) -> Vec<Keyframe> {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let mut keyframe = frame.keyframe;
            if let Some((left, right)) = frame.handles {
                if let Some(prev) = i.checked_sub(1).and_then(|p| frames.get(p)) {
                    keyframe.in_slope = hermite::handle_to_slope(left, prev.keyframe.time - keyframe.time);
                }
                if let Some(next) = frames.get(i + 1) {
                    keyframe.out_slope = hermite::handle_to_slope(right, next.keyframe.time - keyframe.time);
                }
            }
            keyframe
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{BinaryReader, BinaryWriter};

    const BLOCK: usize = 0x10;
    const VALUES: usize = 0x40;
    const HANDLES: usize = 0x50;
    const FRAMES: usize = 0x60;

    fn write_frame(out: &mut BinaryWriter, index: usize, code: u16, value: u16, handles: [u16; 2], time: f32) {
        let entry = FRAMES + index * FRAME_SIZE;
        out.write_field(entry, FR_INTERPOLATION, code);
        out.write_field(entry, FR_VALUE, value);
        out.write_field(entry, FR_LEFT_HANDLE, handles[0]);
        out.write_field(entry, FR_RIGHT_HANDLE, handles[1]);
        out.write_field(entry, FR_TIME, time);
    }

    #[test]
    fn test_linear_frame_ignores_handle_indices() {
        let mut out = BinaryWriter::new();
        out.write_ptr(BLOCK, KB_VALUES, VALUES);
        out.write_ptr(BLOCK, KB_HANDLES, HANDLES);
        out.write_field(BLOCK, KB_VALUE_COUNT, 2u16);
        out.write_field(BLOCK, KB_HANDLE_COUNT, 2u16);
        out.write_ptr(BLOCK, KB_FRAMES, FRAMES);
        out.write_field(BLOCK, KB_FRAME_COUNT, 2u16);
        out.write_at(VALUES, 0.0f32);
        out.write_next(6.0f32);
        out.write_at(HANDLES, -18.0f32);
        out.write_next(0.0f32);
        write_frame(&mut out, 0, Interpolation::Linear.code(), 0, [0xFFFF, 0xFFFF], 0.0);
        write_frame(&mut out, 1, Interpolation::Hermite.code(), 1, [0, 1], 1.0);

        let bytes = out.into_inner();
        let mut ctx = ParseContext::new(BinaryReader::new(&bytes));
        let keyframes = ctx.read_keyframes(BLOCK, ValueFormat::Float, 0, 0).unwrap();

        assert_eq!(keyframes.len(), 2);
        assert_eq!(keyframes[0].interpolation, Interpolation::Linear);
        assert_eq!(keyframes[0].out_slope, 0.0);
        assert_eq!(keyframes[1].value, 6.0);
        assert_eq!(keyframes[1].in_slope, 6.0);
        assert!(ctx.warnings.is_empty());
    }
}

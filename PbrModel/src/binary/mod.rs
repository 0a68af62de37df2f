//! Big-endian random-access binary I/O.
//!
//! [`BinaryReader`] and [`BinaryWriter`] are the only types in the crate that
//! touch raw model bytes. Every other module addresses data through
//! `(type, address)` pairs.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use byteorder::{BigEndian, ByteOrder};

/// Reference point for an address passed to a reader or writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whence {
    /// Address is absolute from the start of the buffer.
    #[default]
    Start,
    /// Address is relative to the current position.
    Current,
}

/// A fixed-size value stored big-endian on disk.
///
/// `decode` and `encode` are always handed slices of exactly `SIZE` bytes.
pub trait Primitive: Copy + Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode one value from `buf`.
    fn decode(buf: &[u8]) -> Self;

    /// Encode `self` into `buf`.
    fn encode(self, buf: &mut [u8]);
}

impl Primitive for u8 {
    const SIZE: usize = 1;

    fn decode(buf: &[u8]) -> Self {
        buf[0]
    }

    fn encode(self, buf: &mut [u8]) {
        buf[0] = self;
    }
}

impl Primitive for i8 {
    const SIZE: usize = 1;

    fn decode(buf: &[u8]) -> Self {
        buf[0] as i8
    }

    fn encode(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }
}

macro_rules! impl_primitive {
    ($ty:ty, $size:expr, $read:ident, $write:ident) => {
        impl Primitive for $ty {
            const SIZE: usize = $size;

            fn decode(buf: &[u8]) -> Self {
                BigEndian::$read(buf)
            }

            fn encode(self, buf: &mut [u8]) {
                BigEndian::$write(buf, self);
            }
        }
    };
}

impl_primitive!(u16, 2, read_u16, write_u16);
impl_primitive!(i16, 2, read_i16, write_i16);
impl_primitive!(u32, 4, read_u32, write_u32);
impl_primitive!(i32, 4, read_i32, write_i32);
impl_primitive!(f32, 4, read_f32, write_f32);

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[must_use]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(0x41, 0x20), 0x60);
        assert_eq!(align_up(0x60, 0x20), 0x60);
    }
}

//! Bounds-checked big-endian reader over an in-memory model file.

use super::{Primitive, Whence};
use crate::error::{Error, Result};

/// Random-access reader over a borrowed byte buffer.
///
/// Reads never panic: any access past the end of the buffer yields
/// [`Error::OutOfBounds`] carrying the offending address.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current position.
    #[must_use]
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Move to `address` relative to `whence`.
    ///
    /// Seeking to exactly the end of the buffer is allowed.
    pub fn seek(&mut self, address: usize, whence: Whence) -> Result<()> {
        let target = self.resolve(address, 0, whence);
        if target > self.data.len() {
            return Err(self.out_of_bounds(target, 0));
        }
        self.pos = target;
        Ok(())
    }

    /// Read a `T` at `base + offset` relative to `whence`, leaving the
    /// position just past the value.
    pub fn read<T: Primitive>(&mut self, base: usize, offset: usize, whence: Whence) -> Result<T> {
        let address = self.resolve(base, offset, whence);
        let bytes = self.slice(address, T::SIZE)?;
        self.pos = address + T::SIZE;
        Ok(T::decode(bytes))
    }

    /// Read a `T` at an absolute address.
    pub fn read_at<T: Primitive>(&mut self, address: usize) -> Result<T> {
        self.read(address, 0, Whence::Start)
    }

    /// Read a `T` at `base + offset`.
    pub fn read_field<T: Primitive>(&mut self, base: usize, offset: usize) -> Result<T> {
        self.read(base, offset, Whence::Start)
    }

    /// Read a `T` at the current position.
    pub fn read_next<T: Primitive>(&mut self) -> Result<T> {
        self.read(0, 0, Whence::Current)
    }

    /// Read a pointer field, returning `None` for a null pointer.
    pub fn read_ptr(&mut self, base: usize, offset: usize) -> Result<Option<usize>> {
        let value: u32 = self.read_field(base, offset)?;
        Ok((value != 0).then_some(value as usize))
    }

    /// Read three consecutive floats.
    pub fn read_vec3(&mut self, address: usize) -> Result<[f32; 3]> {
        let x = self.read_at(address)?;
        let y = self.read_next()?;
        let z = self.read_next()?;
        Ok([x, y, z])
    }

    /// Read a null-terminated string starting at `address`.
    pub fn read_string(&mut self, address: usize) -> Result<String> {
        let tail = self.data.get(address..).ok_or_else(|| self.out_of_bounds(address, 1))?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.out_of_bounds(address, tail.len() + 1))?;
        self.pos = address + end + 1;
        String::from_utf8(tail[..end].to_vec()).map_err(|_| Error::InvalidString { address })
    }

    /// Read a string stored in a fixed-width field, trimmed at the first NUL.
    pub fn read_fixed_string(&mut self, address: usize, len: usize) -> Result<String> {
        let bytes = self.read_chunk(address, len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8(bytes[..end].to_vec()).map_err(|_| Error::InvalidString { address })
    }

    /// Borrow `size` bytes starting at `address`.
    pub fn read_chunk(&mut self, address: usize, size: usize) -> Result<&'a [u8]> {
        let bytes = self.slice(address, size)?;
        self.pos = address + size;
        Ok(bytes)
    }

    fn resolve(&self, base: usize, offset: usize, whence: Whence) -> usize {
        match whence {
            Whence::Start => base.wrapping_add(offset),
            Whence::Current => self.pos.wrapping_add(base).wrapping_add(offset),
        }
    }

    fn slice(&self, address: usize, size: usize) -> Result<&'a [u8]> {
        address
            .checked_add(size)
            .and_then(|end| self.data.get(address..end))
            .ok_or_else(|| self.out_of_bounds(address, size))
    }

    fn out_of_bounds(&self, address: usize, size: usize) -> Error {
        Error::OutOfBounds {
            address,
            size,
            len: self.data.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x3F, 0x80, 0x00, 0x00, 0xFF];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_at::<u16>(0).unwrap(), 0x1234);
        assert_eq!(reader.read_next::<u16>().unwrap(), 0x5678);
        assert_eq!(reader.read_next::<f32>().unwrap(), 1.0);
        assert_eq!(reader.read_next::<i8>().unwrap(), -1);
        assert_eq!(reader.tell(), 9);
    }

    #[test]
    fn test_current_relative_read() {
        let data = [0, 1, 2, 3, 4, 5];
        let mut reader = BinaryReader::new(&data);
        reader.seek(1, Whence::Start).unwrap();
        assert_eq!(reader.read::<u8>(2, 0, Whence::Current).unwrap(), 3);
        assert_eq!(reader.read::<u8>(0, 1, Whence::Current).unwrap(), 5);
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);
        let err = reader.read_at::<u32>(2).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { address: 2, size: 4, len: 4 }));
        assert!(reader.seek(5, Whence::Start).is_err());
        assert!(reader.seek(4, Whence::Start).is_ok());
    }

    #[test]
    fn test_strings() {
        let data = b"root\0\0\0\0abc\0";
        let mut reader = BinaryReader::new(data);
        assert_eq!(reader.read_string(0).unwrap(), "root");
        assert_eq!(reader.read_fixed_string(8, 4).unwrap(), "abc");
        assert!(reader.read_string(12).is_err());
    }

    #[test]
    fn test_null_pointer() {
        let data = [0, 0, 0, 0, 0, 0, 0, 0x30];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_ptr(0, 0).unwrap(), None);
        assert_eq!(reader.read_ptr(0, 4).unwrap(), Some(0x30));
    }
}

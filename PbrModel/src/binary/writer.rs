//! Auto-extending big-endian writer used to lay out a model file.

use super::{Primitive, Whence, align_up};

/// Random-access writer over an owned, growing byte buffer.
///
/// Writing past the current end zero-fills the gap, so tables can be emitted
/// out of order and pointer fields back-patched once their targets are known.
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    data: Vec<u8>,
    pos: usize,
}

impl BinaryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the buffer written so far.
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

    /// Move to `address` relative to `whence`. Seeking never fails.
    pub fn seek(&mut self, address: usize, whence: Whence) {
        self.pos = self.resolve(address, 0, whence);
    }

    /// Write `value` at `base + offset` relative to `whence`, leaving the
    /// position just past the value.
    pub fn write<T: Primitive>(&mut self, value: T, base: usize, offset: usize, whence: Whence) {
        let address = self.resolve(base, offset, whence);
        self.reserve_to(address + T::SIZE);
        value.encode(&mut self.data[address..address + T::SIZE]);
        self.pos = address + T::SIZE;
    }

    /// Write `value` at an absolute address.
    pub fn write_at<T: Primitive>(&mut self, address: usize, value: T) {
        self.write(value, address, 0, Whence::Start);
    }

    /// Write `value` at `base + offset`.
    pub fn write_field<T: Primitive>(&mut self, base: usize, offset: usize, value: T) {
        self.write(value, base, offset, Whence::Start);
    }

    /// Write `value` at the current position.
    pub fn write_next<T: Primitive>(&mut self, value: T) {
        self.write(value, 0, 0, Whence::Current);
    }

    /// Write a 32-bit absolute pointer into the field at `base + offset`.
    pub fn write_ptr(&mut self, base: usize, offset: usize, target: usize) {
        self.write_field(base, offset, target as u32);
    }

    /// Write three consecutive floats.
    pub fn write_vec3(&mut self, address: usize, value: [f32; 3]) {
        self.write_at(address, value[0]);
        self.write_next(value[1]);
        self.write_next(value[2]);
    }

    /// Copy raw bytes to `address`.
    pub fn write_chunk(&mut self, address: usize, bytes: &[u8]) {
        let end = address + bytes.len();
        self.reserve_to(end);
        self.data[address..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Write a null-terminated string at `address`.
    ///
    /// Returns the number of bytes the string occupies once padded so the
    /// following field starts on a 4-byte boundary.
    pub fn write_string(&mut self, address: usize, value: &str) -> usize {
        let size = align_up(value.len() + 1, 4);
        self.write_chunk(address, value.as_bytes());
        self.reserve_to(address + size);
        self.pos = address + size;
        size
    }

    /// Grow the buffer with zeros so that it is at least `end` bytes long.
    pub fn reserve_to(&mut self, end: usize) {
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
    }

    /// Borrow the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer, returning its buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn resolve(&self, base: usize, offset: usize, whence: Whence) -> usize {
        match whence {
            Whence::Start => base + offset,
            Whence::Current => self.pos + base + offset,
        }
    }
}

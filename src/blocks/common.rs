// blocks/common.rs
//! Byte-level access shared by every section codec.
//!
//! This module provides:
//! - [`ByteReader`]: a position-tracked reader over a byte slice
//! - [`ByteWriter`]: an appending writer producing the same encodings
//! - Helpers for block padding and fixed-width text fields
//!
//! All multi-byte values honor the file's [`Processor`]: Intel and DEC files
//! are little-endian, MIPS files are big-endian, and DEC files store floats
//! in the DEC F-floating format.

use super::BLOCK_SIZE;
use crate::{Error, Result, types::Processor};

// ============================================================================
// Float Encoding Helpers
// ============================================================================

/// Convert the 4 stored bytes of a DEC F-floating value to an `f32`.
///
/// DEC keeps the sign/exponent word first; swapping the 16-bit halves gives an
/// IEEE bit pattern whose value is 4 times too large (bias 128 and an implicit
/// `0.1` mantissa instead of `1.`).
#[inline]
pub fn dec_to_f32(bytes: [u8; 4]) -> f32 {
    let raw = u32::from_le_bytes(bytes);
    if raw == 0 {
        return 0.0;
    }
    f32::from_bits(raw.rotate_left(16)) / 4.0
}

/// Inverse of [`dec_to_f32`].
#[inline]
pub fn f32_to_dec(value: f32) -> [u8; 4] {
    if value == 0.0 {
        return [0; 4];
    }
    (value * 4.0).to_bits().rotate_left(16).to_le_bytes()
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Number of zero bytes needed to reach the next 512-byte block boundary.
#[inline]
pub const fn padding_to_block(size: usize) -> usize {
    (BLOCK_SIZE - (size % BLOCK_SIZE)) % BLOCK_SIZE
}

/// Number of 512-byte blocks needed to hold `size` bytes.
#[inline]
pub const fn blocks_for(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}

/// Byte offset of a 1-based block number.
#[inline]
pub fn block_offset(block: usize) -> usize {
    block.saturating_sub(1) * BLOCK_SIZE
}

/// Decode a fixed-width text field, dropping trailing spaces and NULs.
pub fn trim_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

// ============================================================================
// Reader
// ============================================================================

/// Sequential reader over a byte slice.
///
/// Every read advances the position; a read that would run past the end
/// returns [`Error::TruncatedInput`] and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    processor: Processor,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8], processor: Processor) -> Self {
        Self {
            bytes,
            pos: 0,
            processor,
        }
    }

    /// Create a reader positioned at `offset`.
    pub fn at(bytes: &'a [u8], offset: usize, processor: Processor) -> Self {
        Self {
            bytes,
            pos: offset,
            processor,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub fn processor(&self) -> Processor {
        self.processor
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed: len,
                available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take_array::<2>()?;
        Ok(if self.processor.is_big_endian() {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take_array::<4>()?;
        Ok(if self.processor.is_big_endian() {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.take_array::<4>()?;
        Ok(match self.processor {
            Processor::Intel => f32::from_le_bytes(b),
            Processor::Mips => f32::from_be_bytes(b),
            Processor::Dec => dec_to_f32(b),
        })
    }

    /// Read a fixed-width text field, trimming trailing padding.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        Ok(trim_text(self.take(len)?))
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Appending writer producing the encodings [`ByteReader`] understands.
#[derive(Debug, Clone)]
pub struct ByteWriter {
    buffer: Vec<u8>,
    processor: Processor,
}

impl ByteWriter {
    pub fn new(processor: Processor) -> Self {
        Self::with_capacity(processor, 0)
    }

    pub fn with_capacity(processor: Processor, capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            processor,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        let b = if self.processor.is_big_endian() {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buffer.extend_from_slice(&b);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub fn write_u32(&mut self, value: u32) {
        let b = if self.processor.is_big_endian() {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buffer.extend_from_slice(&b);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_f32(&mut self, value: f32) {
        let b = match self.processor {
            Processor::Intel => value.to_le_bytes(),
            Processor::Mips => value.to_be_bytes(),
            Processor::Dec => f32_to_dec(value),
        };
        self.buffer.extend_from_slice(&b);
    }

    /// Write `text` into a field of exactly `len` bytes, space padded and
    /// truncated if longer.
    pub fn write_padded_str(&mut self, text: &str, len: usize) {
        let bytes = text.as_bytes();
        let copy_len = core::cmp::min(bytes.len(), len);
        self.buffer.extend_from_slice(&bytes[..copy_len]);
        self.buffer.resize(self.buffer.len() + (len - copy_len), b' ');
    }

    /// Zero-fill up to the next 512-byte block boundary.
    pub fn pad_to_block(&mut self) {
        let padding = padding_to_block(self.buffer.len());
        self.buffer.resize(self.buffer.len() + padding, 0);
    }

    /// Overwrite bytes previously written at `offset`.
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset + bytes.len();
        if end > self.buffer.len() {
            return Err(Error::Serialization(format!(
                "patch at {offset}..{end} past end of buffer ({})",
                self.buffer.len()
            )));
        }
        self.buffer[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

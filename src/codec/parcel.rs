//! Parcel encoding.
//!
//! Every primitive is a 4-byte little-endian word:
//! ```text
//! ┌──────────┬──────────┬──────────┬─────
//! │ field 0  │ field 1  │ field 2  │ ...
//! │ 4 bytes  │ 4 bytes  │ 4 bytes  │
//! └──────────┴──────────┴──────────┴─────
//! ```
//!
//! Strings are UTF-16: an int32 unit count, the units, a NUL unit, then zero
//! padding to the next 4-byte boundary. A count of -1 is the null string.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::DecodeError;

/// Width of every primitive slot.
pub const WORD_SIZE: usize = 4;

/// Round `len` up to the word boundary.
#[inline]
fn pad(len: usize) -> usize {
    (len + WORD_SIZE - 1) & !(WORD_SIZE - 1)
}

/// Write side of a parcel.
#[derive(Debug, Default, Clone)]
pub struct Parcel {
    buf: BytesMut,
}

impl Parcel {
    /// Create an empty parcel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty parcel with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_u32_le(value.to_bits());
    }

    /// Booleans travel as int32 0/1.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    /// Write a UTF-16 string.
    pub fn write_string16(&mut self, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_i32(units.len() as i32);
        let start = self.buf.len();
        for unit in &units {
            self.buf.put_u16_le(*unit);
        }
        self.buf.put_u16_le(0);
        let written = self.buf.len() - start;
        self.buf.put_bytes(0, pad(written) - written);
    }

    /// Write the identity token that opens every request.
    #[inline]
    pub fn write_interface_token(&mut self, descriptor: &str) {
        self.write_string16(descriptor);
    }

    /// Number of bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the encoded bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finish writing and hand out the bytes (zero-copy).
    #[inline]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Read side of a parcel. Tracks a cursor into borrowed bytes.
#[derive(Debug, Clone)]
pub struct ParcelReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ParcelReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume `n` bytes, or fail without moving the cursor.
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::NotEnoughData {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_word(&mut self) -> Result<[u8; WORD_SIZE], DecodeError> {
        let bytes = self.take(WORD_SIZE)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.take_word().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take_word().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.read_u32().map(f32::from_bits)
    }

    /// Any non-zero int32 reads as true.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_i32().map(|v| v != 0)
    }

    /// Read a UTF-16 string as raw code units. `None` is the null string.
    pub fn read_string16_units(&mut self) -> Result<Option<Vec<u16>>, DecodeError> {
        let len = self.read_i32()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            return Err(DecodeError::BadString(len));
        }
        let body = (len as usize + 1) * 2;
        let bytes = self.take(pad(body))?;
        let units = bytes[..len as usize * 2]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Some(units))
    }

    /// Read a UTF-16 string, replacing invalid sequences.
    pub fn read_string16(&mut self) -> Result<Option<String>, DecodeError> {
        Ok(self
            .read_string16_units()?
            .map(|units| String::from_utf16_lossy(&units)))
    }
}

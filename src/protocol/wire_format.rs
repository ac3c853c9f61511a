//! Socket frame header encoding and decoding.
//!
//! Implements the 17-byte header carried in front of each parcel on the
//! Unix socket binding:
//! ```text
//! ┌──────────┬───────┬──────────┬──────────┬──────────┐
//! │ Code     │ Flags │ Req ID   │ Status   │ Length   │
//! │ 4 bytes  │ 1 byte│ 4 bytes  │ 4 bytes  │ 4 bytes  │
//! │ uint32 BE│       │ uint32 BE│ int32 BE │ uint32 BE│
//! └──────────┴───────┴──────────┴──────────┴──────────┘
//! ```
//!
//! All header integers are Big Endian. The payload is a parcel and keeps its
//! own little-endian layout.

use crate::error::{HwcError, Result};

use super::Status;

/// Header size in bytes (fixed, exactly 17).
pub const HEADER_SIZE: usize = 17;

/// Default maximum payload size (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 1_048_576;

/// Flag constants for the frame header.
pub mod flags {
    /// Frame is a reply (1) or a request (0).
    pub const IS_REPLY: u8 = 0b0000_0001;

    /// Reserved bits mask (bits 1-7).
    pub const RESERVED_MASK: u8 = 0b1111_1110;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Transaction code (opcode).
    pub code: u32,
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Correlates a reply with its request.
    pub request_id: u32,
    /// Transport status (replies only, 0 on requests).
    pub status: i32,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl Header {
    /// Header for a request frame.
    pub fn request(code: u32, request_id: u32, payload_length: u32) -> Self {
        Self {
            code,
            flags: 0,
            request_id,
            status: Status::OK.code(),
            payload_length,
        }
    }

    /// Header for a reply frame.
    pub fn reply(code: u32, request_id: u32, status: Status, payload_length: u32) -> Self {
        Self {
            code,
            flags: flags::IS_REPLY,
            request_id,
            status: status.code(),
            payload_length,
        }
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use hwc_service::protocol::Header;
    ///
    /// let header = Header::request(1016, 42, 100);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 17);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (17 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..4].copy_from_slice(&self.code.to_be_bytes());
        buf[4] = self.flags;
        buf[5..9].copy_from_slice(&self.request_id.to_be_bytes());
        buf[9..13].copy_from_slice(&self.status.to_be_bytes());
        buf[13..17].copy_from_slice(&self.payload_length.to_be_bytes());
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            code: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            flags: buf[4],
            request_id: u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
            status: i32::from_be_bytes([buf[9], buf[10], buf[11], buf[12]]),
            payload_length: u32::from_be_bytes([buf[13], buf[14], buf[15], buf[16]]),
        })
    }

    /// Validate the header for protocol compliance.
    ///
    /// Checks:
    /// - Payload length doesn't exceed max
    /// - Reserved flag bits are 0
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.payload_length > max_payload_size {
            return Err(HwcError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                self.payload_length, max_payload_size
            )));
        }

        if self.flags & flags::RESERVED_MASK != 0 {
            return Err(HwcError::Protocol(
                "Reserved flag bits must be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if this is a reply.
    #[inline]
    pub fn is_reply(&self) -> bool {
        flags::has_flag(self.flags, flags::IS_REPLY)
    }

    /// Transport status carried by the header.
    #[inline]
    pub fn status(&self) -> Status {
        Status(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = Header::reply(1002, 42, Status::NOT_ENOUGH_DATA, 100);
        let encoded = original.encode();
        let decoded = Header::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_header_big_endian_byte_order() {
        let header = Header {
            code: 0x0102_0304,
            flags: 0x01,
            request_id: 0x0506_0708,
            status: -1,
            payload_length: 0x0A0B_0C0D,
        };
        let bytes = header.encode();

        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(bytes[4], 0x01);
        assert_eq!(&bytes[5..9], &[0x05, 0x06, 0x07, 0x08]);
        assert_eq!(&bytes[9..13], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[13..17], &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        let buf = [0u8; HEADER_SIZE - 1];
        assert!(Header::decode(&buf).is_none());
    }

    #[test]
    fn test_validate_payload_too_large() {
        let header = Header::request(1, 1, 1_000_000);
        let result = header.validate(100);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_reserved_bits_must_be_zero() {
        let mut header = Header::request(1, 1, 0);
        header.flags = 0b1000_0000;
        let result = header.validate(DEFAULT_MAX_PAYLOAD_SIZE);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Reserved flag bits"));
    }

    #[test]
    fn test_request_and_reply_flags() {
        let request = Header::request(7, 3, 0);
        assert!(!request.is_reply());
        assert_eq!(request.status(), Status::OK);

        let reply = Header::reply(7, 3, Status::UNKNOWN_TRANSACTION, 0);
        assert!(reply.is_reply());
        assert_eq!(reply.status(), Status::UNKNOWN_TRANSACTION);
        assert!(reply.validate(DEFAULT_MAX_PAYLOAD_SIZE).is_ok());
    }
}

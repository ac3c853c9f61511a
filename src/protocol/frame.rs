//! Frame struct with typed accessors.
//!
//! A frame is one header plus its parcel payload. The payload is a
//! `bytes::Bytes` so it can be handed to the dispatcher without copying.

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE};
use super::Status;

/// A complete socket frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Parcel bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.header.code
    }

    #[inline]
    pub fn request_id(&self) -> u32 {
        self.header.request_id
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.header.status()
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.header.is_reply()
    }
}

/// Build a complete frame as a single byte vector.
///
/// The header's `payload_length` is taken from `payload`.
///
/// # Example
///
/// ```
/// use hwc_service::protocol::{build_frame, Header, HEADER_SIZE};
///
/// let bytes = build_frame(&Header::request(2, 1, 0), &[4, 0, 0, 0]);
/// assert_eq!(bytes.len(), HEADER_SIZE + 4);
/// ```
pub fn build_frame(header: &Header, payload: &[u8]) -> Vec<u8> {
    let header = Header {
        payload_length: payload.len() as u32,
        ..*header
    };
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_accessors() {
        let header = Header::reply(15, 42, Status::OK, 4);
        let frame = Frame::new(header, Bytes::from_static(&[0, 0, 0, 0]));

        assert_eq!(frame.code(), 15);
        assert_eq!(frame.request_id(), 42);
        assert_eq!(frame.status(), Status::OK);
        assert!(frame.is_reply());
        assert_eq!(frame.payload().len(), 4);
    }

    #[test]
    fn test_build_frame_sets_length() {
        let bytes = build_frame(&Header::request(1, 9, 0), b"abcd");
        let parsed = Header::decode(&bytes[..HEADER_SIZE]).unwrap();
        assert_eq!(parsed.payload_length, 4);
        assert_eq!(&bytes[HEADER_SIZE..], b"abcd");
    }

    #[test]
    fn test_build_frame_roundtrip() {
        use super::super::FrameBuffer;

        let bytes = build_frame(&Header::request(1016, 456, 0), b"0123456789ab");

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.code(), 1016);
        assert_eq!(frame.request_id(), 456);
        assert_eq!(frame.payload(), b"0123456789ab");
        assert!(!frame.is_reply());
    }
}

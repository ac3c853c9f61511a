//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 17 bytes
//! - `WaitingForPayload`: Header parsed, need N more payload bytes

use bytes::{Bytes, BytesMut};

use super::wire_format::{Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
use super::Frame;
use crate::error::Result;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for complete header.
    WaitingForHeader,
    /// Header parsed, waiting for payload bytes.
    WaitingForPayload { header: Header, remaining: u32 },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 16KB, max payload: 1MiB.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(16 * 1024),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// If data is fragmented, partial data is buffered internally for the
    /// next push.
    ///
    /// # Errors
    ///
    /// Returns error if a header is invalid (payload too large, reserved
    /// flag bits set). The connection cannot be resynchronised after that.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::WaitingForHeader => {
                let header = match Header::decode(&self.buffer) {
                    Some(header) => header,
                    None => return Ok(None),
                };
                header.validate(self.max_payload_size)?;

                let _ = self.buffer.split_to(HEADER_SIZE);

                if header.payload_length == 0 {
                    return Ok(Some(Frame::new(header, Bytes::new())));
                }

                self.state = State::WaitingForPayload {
                    header,
                    remaining: header.payload_length,
                };

                self.try_extract_one()
            }

            State::WaitingForPayload { header, remaining } => {
                let remaining = *remaining as usize;

                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(remaining).freeze();
                let header = *header;

                self.state = State::WaitingForHeader;

                Ok(Some(Frame::new(header, payload)))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

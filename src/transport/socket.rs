//! Blocking Unix socket client binding.
//!
//! Each [`transact`](Transport::transact) writes one request frame and reads
//! frames until the reply with the same request id arrives. The stream is
//! held for the whole round trip, so at most one request per connection is
//! in flight.
//!
//! A failure part-way through an exchange leaves the stream at an unknown
//! offset. The transport is then marked dead and every later call fails with
//! [`Status::DEAD_OBJECT`] without touching the stream.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use super::Transport;
use crate::error::{HwcError, Result};
use crate::protocol::{build_frame, Frame, Header, Status, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};

/// Client side of the socket binding.
#[derive(Debug)]
pub struct SocketTransport {
    stream: Mutex<UnixStream>,
    next_request_id: AtomicU32,
    max_payload_size: u32,
    broken: AtomicBool,
}

impl SocketTransport {
    /// Connect to a service socket.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "connected");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: UnixStream) -> Self {
        Self {
            stream: Mutex::new(stream),
            next_request_id: AtomicU32::new(1),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            broken: AtomicBool::new(false),
        }
    }

    /// Set the largest reply payload accepted.
    pub fn with_max_payload(mut self, max_payload_size: u32) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// Set a read timeout for replies. `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.lock()?.set_read_timeout(timeout)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, UnixStream>> {
        self.stream
            .lock()
            .map_err(|_| HwcError::Protocol("socket lock poisoned".to_string()))
    }

    /// Send one request and wait for its reply frame.
    pub fn round_trip(&self, code: u32, data: &[u8]) -> Result<Frame> {
        if data.len() > self.max_payload_size as usize {
            return Err(HwcError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                data.len(),
                self.max_payload_size
            )));
        }

        if self.is_broken() {
            return Err(HwcError::ConnectionClosed);
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut stream = self.lock()?;

        let result = exchange(&mut *stream, code, request_id, data, self.max_payload_size);
        if let Err(e) = &result {
            warn!(code, request_id, error = %e, "connection unusable");
            self.broken.store(true, Ordering::Release);
        }
        result
    }

    /// Whether an earlier failure left the stream out of sync.
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

fn exchange<S: Read + Write>(
    stream: &mut S,
    code: u32,
    request_id: u32,
    data: &[u8],
    max_payload_size: u32,
) -> Result<Frame> {
    stream.write_all(&build_frame(&Header::request(code, request_id, 0), data))?;
    stream.flush()?;

    loop {
        let frame = read_frame(stream, max_payload_size)?;
        if !frame.is_reply() {
            return Err(HwcError::Protocol(format!(
                "expected reply, got request for code {}",
                frame.code()
            )));
        }
        if frame.request_id() == request_id {
            return Ok(frame);
        }
        // A reply to an earlier request that timed out.
        warn!(
            expected = request_id,
            got = frame.request_id(),
            "discarding stale reply"
        );
    }
}

fn read_frame<R: Read>(reader: &mut R, max_payload_size: u32) -> Result<Frame> {
    let mut header = [0u8; HEADER_SIZE];
    read_exact(reader, &mut header)?;

    let header = Header::decode(&header)
        .ok_or_else(|| HwcError::Protocol("short frame header".to_string()))?;
    header.validate(max_payload_size)?;

    let mut payload = vec![0u8; header.payload_length as usize];
    read_exact(reader, &mut payload)?;

    Ok(Frame::new(header, Bytes::from(payload)))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => HwcError::ConnectionClosed,
        _ => HwcError::Io(e),
    })
}

impl Transport for SocketTransport {
    fn transact(&self, code: u32, data: Bytes) -> std::result::Result<Bytes, Status> {
        let frame = self.round_trip(code, &data).map_err(|e| e.status())?;
        if frame.status().is_ok() {
            Ok(frame.payload)
        } else {
            Err(frame.status())
        }
    }
}

//! Per-connection writer task for reply frames.
//!
//! Request tasks finish in any order; their replies are funneled through an
//! mpsc channel into a single task that owns the write half of the socket.
//!
//! ```text
//! Request task 1 ─┐
//! Request task 2 ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Socket
//! Request task N ─┘
//! ```
//!
//! Frames queued but not yet written are counted. Once the count reaches
//! `max_pending_frames`, senders wait (up to `backpressure_timeout`) for the
//! writer to drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::{HwcError, Result};
use crate::protocol::{Header, Status, HEADER_SIZE};

/// Default maximum pending frames before backpressure kicks in.
pub const DEFAULT_MAX_PENDING_FRAMES: usize = 1024;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default backpressure timeout.
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum frames coalesced into one write.
const MAX_BATCH_SIZE: usize = 64;

/// A frame ready to be written to the socket.
#[derive(Debug)]
pub struct OutboundFrame {
    pub header: [u8; HEADER_SIZE],
    pub payload: Bytes,
}

impl OutboundFrame {
    /// Reply frame for `request_id` carrying `status` and `payload`.
    pub fn reply(code: u32, request_id: u32, status: Status, payload: Bytes) -> Self {
        let header = Header::reply(code, request_id, status, payload.len() as u32);
        Self {
            header: header.encode(),
            payload,
        }
    }

    /// Reply frame with a status and no body.
    pub fn status_only(code: u32, request_id: u32, status: Status) -> Self {
        Self::reply(code, request_id, status, Bytes::new())
    }

    /// Total size of this frame (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub max_pending_frames: usize,
    pub channel_capacity: usize,
    pub backpressure_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
        }
    }
}

/// Pending-frame accounting shared by handles and the writer task.
#[derive(Debug)]
struct Pending {
    count: AtomicUsize,
    drained: Notify,
}

impl Pending {
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    #[inline]
    fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn release(&self, n: usize) {
        self.count.fetch_sub(n, Ordering::AcqRel);
        self.drained.notify_waiters();
    }
}

/// Handle for queueing frames on the writer task.
///
/// Cheap to clone; one clone per in-flight request.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
    pending: Arc<Pending>,
    max_pending: usize,
    timeout: Duration,
}

impl WriterHandle {
    /// Queue a frame, waiting while backpressure is active.
    ///
    /// # Errors
    ///
    /// - [`HwcError::BackpressureTimeout`] if the queue did not drain in time
    /// - [`HwcError::ConnectionClosed`] if the writer task has exited
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        if self.is_backpressure_active() {
            tokio::time::timeout(self.timeout, self.wait_for_drain())
                .await
                .map_err(|_| HwcError::BackpressureTimeout)?;
        }

        self.pending.count.fetch_add(1, Ordering::AcqRel);
        self.tx.send(frame).await.map_err(|_| {
            self.pending.release(1);
            HwcError::ConnectionClosed
        })
    }

    async fn wait_for_drain(&self) {
        loop {
            let drained = self.pending.drained.notified();
            if !self.is_backpressure_active() {
                return;
            }
            drained.await;
        }
    }

    /// Queue a frame without waiting.
    ///
    /// Returns `Err(BackpressureTimeout)` immediately if at capacity.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<()> {
        if self.is_backpressure_active() {
            return Err(HwcError::BackpressureTimeout);
        }

        self.pending.count.fetch_add(1, Ordering::AcqRel);
        self.tx.try_send(frame).map_err(|e| {
            self.pending.release(1);
            match e {
                mpsc::error::TrySendError::Full(_) => HwcError::BackpressureTimeout,
                mpsc::error::TrySendError::Closed(_) => HwcError::ConnectionClosed,
            }
        })
    }

    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.pending.get() >= self.max_pending
    }

    /// Frames queued but not yet written.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.get()
    }
}

/// Spawn the writer task and return a handle for queueing frames.
///
/// The task exits cleanly once every handle is dropped, or with an error if
/// a write fails.
pub fn spawn_writer_task<W>(writer: W, config: WriterConfig) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let pending = Arc::new(Pending::new());

    let handle = WriterHandle {
        tx,
        pending: pending.clone(),
        max_pending: config.max_pending_frames.max(1),
        timeout: config.backpressure_timeout,
    };

    let task = tokio::spawn(writer_loop(rx, writer, pending));

    (handle, task)
}

async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    pending: Arc<Pending>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
    let mut out = BytesMut::new();

    while let Some(first) = rx.recv().await {
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        encode_batch(&batch, &mut out);
        let written = batch.len();
        batch.clear();

        let result = write_out(&mut writer, &out).await;
        pending.release(written);
        result?;
        trace!(frames = written, "flushed replies");
    }

    Ok(())
}

/// Concatenate a batch into one contiguous buffer.
fn encode_batch(batch: &[OutboundFrame], out: &mut BytesMut) {
    out.clear();
    out.reserve(batch.iter().map(OutboundFrame::size).sum());
    for frame in batch {
        out.extend_from_slice(&frame.header);
        out.extend_from_slice(&frame.payload);
    }
}

async fn write_out<W>(writer: &mut W, out: &BytesMut) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&out[..]).await?;
    writer.flush().await?;
    Ok(())
}

//! Socket server builder and runtime loop.
//!
//! The [`ServerBuilder`] provides a fluent API for configuring the server.
//! The [`Server`] manages the lifecycle:
//! 1. Bind the Unix socket
//! 2. Accept connections
//! 3. Per connection, read frames and run each request through the
//!    [`Dispatcher`] on a blocking worker
//! 4. Send replies through the connection's writer task
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hwc_service::{HwcService, Server};
//!
//! struct Display;
//! impl HwcService for Display {}
//!
//! #[tokio::main]
//! async fn main() -> hwc_service::error::Result<()> {
//!     let server = Server::builder()
//!         .socket_path("/tmp/hwc-service.sock")
//!         .max_concurrent_requests(8)
//!         .bind(Arc::new(Display))
//!         .await?;
//!
//!     server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::UnixStream;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::dispatch::Dispatcher;
use crate::error::{HwcError, Result};
use crate::protocol::{Frame, FrameBuffer, OpcodeTable, Status};
use crate::service::HwcService;
use crate::transport::SocketListener;
use crate::writer::{spawn_writer_task, OutboundFrame, WriterConfig, WriterHandle};

/// Read buffer size per connection.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Builder for configuring and binding a [`Server`].
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServiceConfig,
}

impl ServerBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.socket_path = path.into();
        self
    }

    /// Identity token requests must carry.
    pub fn descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.config.descriptor = descriptor.into();
        self
    }

    /// Set the number of requests dispatched at once.
    ///
    /// Requests beyond the limit are answered with `WOULD_BLOCK`.
    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.config.max_concurrent_requests = limit;
        self
    }

    /// Set the largest frame payload accepted.
    ///
    /// A connection sending a larger frame is closed.
    pub fn max_payload_size(mut self, bytes: u32) -> Self {
        self.config.max_payload_size = bytes;
        self
    }

    /// Set the unwritten replies per connection before senders wait.
    pub fn max_pending_frames(mut self, limit: usize) -> Self {
        self.config.max_pending_frames = limit;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    pub fn backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.config.backpressure_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Bind the socket and build the server around `service`.
    pub async fn bind(self, service: Arc<dyn HwcService>) -> Result<Server> {
        let table = Arc::new(OpcodeTable::with_descriptor(self.config.descriptor.clone()));
        let dispatcher = Arc::new(Dispatcher::with_table(table, service));
        let listener = SocketListener::bind(&self.config.socket_path).await?;

        info!(
            path = %listener.path().display(),
            descriptor = %self.config.descriptor,
            "service bound"
        );

        Ok(Server {
            listener,
            shared: Arc::new(Shared {
                dispatcher,
                permits: Arc::new(Semaphore::new(self.config.max_concurrent_requests)),
                writer_config: self.config.writer_config(),
                max_payload_size: self.config.max_payload_size,
            }),
        })
    }
}

/// State shared by all connections.
struct Shared {
    dispatcher: Arc<Dispatcher>,
    permits: Arc<Semaphore>,
    writer_config: WriterConfig,
    max_payload_size: u32,
}

/// A bound socket server.
pub struct Server {
    listener: SocketListener,
    shared: Arc<Shared>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Socket path the server is bound to.
    pub fn path(&self) -> &Path {
        self.listener.path()
    }

    /// Dispatcher shared by all connections.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.shared.dispatcher
    }

    /// Accept connections until an accept fails.
    pub async fn run(self) -> Result<()> {
        let next_id = AtomicU64::new(1);
        loop {
            let stream = self.listener.accept().await?;
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            debug!(conn = id, "connection accepted");

            let shared = self.shared.clone();
            tokio::spawn(async move {
                match serve_connection(stream, shared).await {
                    Ok(()) => debug!(conn = id, "connection closed"),
                    Err(e) => warn!(conn = id, error = %e, "connection dropped"),
                }
            });
        }
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("shutting down");
                Ok(())
            }
        }
    }
}

/// Read loop for one connection.
///
/// A reply that cannot be queued closes the connection, so a client waiting
/// on it sees the peer go away instead of blocking forever.
async fn serve_connection(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
    let (reader, write_half) = stream.into_split();
    let (writer, writer_task) = spawn_writer_task(write_half, shared.writer_config.clone());
    let lost_reply = Arc::new(Notify::new());

    let read_result = read_requests(reader, &shared, &writer, &lost_reply).await;

    drop(writer);
    if read_result.is_err() {
        writer_task.abort();
    }
    // Otherwise in-flight requests hold their own handles and still get replies.
    match writer_task.await {
        Ok(Err(e)) => warn!(error = %e, "reply writer failed"),
        Err(e) if e.is_panic() => error!("reply writer panicked: {}", e),
        _ => {}
    }

    read_result
}

async fn read_requests<R>(
    mut reader: R,
    shared: &Arc<Shared>,
    writer: &WriterHandle,
    lost_reply: &Arc<Notify>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::with_max_payload(shared.max_payload_size);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            read = reader.read(&mut buf) => read?,
            _ = lost_reply.notified() => return Err(HwcError::BackpressureTimeout),
        };
        if n == 0 {
            return Ok(());
        }
        for frame in frame_buffer.push(&buf[..n])? {
            handle_frame(frame, shared, writer, lost_reply);
        }
    }
}

/// Start one request, or answer `WOULD_BLOCK` when at capacity.
fn handle_frame(frame: Frame, shared: &Arc<Shared>, writer: &WriterHandle, lost_reply: &Arc<Notify>) {
    if frame.is_reply() {
        warn!(code = frame.code(), "unexpected reply frame from client");
        return;
    }

    let code = frame.code();
    let request_id = frame.request_id();

    let permit = match shared.permits.clone().try_acquire_owned() {
        Ok(p) => p,
        Err(_) => {
            warn!(code, request_id, "request capacity reached");
            let busy = OutboundFrame::status_only(code, request_id, Status::WOULD_BLOCK);
            if let Err(e) = writer.try_send(busy) {
                warn!(code, request_id, error = %e, "failed to queue busy reply, closing");
                lost_reply.notify_one();
            }
            return;
        }
    };

    let dispatcher = shared.dispatcher.clone();
    let writer = writer.clone();
    let lost_reply = lost_reply.clone();
    let payload = frame.payload;

    tokio::spawn(async move {
        let _permit = permit;

        let dispatched = tokio::task::spawn_blocking(move || dispatcher.handle(code, &payload)).await;
        let (status, body) = match dispatched {
            Ok(reply) => reply,
            Err(e) => {
                error!(code, "dispatch panicked: {}", e);
                (Status::UNKNOWN_ERROR, Bytes::new())
            }
        };

        let reply = OutboundFrame::reply(code, request_id, status, body);
        if let Err(e) = writer.send(reply).await {
            warn!(code, request_id, error = %e, "failed to send reply, closing");
            lost_reply.notify_one();
        }
    });
}

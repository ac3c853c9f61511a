//! Transport module - delivery of request parcels to the service.
//!
//! The protocol layer only needs [`Transport`]: hand over an opaque parcel
//! for an opcode, block until the reply arrives, and get back either the
//! reply body or a non-OK transport status.
//!
//! Bindings shipped with the crate:
//! - [`LocalTransport`] - calls a [`Dispatcher`](crate::dispatch::Dispatcher) in-process
//! - [`SocketTransport`] - blocking client over a Unix domain socket
//! - [`SocketListener`] - tokio listener used by the [`Server`](crate::Server)

use std::sync::Arc;

use bytes::Bytes;

use crate::dispatch::Dispatcher;
use crate::protocol::Status;

#[cfg(unix)]
mod listener;
#[cfg(unix)]
mod socket;

#[cfg(unix)]
pub use listener::{default_socket_path, SocketListener};
#[cfg(unix)]
pub use socket::SocketTransport;

/// One blocking request/reply exchange.
///
/// Retry, timeout and cancellation are the binding's concern; the protocol
/// layer calls `transact` exactly once per operation.
pub trait Transport: Send + Sync {
    /// Deliver `data` for opcode `code`.
    ///
    /// Returns the reply body on success. A non-OK status means the reply
    /// body must not be parsed.
    fn transact(&self, code: u32, data: Bytes) -> Result<Bytes, Status>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn transact(&self, code: u32, data: Bytes) -> Result<Bytes, Status> {
        (**self).transact(code, data)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn transact(&self, code: u32, data: Bytes) -> Result<Bytes, Status> {
        (**self).transact(code, data)
    }
}

/// In-process binding straight into a dispatcher.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher requests are delivered to.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Transport for LocalTransport {
    fn transact(&self, code: u32, data: Bytes) -> Result<Bytes, Status> {
        let (status, reply) = self.dispatcher.handle(code, &data);
        if status.is_ok() {
            Ok(reply)
        } else {
            Err(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Parcel;
    use crate::protocol::{Opcode, SERVICE_DESCRIPTOR};
    use crate::HwcService;

    struct Display;
    impl HwcService for Display {
        fn dump_buffers(&self, _display: u32, count: i32) -> i32 {
            if count < 0 {
                Status::BAD_VALUE.code()
            } else {
                0
            }
        }
    }

    fn transport() -> LocalTransport {
        LocalTransport::new(Arc::new(Dispatcher::new(Arc::new(Display))))
    }

    fn dump_request(count: i32) -> Bytes {
        let mut parcel = Parcel::new();
        parcel.write_interface_token(SERVICE_DESCRIPTOR);
        parcel.write_u32(0);
        parcel.write_i32(count);
        parcel.freeze()
    }

    #[test]
    fn test_local_transport_ok() {
        let reply = transport()
            .transact(Opcode::DumpBuffers.code(), dump_request(3))
            .unwrap();
        assert!(reply.is_empty());
    }

    #[test]
    fn test_local_transport_failure_status() {
        let result = transport().transact(Opcode::DumpBuffers.code(), dump_request(-1));
        assert_eq!(result, Err(Status::BAD_VALUE));
    }

    #[test]
    fn test_arc_transport_delegates() {
        let shared: Arc<dyn Transport> = Arc::new(transport());
        assert_eq!(
            shared.transact(4242, dump_request(0)),
            Err(Status::UNKNOWN_TRANSACTION)
        );
    }
}

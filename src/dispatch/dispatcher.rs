//! Server-side decode-dispatch-encode.
//!
//! Each request goes through the same stages:
//!
//! ```text
//! AwaitingRequest -> ValidatingToken -> Dispatching -> Done
//! ```
//!
//! A token mismatch stops before any argument byte is read. An opcode with no
//! route answers `UNKNOWN_TRANSACTION`. A decode failure answers
//! `NOT_ENOUGH_DATA` without calling the service. Everything else reports
//! transport success and carries the business result in the reply body.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{trace, warn};

use super::route::{standard_routes, Route};
use crate::codec::{Parcel, ParcelReader};
use crate::error::{HwcError, Result};
use crate::protocol::{OpcodeTable, Status};
use crate::service::HwcService;

/// Dispatches raw requests to a [`HwcService`].
///
/// Holds no per-request state, so one dispatcher can serve concurrent
/// requests from any number of threads.
pub struct Dispatcher {
    table: Arc<OpcodeTable>,
    routes: HashMap<u32, Box<dyn Route>>,
    service: Arc<dyn HwcService>,
}

impl Dispatcher {
    /// Dispatcher for the standard descriptor and routes.
    pub fn new(service: Arc<dyn HwcService>) -> Self {
        Self::with_table(Arc::new(OpcodeTable::new()), service)
    }

    /// Dispatcher sharing an existing opcode table.
    pub fn with_table(table: Arc<OpcodeTable>, service: Arc<dyn HwcService>) -> Self {
        let routes = standard_routes()
            .into_iter()
            .map(|r| (r.opcode().code(), r))
            .collect();
        Self {
            table,
            routes,
            service,
        }
    }

    /// Opcode table used for lookups.
    pub fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Check if `code` reaches a service method.
    pub fn is_bound(&self, code: u32) -> bool {
        self.routes.contains_key(&code)
    }

    /// Dispatch one request, writing the reply body into `reply`.
    ///
    /// Returns the transport status for the caller. Failures never leave a
    /// partial reply behind.
    pub fn dispatch(&self, code: u32, data: &[u8], reply: &mut Parcel) -> Status {
        match self.try_dispatch(code, data, reply) {
            Ok(status) => status,
            Err(e) => {
                warn!(code, error = %e, "request rejected");
                e.status()
            }
        }
    }

    /// Dispatch and return the status together with the frozen reply body.
    pub fn handle(&self, code: u32, data: &[u8]) -> (Status, Bytes) {
        let mut reply = Parcel::new();
        let status = self.dispatch(code, data, &mut reply);
        (status, reply.freeze())
    }

    /// Like [`dispatch`](Self::dispatch), but reports the failure cause.
    ///
    /// # Errors
    ///
    /// - [`HwcError::TokenMismatch`] if the identity token is wrong or missing
    /// - [`HwcError::UnknownOperation`] if no route is bound to `code`
    /// - [`HwcError::Decode`] if an argument could not be read
    pub fn try_dispatch(&self, code: u32, data: &[u8], reply: &mut Parcel) -> Result<Status> {
        let mut reader = ParcelReader::new(data);
        self.check_token(&mut reader)?;

        let route = self
            .routes
            .get(&code)
            .ok_or(HwcError::UnknownOperation(code))?;

        let status = route.call(self.service.as_ref(), &mut reader, reply)?;
        trace!(
            op = route.opcode().name(),
            %status,
            reply_len = reply.len(),
            "dispatched"
        );
        Ok(status)
    }

    fn check_token(&self, reader: &mut ParcelReader<'_>) -> Result<()> {
        let expected = self.table.descriptor();
        let found = reader.read_string16_units().ok().flatten();

        match found {
            Some(units) if units.iter().copied().eq(expected.encode_utf16()) => Ok(()),
            other => Err(HwcError::TokenMismatch {
                expected: expected.to_string(),
                found: other.map(|units| String::from_utf16_lossy(&units)),
            }),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("descriptor", &self.table.descriptor())
            .field("routes", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireArgs;
    use crate::protocol::{Opcode, SERVICE_DESCRIPTOR};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl HwcService for Counting {
        fn set_wfd_mode(&self, mode: u32) -> i32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            mode as i32 + 100
        }

        fn set_fixed_te2_rate(&self, _display: u32, _rate_hz: i32) -> i32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    fn request<A: WireArgs>(token: &str, args: A) -> Bytes {
        let mut parcel = Parcel::new();
        parcel.write_interface_token(token);
        args.encode(&mut parcel);
        parcel.freeze()
    }

    fn setup() -> (Arc<Counting>, Dispatcher) {
        let svc = Arc::new(Counting::default());
        let dispatcher = Dispatcher::new(svc.clone());
        (svc, dispatcher)
    }

    #[test]
    fn test_business_status_in_body() {
        let (svc, dispatcher) = setup();
        let data = request(SERVICE_DESCRIPTOR, (7u32,));

        let (status, body) = dispatcher.handle(Opcode::SetWfdMode.code(), &data);

        assert_eq!(status, Status::OK);
        assert_eq!(&body[..], &107i32.to_le_bytes());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_token_mismatch() {
        let (svc, dispatcher) = setup();
        let data = request("android.hal.Other", (7u32,));

        let mut reply = Parcel::new();
        let err = dispatcher
            .try_dispatch(Opcode::SetWfdMode.code(), &data, &mut reply)
            .unwrap_err();

        assert!(matches!(err, HwcError::TokenMismatch { .. }));
        assert_eq!(err.status(), Status::PERMISSION_DENIED);
        assert!(reply.is_empty());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_request_is_token_failure() {
        let (_, dispatcher) = setup();
        let (status, body) = dispatcher.handle(Opcode::SetWfdMode.code(), &[]);
        assert_eq!(status, Status::PERMISSION_DENIED);
        assert!(body.is_empty());
    }

    #[test]
    fn test_unknown_and_unbound_opcodes() {
        let (svc, dispatcher) = setup();
        for code in [21u32, 104, 999, 1019, Opcode::SetVirtualHpd.code(), Opcode::GetHwcFenceDebug.code()] {
            let data = request(SERVICE_DESCRIPTOR, (1u32,));
            let (status, body) = dispatcher.handle(code, &data);
            assert_eq!(status, Status::UNKNOWN_TRANSACTION, "code {code}");
            assert!(body.is_empty());
        }
        assert!(!dispatcher.is_bound(Opcode::SetExternalVsync.code()));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decode_error_skips_handler() {
        let (svc, dispatcher) = setup();
        let data = request(SERVICE_DESCRIPTOR, ());

        let (status, body) = dispatcher.handle(Opcode::SetWfdMode.code(), &data);

        assert_eq!(status, Status::NOT_ENOUGH_DATA);
        assert!(body.is_empty());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_in_transport_status() {
        let (svc, dispatcher) = setup();
        let data = request(SERVICE_DESCRIPTOR, (0u32, 120i32));

        let (status, body) = dispatcher.handle(Opcode::SetFixedTe2Rate.code(), &data);

        assert_eq!(status, Status::OK);
        assert!(body.is_empty());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_descriptor() {
        let svc = Arc::new(Counting::default());
        let table = Arc::new(OpcodeTable::with_descriptor("vendor.test.Hwc"));
        let dispatcher = Dispatcher::with_table(table, svc);

        let data = request(SERVICE_DESCRIPTOR, (1u32,));
        assert_eq!(
            dispatcher.handle(Opcode::SetWfdMode.code(), &data).0,
            Status::PERMISSION_DENIED
        );

        let data = request("vendor.test.Hwc", (1u32,));
        assert_eq!(dispatcher.handle(Opcode::SetWfdMode.code(), &data).0, Status::OK);
    }

    #[test]
    fn test_unprovided_method_reports_invalid_operation() {
        let (_, dispatcher) = setup();
        let data = request(SERVICE_DESCRIPTOR, ());

        let (status, body) = dispatcher.handle(Opcode::GetWfdMode.code(), &data);

        assert_eq!(status, Status::OK);
        assert_eq!(&body[..], &Status::INVALID_OPERATION.code().to_le_bytes());
    }
}

//! Integration tests for hwc-service.
//!
//! Client stub and dispatcher wired together through the in-process
//! transport, plus raw-parcel checks of the dispatcher's rejection paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hwc_service::codec::{Parcel, ParcelReader, WireArgs};
use hwc_service::dispatch::Dispatcher;
use hwc_service::protocol::{ClientMode, Opcode, OpcodeTable, ServerMode, Status, SERVICE_DESCRIPTOR};
use hwc_service::transport::{LocalTransport, Transport};
use hwc_service::{HwcError, HwcService, HwcServiceProxy};

/// Service that records every call it receives.
#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
    external_index: Mutex<Option<u32>>,
    presentation: Mutex<Option<bool>>,
    timeout: Mutex<Option<(i32, i32, Vec<(u32, u32)>)>>,
    brightness: Mutex<Option<(i32, f32)>>,
}

impl Recorder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl HwcService for Recorder {
    fn set_external_display_config(&self, index: u32) -> i32 {
        self.hit();
        *self.external_index.lock().unwrap() = Some(index);
        0
    }

    fn set_presentation_mode(&self, use_presentation: bool) {
        self.hit();
        *self.presentation.lock().unwrap() = Some(use_presentation);
    }

    fn set_present_timeout_parameters(
        &self,
        display: i32,
        timeout_ns: i32,
        settings: &[(u32, u32)],
    ) -> i32 {
        self.hit();
        *self.timeout.lock().unwrap() = Some((display, timeout_ns, settings.to_vec()));
        0
    }

    fn set_display_brightness(&self, display: i32, brightness: f32) -> i32 {
        self.hit();
        *self.brightness.lock().unwrap() = Some((display, brightness));
        if (0.0..=1.0).contains(&brightness) {
            0
        } else {
            Status::BAD_VALUE.code()
        }
    }

    fn set_refresh_rate_throttle(&self, _display: u32, delay_ms: i32) -> i32 {
        self.hit();
        if delay_ms < 0 {
            Status::BAD_VALUE.code()
        } else {
            0
        }
    }

    fn get_wfd_output_resolution(&self) -> hwc_service::protocol::WfdResolution {
        self.hit();
        hwc_service::protocol::WfdResolution {
            width: 1920,
            height: 1080,
            status: 0,
        }
    }

    fn set_hwc_debug(&self, _debug: i32) {
        self.hit();
    }

    fn get_hwc_debug(&self) -> u32 {
        self.hit();
        0x8000_0001
    }
}

/// Transport wrapper counting calls into the inner transport.
struct Counting<T> {
    inner: T,
    calls: AtomicUsize,
}

impl<T: Transport> Transport for Counting<T> {
    fn transact(&self, code: u32, data: Bytes) -> Result<Bytes, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.transact(code, data)
    }
}

fn setup() -> (Arc<Recorder>, Arc<Dispatcher>, HwcServiceProxy<Counting<LocalTransport>>) {
    let svc = Arc::new(Recorder::default());
    let dispatcher = Arc::new(Dispatcher::new(svc.clone()));
    let transport = Counting {
        inner: LocalTransport::new(dispatcher.clone()),
        calls: AtomicUsize::new(0),
    };
    (svc, dispatcher, HwcServiceProxy::new(transport))
}

fn request<A: WireArgs>(token: &str, args: A) -> Bytes {
    let mut parcel = Parcel::new();
    parcel.write_interface_token(token);
    args.encode(&mut parcel);
    parcel.freeze()
}

/// SetExternalDisplayConfig(3): token + 3 on the wire, handler sees 3,
/// returns 0, client gets 0.
#[test]
fn test_scalar_round_trip() {
    let (svc, _, proxy) = setup();

    assert_eq!(proxy.set_external_display_config(3).unwrap(), 0);
    assert_eq!(*svc.external_index.lock().unwrap(), Some(3));
    assert_eq!(svc.calls(), 1);
}

#[test]
fn test_scalar_request_bytes() {
    let data = request(SERVICE_DESCRIPTOR, (3u32,));
    let mut reader = ParcelReader::new(&data);
    assert_eq!(
        reader.read_string16().unwrap().as_deref(),
        Some(SERVICE_DESCRIPTOR)
    );
    assert_eq!(reader.read_u32().unwrap(), 3);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_present_timeout_list_round_trip() {
    let (svc, _, proxy) = setup();
    let settings = [(2, 8_333_333), (1, 16_666_667)];

    let status = proxy.set_present_timeout_parameters(1, 5_000_000, &settings);

    assert_eq!(status, Status::OK);
    assert_eq!(
        *svc.timeout.lock().unwrap(),
        Some((1, 5_000_000, settings.to_vec()))
    );
}

#[test]
fn test_present_timeout_empty_list() {
    let (svc, _, proxy) = setup();

    assert_eq!(proxy.set_present_timeout_parameters(0, 0, &[]), Status::OK);
    assert_eq!(*svc.timeout.lock().unwrap(), Some((0, 0, Vec::new())));
}

/// Cutting the request after the first pair's first element must fail the
/// decode instead of yielding a one-pair list.
#[test]
fn test_present_timeout_truncated_is_decode_error() {
    let (svc, dispatcher, _) = setup();
    let full = request(
        SERVICE_DESCRIPTOR,
        (1i32, 5_000_000i32, vec![(2u32, 8_333_333u32), (1, 16_666_667)]),
    );
    let token_len = request(SERVICE_DESCRIPTOR, ()).len();
    let cut = &full[..token_len + 12];

    let (status, body) = dispatcher.handle(Opcode::SetPresentTimeoutParameters.code(), cut);

    assert_eq!(status, Status::NOT_ENOUGH_DATA);
    assert!(body.is_empty());
    assert_eq!(svc.calls(), 0);
}

#[test]
fn test_one_way_presentation_mode() {
    let (svc, _, proxy) = setup();

    proxy.set_presentation_mode(true);

    assert_eq!(*svc.presentation.lock().unwrap(), Some(true));
    assert_eq!(proxy.transport().calls.load(Ordering::SeqCst), 1);
}

/// A one-way call completes even when the reply has no parseable body.
#[test]
fn test_one_way_with_unparseable_reply() {
    struct Garbage;
    impl Transport for Garbage {
        fn transact(&self, _code: u32, _data: Bytes) -> Result<Bytes, Status> {
            Ok(Bytes::from_static(&[0xFF]))
        }
    }

    let proxy = HwcServiceProxy::new(Garbage);
    proxy.set_presentation_mode(true);
    proxy.set_hwc_fence_debug(1, 2, 3);
}

#[test]
fn test_local_stub_never_calls_transport() {
    let (svc, _, proxy) = setup();

    assert_eq!(proxy.set_display_device_mode(2, 1), Status::OK);
    assert_eq!(proxy.set_panel_gamma_table_source(0, 1, 1), Status::OK);

    assert_eq!(proxy.transport().calls.load(Ordering::SeqCst), 0);
    assert_eq!(svc.calls(), 0);
}

#[test]
fn test_unknown_opcodes_never_invoke_handlers() {
    let (svc, dispatcher, _) = setup();
    let table = OpcodeTable::new();

    let unknown = (0..1100u32)
        .chain([5000, u32::MAX])
        .filter(|code| !table.contains(*code));

    for code in unknown {
        let data = request(SERVICE_DESCRIPTOR, (1u32, 2u32, 3u32, 4u32));
        let (status, body) = dispatcher.handle(code, &data);
        assert_eq!(status, Status::UNKNOWN_TRANSACTION, "code {code}");
        assert!(body.is_empty());
    }
    assert_eq!(svc.calls(), 0);
}

#[test]
fn test_unbound_opcodes_are_not_implemented() {
    let (svc, dispatcher, proxy) = setup();

    for info in OpcodeTable::new()
        .iter()
        .filter(|info| info.server == ServerMode::Unbound)
    {
        let (status, _) = dispatcher.handle(info.code(), &request(SERVICE_DESCRIPTOR, (0u32,)));
        assert_eq!(status, Status::UNKNOWN_TRANSACTION, "{}", info.name);
    }

    let err = proxy.set_external_vsync(1).unwrap_err();
    assert!(matches!(
        err,
        HwcError::Transport(Status::UNKNOWN_TRANSACTION)
    ));
    assert_eq!(svc.calls(), 0);
}

#[test]
fn test_token_gating_for_every_opcode() {
    let (svc, dispatcher, _) = setup();

    for info in OpcodeTable::new().iter() {
        for token in ["", "android.hal.ExynosHWCServic", "android.hal.ExynosHWCService2"] {
            let data = request(token, (1i32, 1i32, 1i32, 1i32));
            let mut reply = Parcel::new();
            let err = dispatcher
                .try_dispatch(info.code(), &data, &mut reply)
                .unwrap_err();
            assert!(matches!(err, HwcError::TokenMismatch { .. }), "{}", info.name);
            assert!(reply.is_empty());
        }
    }
    assert_eq!(svc.calls(), 0);
}

#[test]
fn test_in_transport_failure_reaches_client() {
    let (svc, _, proxy) = setup();

    assert_eq!(proxy.set_refresh_rate_throttle(0, 100), Status::OK);
    assert_eq!(proxy.set_refresh_rate_throttle(0, -1), Status::BAD_VALUE);
    assert_eq!(svc.calls(), 2);
}

/// Business failures travel in the body; the client of a transport-only
/// opcode does not read them.
#[test]
fn test_business_error_is_not_a_transport_fault() {
    let (svc, dispatcher, proxy) = setup();

    let (status, body) = dispatcher.handle(
        Opcode::SetDisplayBrightness.code(),
        &request(SERVICE_DESCRIPTOR, (0i32, 3.0f32)),
    );
    assert_eq!(status, Status::OK);
    assert_eq!(&body[..], &Status::BAD_VALUE.code().to_le_bytes());

    assert_eq!(proxy.set_display_brightness(1, 0.25), Status::OK);
    assert_eq!(*svc.brightness.lock().unwrap(), Some((1, 0.25)));
}

#[test]
fn test_resolution_and_debug_replies() {
    let (_, _, proxy) = setup();

    let res = proxy.get_wfd_output_resolution().unwrap();
    assert_eq!((res.width, res.height, res.status), (1920, 1080, 0));
    assert_eq!(proxy.get_hwc_debug().unwrap(), 0x8000_0001);
}

#[test]
fn test_unprovided_method_reports_invalid_operation() {
    let (_, _, proxy) = setup();

    assert_eq!(
        proxy.add_virtual_display_device().unwrap(),
        Status::INVALID_OPERATION.code()
    );
    assert_eq!(
        proxy.set_display_lhbm(0, 1),
        Status::OK,
        "business status of a transport-only opcode is not read"
    );
}

#[test]
fn test_client_modes_cover_table() {
    let table = OpcodeTable::new();
    let no_stub: Vec<Opcode> = table
        .iter()
        .filter(|info| info.client == ClientMode::NoStub)
        .map(|info| info.opcode)
        .collect();
    assert_eq!(no_stub, vec![Opcode::SetVirtualHpd]);
}

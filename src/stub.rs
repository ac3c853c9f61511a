//! Client stub.
//!
//! [`HwcServiceProxy`] has one method per client-side operation. Each call
//! writes the identity token and the arguments in schema order, makes exactly
//! one [`Transport::transact`], and interprets the reply according to the
//! operation's [`ClientMode`]:
//!
//! | Mode | Return | Transport failure |
//! |---|---|---|
//! | read reply | `Result<T>` with the decoded fields | `Err(HwcError::Transport)` |
//! | transport only | [`Status`] of the transaction | that status |
//! | one-way | `()` | logged only |
//! | local | [`Status::OK`] without any transport call | n/a |
//!
//! Transport failures are logged at error level with the operation name.
//! A reply body is never read after a failed transaction.

use bytes::Bytes;
use tracing::{debug, error};

use crate::codec::{Parcel, ParcelReader, WireArgs};
use crate::error::{HwcError, Result};
use crate::protocol::{
    ClientMode, Opcode, OpcodeTable, Status, StatusReply, WfdResolution, WireReply,
};
use crate::transport::Transport;

/// Typed client for the display service.
#[derive(Debug, Clone)]
pub struct HwcServiceProxy<T> {
    transport: T,
    table: OpcodeTable,
}

impl<T: Transport> HwcServiceProxy<T> {
    /// Proxy for the standard descriptor.
    pub fn new(transport: T) -> Self {
        Self::with_table(transport, OpcodeTable::new())
    }

    /// Proxy writing the descriptor of `table`.
    pub fn with_table(transport: T, table: OpcodeTable) -> Self {
        Self { transport, table }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn transact<A: WireArgs>(&self, op: Opcode, args: A) -> std::result::Result<Bytes, Status> {
        let mut data = Parcel::new();
        data.write_interface_token(self.table.descriptor());
        args.encode(&mut data);

        self.transport
            .transact(op.code(), data.freeze())
            .map_err(|status| {
                error!("{} transact error({})", op.name(), status);
                status
            })
    }

    /// Round trip and decode the reply body.
    fn call<A: WireArgs, R: WireReply>(&self, op: Opcode, args: A) -> Result<R> {
        debug_assert_eq!(op.info().client, ClientMode::ReadReply);
        let reply = self.transact(op, args).map_err(HwcError::Transport)?;
        let mut reader = ParcelReader::new(&reply);
        Ok(R::decode(&mut reader)?)
    }

    /// Round trip returning the business status from the reply.
    fn call_status<A: WireArgs>(&self, op: Opcode, args: A) -> Result<i32> {
        self.call::<A, StatusReply>(op, args).map(|reply| reply.0)
    }

    /// Round trip whose only result is the transport status.
    fn call_transport<A: WireArgs>(&self, op: Opcode, args: A) -> Status {
        debug_assert_eq!(op.info().client, ClientMode::TransportOnly);
        match self.transact(op, args) {
            Ok(_) => Status::OK,
            Err(status) => status,
        }
    }

    /// Round trip with the reply ignored.
    fn send_one_way<A: WireArgs>(&self, op: Opcode, args: A) {
        debug_assert_eq!(op.info().client, ClientMode::OneWay);
        let _ = self.transact(op, args);
    }

    /// Accept and drop the arguments without touching the transport.
    fn local(&self, op: Opcode) -> Status {
        debug_assert_eq!(op.info().client, ClientMode::Local);
        debug!("{} handled locally, arguments ignored", op.name());
        Status::OK
    }

    // Virtual display and WFD

    pub fn add_virtual_display_device(&self) -> Result<i32> {
        self.call_status(Opcode::AddVirtualDisplayDevice, ())
    }

    pub fn destroy_virtual_display_device(&self) -> Result<i32> {
        self.call_status(Opcode::DestroyVirtualDisplayDevice, ())
    }

    pub fn set_wfd_mode(&self, mode: u32) -> Result<i32> {
        self.call_status(Opcode::SetWfdMode, (mode,))
    }

    pub fn get_wfd_mode(&self) -> Result<i32> {
        self.call_status(Opcode::GetWfdMode, ())
    }

    pub fn send_wfd_command(&self, cmd: i32, ext1: i32, ext2: i32) -> Result<i32> {
        self.call_status(Opcode::SendWfdCommand, (cmd, ext1, ext2))
    }

    pub fn set_secure_vds_mode(&self, mode: u32) -> Result<i32> {
        self.call_status(Opcode::SetSecureVdsMode, (mode,))
    }

    pub fn set_wfd_output_resolution(&self, width: u32, height: u32) -> Result<i32> {
        self.call_status(Opcode::SetWfdOutputResolution, (width, height))
    }

    /// Current WFD output size and the business status.
    pub fn get_wfd_output_resolution(&self) -> Result<WfdResolution> {
        self.call(Opcode::GetWfdOutputResolution, ())
    }

    /// One-way; the reply is not read.
    pub fn set_presentation_mode(&self, use_presentation: bool) {
        self.send_one_way(Opcode::SetPresentationMode, (use_presentation,))
    }

    pub fn get_presentation_mode(&self) -> Result<i32> {
        self.call_status(Opcode::GetPresentationMode, ())
    }

    pub fn set_vds_gles_format(&self, format: i32) -> Result<i32> {
        self.call_status(Opcode::SetVdsGlesFormat, (format,))
    }

    // Display control

    pub fn set_hwc_ctl(&self, display: u32, ctrl: u32, value: i32) -> Result<i32> {
        self.call_status(Opcode::HwcControl, (display, ctrl, value))
    }

    pub fn set_boot_finished(&self) {
        self.send_one_way(Opcode::SetBootFinished, ())
    }

    pub fn get_external_display_configs(&self) -> Result<i32> {
        self.call_status(Opcode::GetExternalDisplayConfig, ())
    }

    pub fn set_external_display_config(&self, index: u32) -> Result<i32> {
        self.call_status(Opcode::SetExternalDisplayConfig, (index,))
    }

    pub fn enable_mpp(&self, mpp_type: u32, physical_index: u32, logical_index: u32, enable: u32) {
        self.send_one_way(
            Opcode::EnableMpp,
            (mpp_type, physical_index, logical_index, enable),
        )
    }

    pub fn set_external_vsync(&self, index: u32) -> Result<i32> {
        self.call_status(Opcode::SetExternalVsync, (index,))
    }

    pub fn set_ddi_scaler(&self, display: u32, width: u32, height: u32) -> Result<i32> {
        self.call_status(Opcode::SetDdiScaler, (display, width, height))
    }

    pub fn get_external_hdr_capabilities(&self) -> Result<i32> {
        self.call_status(Opcode::GetExternalHdrCapa, ())
    }

    pub fn set_scale_down_ratio(
        &self,
        mpp_type: u32,
        physical_index: u32,
        logical_index: u32,
        scale_down_ratio: u32,
    ) {
        self.send_one_way(
            Opcode::SetScaleDownRatio,
            (mpp_type, physical_index, logical_index, scale_down_ratio),
        )
    }

    // Debug

    pub fn set_hwc_debug(&self, debug: i32) {
        self.send_one_way(Opcode::SetHwcDebug, (debug,))
    }

    /// Debug flag word.
    pub fn get_hwc_debug(&self) -> Result<u32> {
        self.call_status(Opcode::GetHwcDebug, ())
            .map(|flags| flags as u32)
    }

    pub fn set_hwc_fence_debug(&self, fence_num: u32, ip_num: u32, mode: u32) {
        self.send_one_way(Opcode::SetHwcFenceDebug, (fence_num, ip_num, mode))
    }

    pub fn get_hwc_fence_debug(&self) {
        self.send_one_way(Opcode::GetHwcFenceDebug, ())
    }

    // Extended display device control

    /// Always [`Status::OK`]; nothing is sent.
    pub fn set_display_device_mode(&self, _display: i32, _mode: i32) -> Status {
        self.local(Opcode::SetDisplayDeviceMode)
    }

    /// Always [`Status::OK`]; nothing is sent.
    pub fn set_panel_gamma_table_source(
        &self,
        _display: i32,
        _gamma_type: i32,
        _source: i32,
    ) -> Status {
        self.local(Opcode::SetPanelGammaTableSource)
    }

    pub fn set_display_brightness(&self, display: i32, brightness: f32) -> Status {
        self.call_transport(Opcode::SetDisplayBrightness, (display, brightness))
    }

    pub fn set_display_lhbm(&self, display: i32, on: u32) -> Status {
        self.call_transport(Opcode::SetDisplayLhbm, (display, on))
    }

    pub fn set_lbe_ctrl(&self, display: u32, state: u32, lux: u32) {
        self.send_one_way(Opcode::SetLbeCtrl, (display, state, lux))
    }

    pub fn set_min_idle_refresh_rate(&self, display: u32, fps: i32) -> Status {
        self.call_transport(Opcode::SetMinIdleRefreshRate, (display, fps))
    }

    pub fn set_refresh_rate_throttle(&self, display: u32, delay_ms: i32) -> Status {
        self.call_transport(Opcode::SetRefreshRateThrottle, (display, delay_ms))
    }

    pub fn set_display_rcd_layer_enabled(&self, index: u32, enable: bool) -> Status {
        self.call_transport(Opcode::SetDisplayRcdLayerEnabled, (index, enable))
    }

    pub fn trigger_display_idle_enter(&self, index: u32, idle_te_refresh_rate: u32) -> Status {
        self.call_transport(
            Opcode::TriggerDisplayIdleEnter,
            (index, idle_te_refresh_rate),
        )
    }

    pub fn set_display_dbm(&self, display: i32, on: u32) -> Status {
        self.call_transport(Opcode::SetDisplayDbm, (display, on))
    }

    pub fn set_display_multi_threaded_present(&self, display: i32, enable: bool) -> Status {
        self.call_transport(Opcode::SetDisplayMultiThreadedPresent, (display, enable))
    }

    pub fn trigger_refresh_rate_indicator_update(&self, display: u32, refresh_rate: u32) -> Status {
        self.call_transport(
            Opcode::TriggerRefreshRateIndicatorUpdate,
            (display, refresh_rate),
        )
    }

    pub fn ignore_display_brightness_update_requests(&self, display: i32, ignore: bool) -> Status {
        self.call_transport(
            Opcode::IgnoreDisplayBrightnessUpdateRequests,
            (display, ignore),
        )
    }

    pub fn set_display_brightness_nits(&self, display: i32, nits: f32) -> Status {
        self.call_transport(Opcode::SetDisplayBrightnessNits, (display, nits))
    }

    pub fn set_display_brightness_dbv(&self, display: i32, dbv: u32) -> Status {
        self.call_transport(Opcode::SetDisplayBrightnessDbv, (display, dbv))
    }

    pub fn dump_buffers(&self, display: u32, count: i32) -> Status {
        self.call_transport(Opcode::DumpBuffers, (display, count))
    }

    /// `settings` is sent as `(frame_count, interval_ns)` pairs with no
    /// count; the receiver reads pairs until the request ends.
    pub fn set_present_timeout_parameters(
        &self,
        display: i32,
        timeout_ns: i32,
        settings: &[(u32, u32)],
    ) -> Status {
        self.call_transport(
            Opcode::SetPresentTimeoutParameters,
            (display, timeout_ns, settings.to_vec()),
        )
    }

    pub fn set_present_timeout_controller(&self, display: i32, controller_type: u32) -> Status {
        self.call_transport(
            Opcode::SetPresentTimeoutController,
            (display, controller_type),
        )
    }

    pub fn set_fixed_te2_rate(&self, display: u32, rate_hz: i32) -> Status {
        self.call_transport(Opcode::SetFixedTe2Rate, (display, rate_hz))
    }
}

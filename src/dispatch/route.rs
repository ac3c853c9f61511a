//! Routes binding opcodes to service methods.
//!
//! A route is the (decode, invoke, encode) triple for one opcode. Routes are
//! built once into a table; the dispatcher never branches per opcode.

use crate::codec::{FieldType, Parcel, ParcelReader, WireArgs};
use crate::error::DecodeError;
use crate::protocol::{Opcode, Status, StatusReply, TransportReply, WfdResolution, WireReply};
use crate::service::HwcService;

/// Decode-invoke-encode for a single opcode.
pub trait Route: Send + Sync + 'static {
    /// Opcode this route serves.
    fn opcode(&self) -> Opcode;

    /// Request field types the route decodes, in wire order.
    fn request_schema(&self) -> Vec<FieldType>;

    /// Decode the arguments from `args`, call the service and encode its
    /// output into `reply`.
    ///
    /// Returns the transport status produced by the reply encoding. On a
    /// decode error the service is not called and `reply` is untouched.
    fn call(
        &self,
        service: &dyn HwcService,
        args: &mut ParcelReader<'_>,
        reply: &mut Parcel,
    ) -> Result<Status, DecodeError>;
}

/// Route with statically typed arguments and reply.
pub struct TypedRoute<A, R> {
    opcode: Opcode,
    invoke: fn(&dyn HwcService, A) -> R,
}

impl<A, R> TypedRoute<A, R>
where
    A: WireArgs + 'static,
    R: WireReply + 'static,
{
    /// Create a new typed route.
    pub fn new(opcode: Opcode, invoke: fn(&dyn HwcService, A) -> R) -> Self {
        Self { opcode, invoke }
    }
}

impl<A, R> Route for TypedRoute<A, R>
where
    A: WireArgs + 'static,
    R: WireReply + 'static,
{
    fn opcode(&self) -> Opcode {
        self.opcode
    }

    fn request_schema(&self) -> Vec<FieldType> {
        A::schema()
    }

    fn call(
        &self,
        service: &dyn HwcService,
        args: &mut ParcelReader<'_>,
        reply: &mut Parcel,
    ) -> Result<Status, DecodeError> {
        let args = A::decode(args)?;
        let output = (self.invoke)(service, args);
        Ok(output.encode(reply))
    }
}

fn route<A, R>(opcode: Opcode, invoke: fn(&dyn HwcService, A) -> R) -> Box<dyn Route>
where
    A: WireArgs + 'static,
    R: WireReply + 'static,
{
    Box::new(TypedRoute::new(opcode, invoke))
}

/// Routes for every opcode the service answers.
///
/// `SetVirtualHpd`, `SetExternalVsync` and `GetHwcFenceDebug` are declared
/// but have no route; they fall through to not-implemented.
pub fn standard_routes() -> Vec<Box<dyn Route>> {
    use Opcode::*;

    vec![
        route(AddVirtualDisplayDevice, |s, (): ()| {
            StatusReply(s.add_virtual_display_device())
        }),
        route(DestroyVirtualDisplayDevice, |s, (): ()| {
            StatusReply(s.destroy_virtual_display_device())
        }),
        route(SetWfdMode, |s, (mode,): (u32,)| {
            StatusReply(s.set_wfd_mode(mode))
        }),
        route(GetWfdMode, |s, (): ()| StatusReply(s.get_wfd_mode())),
        route(SendWfdCommand, |s, (cmd, ext1, ext2): (i32, i32, i32)| {
            StatusReply(s.send_wfd_command(cmd, ext1, ext2))
        }),
        route(SetSecureVdsMode, |s, (mode,): (u32,)| {
            StatusReply(s.set_secure_vds_mode(mode))
        }),
        route(SetWfdOutputResolution, |s, (width, height): (u32, u32)| {
            StatusReply(s.set_wfd_output_resolution(width, height))
        }),
        route(GetWfdOutputResolution, |s, (): ()| -> WfdResolution {
            s.get_wfd_output_resolution()
        }),
        route(SetPresentationMode, |s, (use_presentation,): (bool,)| {
            s.set_presentation_mode(use_presentation)
        }),
        route(GetPresentationMode, |s, (): ()| {
            StatusReply(s.get_presentation_mode())
        }),
        route(SetVdsGlesFormat, |s, (format,): (i32,)| {
            StatusReply(s.set_vds_gles_format(format))
        }),
        route(HwcControl, |s, (display, ctrl, value): (u32, u32, i32)| {
            StatusReply(s.set_hwc_ctl(display, ctrl, value))
        }),
        route(SetBootFinished, |s, (): ()| s.set_boot_finished()),
        route(GetExternalDisplayConfig, |s, (): ()| {
            StatusReply(s.get_external_display_configs())
        }),
        route(SetExternalDisplayConfig, |s, (index,): (u32,)| {
            StatusReply(s.set_external_display_config(index))
        }),
        route(
            EnableMpp,
            |s, (mpp_type, physical, logical, enable): (u32, u32, u32, u32)| {
                s.enable_mpp(mpp_type, physical, logical, enable)
            },
        ),
        route(SetDdiScaler, |s, (display, width, height): (u32, u32, u32)| {
            StatusReply(s.set_ddi_scaler(display, width, height))
        }),
        route(GetExternalHdrCapa, |s, (): ()| {
            StatusReply(s.get_external_hdr_capabilities())
        }),
        route(
            SetScaleDownRatio,
            |s, (mpp_type, physical, logical, ratio): (u32, u32, u32, u32)| {
                s.set_scale_down_ratio(mpp_type, physical, logical, ratio)
            },
        ),
        // Echoes the requested value back.
        route(SetHwcDebug, |s, (debug,): (i32,)| {
            s.set_hwc_debug(debug);
            StatusReply(debug)
        }),
        route(GetHwcDebug, |s, (): ()| StatusReply(s.get_hwc_debug() as i32)),
        route(SetHwcFenceDebug, |s, (fence, ip, mode): (u32, u32, u32)| {
            s.set_hwc_fence_debug(fence, ip, mode)
        }),
        route(SetDisplayDeviceMode, |s, (display, mode): (i32, i32)| {
            StatusReply(s.set_display_device_mode(display, mode))
        }),
        route(
            SetPanelGammaTableSource,
            |s, (display, gamma_type, source): (i32, i32, i32)| {
                StatusReply(s.set_panel_gamma_table_source(display, gamma_type, source))
            },
        ),
        route(SetDisplayBrightness, |s, (display, brightness): (i32, f32)| {
            StatusReply(s.set_display_brightness(display, brightness))
        }),
        route(SetDisplayLhbm, |s, (display, on): (i32, u32)| {
            StatusReply(s.set_display_lhbm(display, on))
        }),
        route(SetLbeCtrl, |s, (display, state, lux): (u32, u32, u32)| {
            s.set_lbe_ctrl(display, state, lux)
        }),
        route(SetMinIdleRefreshRate, |s, (display, fps): (u32, i32)| {
            TransportReply(s.set_min_idle_refresh_rate(display, fps))
        }),
        route(SetRefreshRateThrottle, |s, (display, delay_ms): (u32, i32)| {
            TransportReply(s.set_refresh_rate_throttle(display, delay_ms))
        }),
        route(SetDisplayRcdLayerEnabled, |s, (index, enable): (u32, bool)| {
            TransportReply(s.set_display_rcd_layer_enabled(index, enable))
        }),
        route(TriggerDisplayIdleEnter, |s, (index, rate): (u32, u32)| {
            TransportReply(s.trigger_display_idle_enter(index, rate))
        }),
        route(SetDisplayDbm, |s, (display, on): (i32, u32)| {
            StatusReply(s.set_display_dbm(display, on))
        }),
        route(
            SetDisplayMultiThreadedPresent,
            |s, (display, enable): (i32, bool)| {
                StatusReply(s.set_display_multi_threaded_present(display, enable))
            },
        ),
        route(
            TriggerRefreshRateIndicatorUpdate,
            |s, (display, rate): (u32, u32)| {
                TransportReply(s.trigger_refresh_rate_indicator_update(display, rate))
            },
        ),
        route(
            IgnoreDisplayBrightnessUpdateRequests,
            |s, (display, ignore): (i32, bool)| {
                StatusReply(s.ignore_display_brightness_update_requests(display, ignore))
            },
        ),
        route(SetDisplayBrightnessNits, |s, (display, nits): (i32, f32)| {
            StatusReply(s.set_display_brightness_nits(display, nits))
        }),
        route(SetDisplayBrightnessDbv, |s, (display, dbv): (i32, u32)| {
            StatusReply(s.set_display_brightness_dbv(display, dbv))
        }),
        route(DumpBuffers, |s, (display, count): (u32, i32)| {
            TransportReply(s.dump_buffers(display, count))
        }),
        route(
            SetPresentTimeoutParameters,
            |s, (display, timeout_ns, settings): (i32, i32, Vec<(u32, u32)>)| {
                StatusReply(s.set_present_timeout_parameters(display, timeout_ns, &settings))
            },
        ),
        route(
            SetPresentTimeoutController,
            |s, (display, controller): (i32, u32)| {
                StatusReply(s.set_present_timeout_controller(display, controller))
            },
        ),
        route(SetFixedTe2Rate, |s, (display, rate_hz): (u32, i32)| {
            TransportReply(s.set_fixed_te2_rate(display, rate_hz))
        }),
    ]
}

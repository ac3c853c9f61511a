//! Capability interface implemented by the display service.
//!
//! [`HwcService`] is the handler side of the protocol: one method per bound
//! opcode, with typed arguments already decoded by the dispatcher. Methods
//! returning `i32` return a business status; the protocol assigns it no
//! meaning. Every method has a default so an implementation only provides
//! the operations it supports. Unprovided status methods answer
//! [`Status::INVALID_OPERATION`], unprovided void methods do nothing.
//!
//! Implementations are shared across connections and may be called
//! concurrently. They own their synchronization.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use hwc_service::HwcService;
//!
//! #[derive(Default)]
//! struct Panel {
//!     wfd_mode: AtomicU32,
//! }
//!
//! impl HwcService for Panel {
//!     fn set_wfd_mode(&self, mode: u32) -> i32 {
//!         self.wfd_mode.store(mode, Ordering::SeqCst);
//!         0
//!     }
//!
//!     fn get_wfd_mode(&self) -> i32 {
//!         self.wfd_mode.load(Ordering::SeqCst) as i32
//!     }
//! }
//! ```

use crate::protocol::{Status, WfdResolution};

const NOT_PROVIDED: i32 = Status::INVALID_OPERATION.0;

/// Display service operations reachable through the dispatcher.
#[allow(unused_variables)]
pub trait HwcService: Send + Sync {
    // Virtual display and WFD

    fn add_virtual_display_device(&self) -> i32 {
        NOT_PROVIDED
    }

    fn destroy_virtual_display_device(&self) -> i32 {
        NOT_PROVIDED
    }

    fn set_wfd_mode(&self, mode: u32) -> i32 {
        NOT_PROVIDED
    }

    fn get_wfd_mode(&self) -> i32 {
        NOT_PROVIDED
    }

    fn send_wfd_command(&self, cmd: i32, ext1: i32, ext2: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_secure_vds_mode(&self, mode: u32) -> i32 {
        NOT_PROVIDED
    }

    fn set_wfd_output_resolution(&self, width: u32, height: u32) -> i32 {
        NOT_PROVIDED
    }

    /// Current WFD output size. The default reports a zero size with
    /// `INVALID_OPERATION` as its status.
    fn get_wfd_output_resolution(&self) -> WfdResolution {
        WfdResolution {
            status: NOT_PROVIDED,
            ..WfdResolution::default()
        }
    }

    fn set_presentation_mode(&self, use_presentation: bool) {}

    fn get_presentation_mode(&self) -> i32 {
        NOT_PROVIDED
    }

    fn set_vds_gles_format(&self, format: i32) -> i32 {
        NOT_PROVIDED
    }

    // Display control

    fn set_hwc_ctl(&self, display: u32, ctrl: u32, value: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_boot_finished(&self) {}

    fn get_external_display_configs(&self) -> i32 {
        NOT_PROVIDED
    }

    fn set_external_display_config(&self, index: u32) -> i32 {
        NOT_PROVIDED
    }

    fn enable_mpp(&self, mpp_type: u32, physical_index: u32, logical_index: u32, enable: u32) {}

    fn set_ddi_scaler(&self, display: u32, width: u32, height: u32) -> i32 {
        NOT_PROVIDED
    }

    fn get_external_hdr_capabilities(&self) -> i32 {
        NOT_PROVIDED
    }

    fn set_scale_down_ratio(
        &self,
        mpp_type: u32,
        physical_index: u32,
        logical_index: u32,
        scale_down_ratio: u32,
    ) {
    }

    // Debug

    fn set_hwc_debug(&self, debug: i32) {}

    /// Current debug flag word. Zero by default.
    fn get_hwc_debug(&self) -> u32 {
        0
    }

    fn set_hwc_fence_debug(&self, fence_num: u32, ip_num: u32, mode: u32) {}

    // Extended display device control

    fn set_display_device_mode(&self, display: i32, mode: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_panel_gamma_table_source(&self, display: i32, gamma_type: i32, source: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_brightness(&self, display: i32, brightness: f32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_lhbm(&self, display: i32, on: u32) -> i32 {
        NOT_PROVIDED
    }

    fn set_lbe_ctrl(&self, display: u32, state: u32, lux: u32) {}

    fn set_min_idle_refresh_rate(&self, display: u32, fps: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_refresh_rate_throttle(&self, display: u32, delay_ms: i32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_rcd_layer_enabled(&self, index: u32, enable: bool) -> i32 {
        NOT_PROVIDED
    }

    fn trigger_display_idle_enter(&self, index: u32, idle_te_refresh_rate: u32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_dbm(&self, display: i32, on: u32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_multi_threaded_present(&self, display: i32, enable: bool) -> i32 {
        NOT_PROVIDED
    }

    fn trigger_refresh_rate_indicator_update(&self, display: u32, refresh_rate: u32) -> i32 {
        NOT_PROVIDED
    }

    fn ignore_display_brightness_update_requests(&self, display: i32, ignore: bool) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_brightness_nits(&self, display: i32, nits: f32) -> i32 {
        NOT_PROVIDED
    }

    fn set_display_brightness_dbv(&self, display: i32, dbv: u32) -> i32 {
        NOT_PROVIDED
    }

    fn dump_buffers(&self, display: u32, count: i32) -> i32 {
        NOT_PROVIDED
    }

    /// `settings` holds `(frame_count, interval_ns)` pairs in request order.
    fn set_present_timeout_parameters(
        &self,
        display: i32,
        timeout_ns: i32,
        settings: &[(u32, u32)],
    ) -> i32 {
        NOT_PROVIDED
    }

    fn set_present_timeout_controller(&self, display: i32, controller_type: u32) -> i32 {
        NOT_PROVIDED
    }

    fn set_fixed_te2_rate(&self, display: u32, rate_hz: i32) -> i32 {
        NOT_PROVIDED
    }
}

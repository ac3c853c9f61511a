//! Display Service - sample server for the HWC protocol.
//!
//! This example demonstrates:
//! - Implementing the subset of [`HwcService`] a device supports
//! - Loading a [`ServiceConfig`] from a JSON file
//! - Serving the socket binding until Ctrl-C
//!
//! # Running
//!
//! ```text
//! RUST_LOG=hwc_service=debug cargo run --example display_service -- [config.json]
//! ```
//!
//! Then drive it with the `hwc_ctl` example.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use hwc_service::protocol::{Status, WfdResolution};
use hwc_service::{HwcService, ServerBuilder, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// In-memory display state.
#[derive(Default)]
struct Display {
    wfd_mode: AtomicU32,
    wfd_resolution: Mutex<(u32, u32)>,
    presentation: AtomicI32,
    debug: AtomicU32,
}

const EXTERNAL_CONFIGS: u32 = 3;

impl HwcService for Display {
    fn set_wfd_mode(&self, mode: u32) -> i32 {
        info!(mode, "wfd mode");
        self.wfd_mode.store(mode, Ordering::Relaxed);
        0
    }

    fn get_wfd_mode(&self) -> i32 {
        self.wfd_mode.load(Ordering::Relaxed) as i32
    }

    fn set_wfd_output_resolution(&self, width: u32, height: u32) -> i32 {
        if width == 0 || height == 0 {
            return Status::BAD_VALUE.code();
        }
        *self.wfd_resolution.lock().unwrap() = (width, height);
        0
    }

    fn get_wfd_output_resolution(&self) -> WfdResolution {
        let (width, height) = *self.wfd_resolution.lock().unwrap();
        WfdResolution {
            width,
            height,
            status: 0,
        }
    }

    fn set_presentation_mode(&self, use_presentation: bool) {
        self.presentation
            .store(use_presentation as i32, Ordering::Relaxed);
    }

    fn get_presentation_mode(&self) -> i32 {
        self.presentation.load(Ordering::Relaxed)
    }

    fn get_external_display_configs(&self) -> i32 {
        EXTERNAL_CONFIGS as i32
    }

    fn set_external_display_config(&self, index: u32) -> i32 {
        if index < EXTERNAL_CONFIGS {
            info!(index, "external config");
            0
        } else {
            Status::BAD_VALUE.code()
        }
    }

    fn set_hwc_debug(&self, debug: i32) {
        self.debug.store(debug as u32, Ordering::Relaxed);
    }

    fn get_hwc_debug(&self) -> u32 {
        self.debug.load(Ordering::Relaxed)
    }

    fn set_display_brightness(&self, display_id: i32, brightness: f32) -> i32 {
        if !(0.0..=1.0).contains(&brightness) {
            return Status::BAD_VALUE.code();
        }
        info!(display_id, brightness, "brightness");
        0
    }

    fn set_fixed_te2_rate(&self, display_id: u32, rate_hz: i32) -> i32 {
        if rate_hz <= 0 {
            return Status::BAD_VALUE.code();
        }
        info!(display_id, rate_hz, "te2 rate");
        0
    }

    fn set_present_timeout_parameters(
        &self,
        display_id: i32,
        timeout_ns: i32,
        settings: &[(u32, u32)],
    ) -> i32 {
        info!(display_id, timeout_ns, ?settings, "present timeout");
        0
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };

    let server = ServerBuilder::from_config(config)
        .bind(Arc::new(Display::default()))
        .await?;

    info!(path = %server.path().display(), "listening");

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

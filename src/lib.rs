//! # hwc-service
//!
//! Wire protocol and dispatch engine for the HWC display service.
//!
//! A client process controls the display compositor through a closed set of
//! numbered operations. This crate provides both ends of that protocol:
//!
//! - **Opcode table** ([`protocol::OpcodeTable`]): codes, request and reply
//!   schemas, pinned for compatibility with deployed peers
//! - **Codec** ([`codec`]): little-endian parcel encoding of the field types
//! - **Client stub** ([`HwcServiceProxy`]): one typed method per operation
//! - **Dispatcher** ([`dispatch::Dispatcher`]): token check, route lookup,
//!   decode, invoke, encode
//! - **Service** ([`HwcService`]): the capability trait handlers implement
//!
//! Requests travel over any [`Transport`](transport::Transport). The crate
//! ships an in-process binding and a framed Unix socket binding with a tokio
//! [`Server`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use hwc_service::dispatch::Dispatcher;
//! use hwc_service::transport::LocalTransport;
//! use hwc_service::{HwcService, HwcServiceProxy};
//!
//! struct Display;
//!
//! impl HwcService for Display {
//!     fn set_external_display_config(&self, index: u32) -> i32 {
//!         if index < 4 { 0 } else { -22 }
//!     }
//! }
//!
//! let dispatcher = Arc::new(Dispatcher::new(Arc::new(Display)));
//! let proxy = HwcServiceProxy::new(LocalTransport::new(dispatcher));
//!
//! assert_eq!(proxy.set_external_display_config(3).unwrap(), 0);
//! assert_eq!(proxy.set_external_display_config(9).unwrap(), -22);
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod service;
pub mod stub;
pub mod transport;

#[cfg(unix)]
mod server;
mod writer;

pub use config::ServiceConfig;
pub use error::{HwcError, Result};
pub use service::HwcService;
pub use stub::HwcServiceProxy;

#[cfg(unix)]
pub use server::{Server, ServerBuilder};
pub use writer::{WriterConfig, DEFAULT_BACKPRESSURE_TIMEOUT, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PENDING_FRAMES};

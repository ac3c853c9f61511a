//! Dispatch module - server side of the protocol.
//!
//! Provides:
//! - [`Dispatcher`] - validates the identity token and runs the bound route
//! - [`Route`] / [`TypedRoute`] - per-opcode decode, invoke and encode
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hwc_service::codec::Parcel;
//! use hwc_service::dispatch::Dispatcher;
//! use hwc_service::protocol::{Opcode, Status, SERVICE_DESCRIPTOR};
//! use hwc_service::HwcService;
//!
//! struct Display;
//! impl HwcService for Display {
//!     fn set_external_display_config(&self, _index: u32) -> i32 {
//!         0
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new(Arc::new(Display));
//!
//! let mut request = Parcel::new();
//! request.write_interface_token(SERVICE_DESCRIPTOR);
//! request.write_u32(3);
//!
//! let (status, body) = dispatcher.handle(
//!     Opcode::SetExternalDisplayConfig.code(),
//!     request.as_bytes(),
//! );
//! assert_eq!(status, Status::OK);
//! assert_eq!(&body[..], &[0, 0, 0, 0]);
//! ```

mod dispatcher;
mod route;

pub use dispatcher::Dispatcher;
pub use route::{standard_routes, Route, TypedRoute};

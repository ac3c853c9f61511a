//! Codec module - parcel encoding of request and reply fields.
//!
//! - [`Parcel`] / [`ParcelReader`] - primitive encode/decode
//! - [`WireField`] / [`WireArgs`] - typed fields and ordered request bodies
//!
//! # Design
//!
//! Encoding never fails for well-typed input. Decoding from an exhausted
//! buffer returns [`DecodeError::NotEnoughData`](crate::error::DecodeError),
//! which callers can tell apart from a decoded zero.
//!
//! # Example
//!
//! ```
//! use hwc_service::codec::{Parcel, ParcelReader, WireArgs};
//!
//! let mut parcel = Parcel::new();
//! (3i32, 0.5f32).encode(&mut parcel);
//! let bytes = parcel.freeze();
//!
//! let mut reader = ParcelReader::new(&bytes);
//! assert_eq!(<(i32, f32)>::decode(&mut reader).unwrap(), (3, 0.5));
//! ```

mod field;
mod parcel;

pub use field::{FieldType, WireArgs, WireField};
pub use parcel::{Parcel, ParcelReader, WORD_SIZE};

//! Reply bodies.
//!
//! A [`WireReply`] is what a handler's output becomes on the wire. Encoding
//! also yields the transport status of the transaction; for every reply type
//! except [`TransportReply`] that status is [`Status::OK`], so business
//! results travel in the body.

use crate::codec::{Parcel, ParcelReader};
use crate::error::DecodeError;

use super::Status;

/// Handler output with a fixed reply encoding.
pub trait WireReply: Sized {
    /// Write the reply body and return the transport status.
    fn encode(&self, reply: &mut Parcel) -> Status;

    /// Read the reply body (client side, transport status already OK).
    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError>;
}

/// No reply body.
impl WireReply for () {
    fn encode(&self, _reply: &mut Parcel) -> Status {
        Status::OK
    }

    fn decode(_reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

/// A single int32 business status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReply(pub i32);

impl WireReply for StatusReply {
    fn encode(&self, reply: &mut Parcel) -> Status {
        reply.write_i32(self.0);
        Status::OK
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        reader.read_i32().map(StatusReply)
    }
}

/// Current WFD output size plus the business status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WfdResolution {
    pub width: u32,
    pub height: u32,
    pub status: i32,
}

impl WireReply for WfdResolution {
    fn encode(&self, reply: &mut Parcel) -> Status {
        reply.write_u32(self.width);
        reply.write_u32(self.height);
        reply.write_i32(self.status);
        Status::OK
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            width: reader.read_u32()?,
            height: reader.read_u32()?,
            status: reader.read_i32()?,
        })
    }
}

/// Handler result carried as the transport status, with no body.
///
/// Deployed clients of these opcodes look at nothing but the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportReply(pub i32);

impl WireReply for TransportReply {
    fn encode(&self, _reply: &mut Parcel) -> Status {
        Status(self.0)
    }

    fn decode(_reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        // Only reached when the transport status was OK.
        Ok(TransportReply(Status::OK.code()))
    }
}

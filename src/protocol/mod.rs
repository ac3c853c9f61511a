//! Protocol module - opcode table, status codes, reply bodies and framing.
//!
//! This module implements everything both peers must agree on:
//! - The opcode table with per-operation request and reply schemas
//! - Transport status codes
//! - Reply body encodings
//! - 17-byte socket frame header and the frame buffer for partial reads

mod frame;
mod frame_buffer;
mod opcode;
mod reply;
mod status;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use opcode::{
    ClientMode, Opcode, OpcodeInfo, OpcodeRange, OpcodeTable, ServerMode, DEBUG_RANGE_START,
    EXTENDED_RANGE_START, SERVICE_DESCRIPTOR,
};
pub use reply::{StatusReply, TransportReply, WfdResolution, WireReply};
pub use status::Status;
pub use wire_format::{flags, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};

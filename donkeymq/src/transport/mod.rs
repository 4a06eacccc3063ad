//! Implements low level transport: protocol header negotiation and framing
//!
//! Two layers are involved.
//! layer 0: the 8-byte protocol header exchanged right after the stream is opened
//! layer 1: frames, each one prefixed with a [`FrameHeader`], handled by [`FrameCodec`]

pub mod error;
pub mod frame;
pub mod frame_header;
pub mod negotiation;
pub mod protocol_header;

pub use donkeymq_types::definitions::{FRAME_TYPE_AMQP, FRAME_TYPE_SASL};
pub use error::{FrameHeaderError, FramingError, NegotiationError};
pub use frame::{FrameCodec, RawFrame};
pub use frame_header::FrameHeader;
pub use negotiation::{
    negotiate_as_client, negotiate_as_server, Negotiated, Negotiator, DEFAULT_NEGOTIATION_TIMEOUT,
};
pub use protocol_header::{ProtocolHeader, ProtocolId};

//! Definitions used by the transport layer

/// 2.8.19 Constant definition
mod constant_def;
pub use constant_def::{
    FRAME_HEADER_SIZE, FRAME_TYPE_AMQP, FRAME_TYPE_SASL, MAJOR, MINOR, MIN_DATA_OFFSET,
    MIN_MAX_FRAME_SIZE, PORT, PROTOCOL_HEADER_SIZE, REVISION, SECURE_PORT,
};

mod role;
pub use role::Role;

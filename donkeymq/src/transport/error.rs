//! Errors of the transport layer

use std::{io, time::Duration};

use donkeymq_types::{definitions::PROTOCOL_HEADER_SIZE, states::NegotiationState};

/// Errors that end a protocol header negotiation without an outcome
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// The stream ended before a full protocol header was read
    #[error("Handshake incomplete, stream ended after {received} of 8 bytes")]
    HandshakeIncomplete {
        /// Number of header bytes that did arrive
        received: usize,
    },

    /// A full protocol header was exchanged but it is not the one this peer supports
    #[error("Protocol header mismatch {received:?}")]
    VersionMismatch {
        /// The header sent by the remote peer
        received: [u8; PROTOCOL_HEADER_SIZE],
    },

    /// The remote peer did not send its header in time
    #[error("Timed out after {0:?} waiting for protocol header")]
    Timeout(Duration),

    /// The negotiation was aborted by a shutdown request
    #[error("Negotiation cancelled")]
    Cancelled,

    /// The negotiation was started from a state other than `Start`
    #[error("Unexpected negotiation state {0:?}")]
    UnexpectedState(NegotiationState),
}

/// Violations of the frame header invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameHeaderError {
    /// Fewer than 8 bytes were given to decode a frame header
    #[error("Frame header needs 8 bytes, only {0} available")]
    Incomplete(usize),

    /// The declared frame size cannot even hold the fixed header
    #[error("Frame size {0} is smaller than the frame header")]
    SizeTooSmall(u32),

    /// Data offset below the 2-word minimum
    #[error("Invalid data offset {0}")]
    InvalidDataOffset(u8),

    /// Data offset points beyond the end of the frame
    #[error("Data offset {data_offset} exceeds frame size {size}")]
    DataOffsetExceedsSize {
        /// Offset in 4-byte words
        data_offset: u8,
        /// Total frame size in bytes
        size: u32,
    },
}

/// Errors of [`crate::transport::FrameCodec`]
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// Malformed frame header
    #[error(transparent)]
    Header(#[from] FrameHeaderError),

    /// The frame is larger than the negotiated maximum
    #[error("Frame size {size} exceeds max frame size {max}")]
    MaxFrameSizeExceeded {
        /// Size of the offending frame
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// The extended header must fill a whole number of 4-byte words
    #[error("Extended header of {0} bytes is not 4-byte aligned")]
    UnalignedExtendedHeader(usize),

    /// The extended header does not fit in a one-byte data offset
    #[error("Extended header of {0} bytes is too long")]
    ExtendedHeaderTooLong(usize),
}

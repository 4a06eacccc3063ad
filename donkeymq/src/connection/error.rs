//! Implements errors associated with opening a connection

use std::io;

use donkeymq_types::{definitions::PROTOCOL_HEADER_SIZE, states::NegotiationState};

use crate::transport::NegotiationError;

/// Error opening a [`crate::Connection`]
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// Error parsing the url
    #[error(transparent)]
    UrlError(#[from] url::ParseError),

    /// Domain is invalid or not found
    #[error("Invalid domain")]
    InvalidDomain,

    /// Scheme is invalid or not found
    #[error(r#"Invalid scheme. Only "amqp" is supported."#)]
    InvalidScheme,

    /// Protocol negotiation failed due to protocol header mismatch
    #[error("Protocol header mismatch. Found {0:?}")]
    ProtocolHeaderMismatch([u8; PROTOCOL_HEADER_SIZE]),

    /// The remote peer closed the stream before sending a full protocol header
    #[error("Handshake incomplete, received {0} of 8 bytes")]
    HandshakeIncomplete(usize),

    /// The remote peer did not answer in time
    #[error("Timed out waiting for the remote protocol header")]
    Timeout,

    /// Opening was aborted by a shutdown request
    #[error("Connection open cancelled")]
    Cancelled,

    /// The negotiator had already left the start state
    #[error("Negotiation cannot start from state {0:?}")]
    UnexpectedState(NegotiationState),
}

impl From<NegotiationError> for OpenError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Io(err) => Self::Io(err),
            NegotiationError::HandshakeIncomplete { received } => {
                Self::HandshakeIncomplete(received)
            }
            NegotiationError::VersionMismatch { received } => {
                Self::ProtocolHeaderMismatch(received)
            }
            NegotiationError::Timeout(_) => Self::Timeout,
            NegotiationError::Cancelled => Self::Cancelled,
            NegotiationError::UnexpectedState(state) => Self::UnexpectedState(state),
        }
    }
}

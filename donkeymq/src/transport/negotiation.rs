//! Protocol header negotiation
//!
//! Both peers send the protocol header they support and compare it with the
//! one they receive. The client speaks first. The server listens first and then
//! always answers with its own header, even when the client's header did not
//! match, so that the client can detect the incompatibility on its side.
//!
//! A mismatch is a successful exchange with an incompatible result and is
//! reported as [`Negotiated::Mismatched`]. The stream is never closed here;
//! what happens next is decided by whoever owns it.

use std::{io, time::Duration};

use donkeymq_types::{
    definitions::{Role, PROTOCOL_HEADER_SIZE},
    states::NegotiationState,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::{
    error::NegotiationError,
    protocol_header::{self, ProtocolHeader},
};

/// Default bound on how long to wait for the remote protocol header
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal outcome of a protocol header exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiated {
    /// The remote peer sent the header this peer supports
    Matched(ProtocolHeader),

    /// The remote peer sent a full header that is not the supported one
    Mismatched {
        /// The header bytes sent by the remote peer
        received: [u8; PROTOCOL_HEADER_SIZE],
    },
}

impl Negotiated {
    fn from_received(received: [u8; PROTOCOL_HEADER_SIZE]) -> Self {
        if protocol_header::matches(&received) {
            Self::Matched(ProtocolHeader::amqp())
        } else {
            Self::Mismatched { received }
        }
    }

    /// Returns whether the headers matched
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// The terminal state this outcome corresponds to
    pub fn state(&self) -> NegotiationState {
        match self {
            Self::Matched(_) => NegotiationState::Matched,
            Self::Mismatched { .. } => NegotiationState::Mismatched,
        }
    }

    /// Turns a mismatch into [`NegotiationError::VersionMismatch`]
    pub fn into_result(self) -> Result<ProtocolHeader, NegotiationError> {
        match self {
            Self::Matched(header) => Ok(header),
            Self::Mismatched { received } => Err(NegotiationError::VersionMismatch { received }),
        }
    }
}

/// Drives one protocol header exchange for one role
///
/// # Example
///
/// ```rust,ignore
/// use donkeymq::transport::Negotiator;
///
/// let mut stream = tokio::net::TcpStream::connect("localhost:5672").await?;
/// let outcome = Negotiator::client()
///     .timeout(Duration::from_secs(5))
///     .negotiate(&mut stream)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Negotiator {
    role: Role,
    state: NegotiationState,
    timeout: Option<Duration>,
    shutdown: Option<CancellationToken>,
}

impl Negotiator {
    /// Creates a negotiator for the given role with the default timeout
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: NegotiationState::Start,
            timeout: Some(DEFAULT_NEGOTIATION_TIMEOUT),
            shutdown: None,
        }
    }

    /// Creates a negotiator that sends its header first
    pub fn client() -> Self {
        Self::new(Role::Client)
    }

    /// Creates a negotiator that waits for the remote header first
    pub fn server() -> Self {
        Self::new(Role::Server)
    }

    /// Bound on how long to wait for the remote header. `None` or a zero
    /// duration waits forever.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into().filter(|d| !d.is_zero());
        self
    }

    /// Token whose cancellation aborts a pending wait for the remote header
    pub fn shutdown(mut self, token: impl Into<Option<CancellationToken>>) -> Self {
        self.shutdown = token.into();
        self
    }

    /// The role played in the exchange
    pub fn role(&self) -> Role {
        self.role
    }

    /// The current state of the exchange
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Exchanges protocol headers over `io`.
    ///
    /// Exactly one 8-byte header is written and one is read. Only the read may
    /// be interrupted by the timeout or the shutdown token, so an aborted
    /// negotiation never leaves a partially written header behind.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(role = ?self.role)))]
    pub async fn negotiate<Io>(&mut self, io: &mut Io) -> Result<Negotiated, NegotiationError>
    where
        Io: AsyncRead + AsyncWrite + Unpin,
    {
        if self.state != NegotiationState::Start {
            return Err(NegotiationError::UnexpectedState(self.state));
        }

        let received = match self.role {
            Role::Client => {
                send_proto_header(io).await?;
                self.state = NegotiationState::HeaderSent;
                self.recv_proto_header(io).await?
            }
            Role::Server => {
                let received = self.recv_proto_header(io).await?;
                self.state = NegotiationState::HeaderReceived;
                send_proto_header(io).await?;
                received
            }
        };

        let outcome = Negotiated::from_received(received);
        self.state = outcome.state();

        match &outcome {
            Negotiated::Matched(_header) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Protocol header matched {:?}", _header);
                #[cfg(feature = "log")]
                log::debug!("Protocol header matched {:?}", _header);
            }
            Negotiated::Mismatched { received: _received } => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Protocol header mismatch, received {:x?}", _received);
                #[cfg(feature = "log")]
                log::warn!("Protocol header mismatch, received {:x?}", _received);
            }
        }

        Ok(outcome)
    }

    async fn recv_proto_header<Io>(
        &self,
        io: &mut Io,
    ) -> Result<[u8; PROTOCOL_HEADER_SIZE], NegotiationError>
    where
        Io: AsyncRead + Unpin,
    {
        let timeout = self.timeout;
        let read = async move {
            match timeout {
                Some(duration) => tokio::time::timeout(duration, read_proto_header(io))
                    .await
                    .unwrap_or(Err(NegotiationError::Timeout(duration))),
                None => read_proto_header(io).await,
            }
        };

        match &self.shutdown {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(NegotiationError::Cancelled),
                    result = read => result,
                }
            }
            None => read.await,
        }
    }
}

/// Runs the client side of the exchange with the default settings
pub async fn negotiate_as_client<Io>(io: &mut Io) -> Result<Negotiated, NegotiationError>
where
    Io: AsyncRead + AsyncWrite + Unpin,
{
    Negotiator::client().negotiate(io).await
}

/// Runs the server side of the exchange with the default settings
pub async fn negotiate_as_server<Io>(io: &mut Io) -> Result<Negotiated, NegotiationError>
where
    Io: AsyncRead + AsyncWrite + Unpin,
{
    Negotiator::server().negotiate(io).await
}

async fn send_proto_header<Io>(io: &mut Io) -> Result<(), NegotiationError>
where
    Io: AsyncWrite + Unpin,
{
    io.write_all(&protocol_header::encode()).await?;
    io.flush().await?;
    Ok(())
}

/// Reads until a full header is collected. A single read may return fewer
/// than 8 bytes.
async fn read_proto_header<Io>(io: &mut Io) -> Result<[u8; PROTOCOL_HEADER_SIZE], NegotiationError>
where
    Io: AsyncRead + Unpin,
{
    let mut buf = [0u8; PROTOCOL_HEADER_SIZE];
    let mut filled = 0;
    while filled < buf.len() {
        match io.read(&mut buf[filled..]).await {
            Ok(0) => return Err(NegotiationError::HandshakeIncomplete { received: filled }),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(buf)
}

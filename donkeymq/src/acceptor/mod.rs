//! Server side connection acceptance

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::{
    connection::{Connection, OpenError},
    transport::Negotiator,
};

mod builder;
pub use builder::Builder;

mod listener;
pub use listener::{Listener, DEFAULT_BIND_ADDR};

/// Acceptor for an incoming connection
///
/// # Accepts incoming connection with the default configuration.
///
/// ```rust, ignore
/// use tokio::net::TcpListener;
/// use donkeymq::acceptor::ConnectionAcceptor;
///
/// let tcp_listener = TcpListener::bind("localhost:5672").await.unwrap();
/// let connection_acceptor = ConnectionAcceptor::new();
///
/// if let Ok((stream, addr)) = tcp_listener.accept().await {
///     // Any type that implements `AsyncRead` and `AsyncWrite` can be used
///     let connection = connection_acceptor.accept(stream).await.unwrap();
/// }
/// ```
///
/// ## Default configuration
///
/// | Field | Default Value |
/// |-------|---------------|
/// |`negotiation_timeout`| [`crate::transport::DEFAULT_NEGOTIATION_TIMEOUT`] |
/// |`max_frame_size`| [`donkeymq_types::definitions::MIN_MAX_FRAME_SIZE`] |
///
/// # Customize configuration
///
/// ```rust
/// use std::time::Duration;
/// use donkeymq::acceptor::ConnectionAcceptor;
///
/// let connection_acceptor = ConnectionAcceptor::builder()
///     .negotiation_timeout(Duration::from_secs(5))
///     .max_frame_size(4096) // Customize max frame size
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionAcceptor {
    /// Bound on the wait for the remote protocol header
    pub negotiation_timeout: Option<Duration>,

    /// Max frame size of the accepted connections
    pub max_frame_size: usize,
}

impl Default for ConnectionAcceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionAcceptor {
    /// Creates a default [`ConnectionAcceptor`]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for [`ConnectionAcceptor`]
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Convert the acceptor into a builder. This allows users changing
    /// particular field of the acceptor.
    pub fn into_builder(self) -> Builder {
        Builder { inner: self }
    }

    /// Negotiates the protocol header over an incoming stream.
    ///
    /// The supported header is always sent back, even when the remote header
    /// does not match, before the mismatch is reported.
    pub async fn accept<Io>(&self, stream: Io) -> Result<Connection<Io>, OpenError>
    where
        Io: AsyncRead + AsyncWrite + Unpin,
    {
        self.negotiate(stream, None).await
    }

    /// Same as [`accept`](Self::accept), but a pending wait for the remote
    /// header is aborted when `shutdown` is cancelled
    pub async fn accept_with_shutdown<Io>(
        &self,
        stream: Io,
        shutdown: CancellationToken,
    ) -> Result<Connection<Io>, OpenError>
    where
        Io: AsyncRead + AsyncWrite + Unpin,
    {
        self.negotiate(stream, Some(shutdown)).await
    }

    async fn negotiate<Io>(
        &self,
        mut stream: Io,
        shutdown: Option<CancellationToken>,
    ) -> Result<Connection<Io>, OpenError>
    where
        Io: AsyncRead + AsyncWrite + Unpin,
    {
        let mut negotiator = Negotiator::server()
            .timeout(self.negotiation_timeout)
            .shutdown(shutdown);
        let remote_header = negotiator.negotiate(&mut stream).await?.into_result()?;
        Ok(Connection::new(stream, remote_header, self.max_frame_size))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_test::io::Builder as MockBuilder;
    use tokio_util::sync::CancellationToken;

    use super::ConnectionAcceptor;
    use crate::{connection::OpenError, transport::protocol_header::encode};

    #[tokio::test]
    async fn accept_matching_client() {
        let mock = MockBuilder::new().read(&encode()).write(&encode()).build();
        let acceptor = ConnectionAcceptor::new();
        let connection = acceptor.accept(mock).await.unwrap();
        assert!(connection.remote_header().is_supported());
        assert_eq!(connection.max_frame_size(), 512);
    }

    #[tokio::test]
    async fn accept_echoes_header_before_rejecting() {
        let (local, mut remote) = tokio::io::duplex(64);
        remote.write_all(b"AMQP\x02\x01\x00\x00").await.unwrap();

        let acceptor = ConnectionAcceptor::new();
        let err = acceptor.accept(local).await.unwrap_err();
        assert!(matches!(err, OpenError::ProtocolHeaderMismatch(_)));

        let mut echoed = [0u8; 8];
        remote.read_exact(&mut echoed).await.unwrap();
        assert_eq!(echoed, encode());
    }

    #[tokio::test(start_paused = true)]
    async fn accept_is_aborted_on_shutdown() {
        let (local, _remote) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();

        let acceptor = ConnectionAcceptor::builder()
            .negotiation_timeout(None)
            .build();
        let err = acceptor
            .accept_with_shutdown(local, token)
            .await
            .unwrap_err();
        assert!(matches!(err, OpenError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn accept_times_out_on_silent_client() {
        let (local, _remote) = tokio::io::duplex(64);
        let acceptor = ConnectionAcceptor::builder()
            .negotiation_timeout(Duration::from_millis(500))
            .build();
        let err = acceptor.accept(local).await.unwrap_err();
        assert!(matches!(err, OpenError::Timeout));
    }
}

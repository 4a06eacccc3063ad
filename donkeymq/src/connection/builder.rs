//! Builder for [`crate::Connection`]

use std::{convert::TryInto, time::Duration};

use donkeymq_types::definitions::{MIN_MAX_FRAME_SIZE, PORT};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::transport::{Negotiator, DEFAULT_NEGOTIATION_TIMEOUT};

use super::{Connection, OpenError};

/// Connection builder
///
/// | Field | Default Value |
/// |-------|---------------|
/// |`negotiation_timeout`| [`DEFAULT_NEGOTIATION_TIMEOUT`] |
/// |`max_frame_size`| [`MIN_MAX_FRAME_SIZE`] |
/// |`shutdown`| `None` |
#[derive(Debug, Clone)]
pub struct Builder {
    /// Bound on the wait for the remote protocol header
    pub negotiation_timeout: Option<Duration>,

    /// Max frame size used by [`Connection::into_framed`]
    pub max_frame_size: usize,

    /// Token that aborts opening when cancelled
    pub shutdown: Option<CancellationToken>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a builder with the default configuration
    pub fn new() -> Self {
        Self {
            negotiation_timeout: Some(DEFAULT_NEGOTIATION_TIMEOUT),
            // Prior to any explicit negotiation, the maximum frame size is 512 (MIN-MAX-FRAME-SIZE)
            max_frame_size: MIN_MAX_FRAME_SIZE,
            shutdown: None,
        }
    }

    /// Bound on the wait for the remote protocol header. `None` waits forever.
    pub fn negotiation_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.negotiation_timeout = timeout.into();
        self
    }

    /// Max frame size for the frames exchanged after negotiation. Values below
    /// [`MIN_MAX_FRAME_SIZE`] are raised to it.
    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = std::cmp::max(MIN_MAX_FRAME_SIZE, max_frame_size);
        self
    }

    /// Token whose cancellation aborts an in-flight open, both while
    /// connecting and while waiting for the remote protocol header
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Negotiates over an already established stream
    pub async fn open_with_stream<Io>(self, mut stream: Io) -> Result<Connection<Io>, OpenError>
    where
        Io: AsyncRead + AsyncWrite + Unpin,
    {
        let mut negotiator = Negotiator::client()
            .timeout(self.negotiation_timeout)
            .shutdown(self.shutdown);
        let remote_header = negotiator.negotiate(&mut stream).await?.into_result()?;

        Ok(Connection::new(stream, remote_header, self.max_frame_size))
    }

    /// Connects to an `amqp://host[:port]` url over TCP and negotiates. The port
    /// defaults to 5672.
    pub async fn open(
        self,
        url: impl TryInto<Url, Error = url::ParseError>,
    ) -> Result<Connection<TcpStream>, OpenError> {
        let url: Url = url.try_into()?;
        match url.scheme() {
            "amqp" => {}
            _ => return Err(OpenError::InvalidScheme),
        }
        if url.host_str().is_none() {
            return Err(OpenError::InvalidDomain);
        }

        let addrs = url.socket_addrs(|| Some(PORT))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Connecting to {:?}", addrs);
        #[cfg(feature = "log")]
        log::debug!("Connecting to {:?}", addrs);

        let stream = match &self.shutdown {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(OpenError::Cancelled),
                stream = TcpStream::connect(&*addrs) => stream?,
            },
            None => TcpStream::connect(&*addrs).await?, // std::io::Error
        };
        self.open_with_stream(stream).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::io::Builder as MockBuilder;
    use tokio_util::sync::CancellationToken;

    use super::Builder;
    use crate::{
        connection::OpenError,
        transport::{protocol_header::encode, ProtocolHeader},
    };

    #[test]
    fn test_url_name_resolution() {
        let url = url::Url::parse("amqp://localhost/").unwrap();
        let addrs = url.socket_addrs(|| Some(5672)).unwrap();
        assert!(addrs.iter().all(|addr| addr.port() == 5672));
    }

    #[test]
    fn max_frame_size_has_a_floor() {
        let builder = Builder::new().max_frame_size(64);
        assert_eq!(builder.max_frame_size, 512);
        let builder = builder.max_frame_size(4096);
        assert_eq!(builder.max_frame_size, 4096);
    }

    #[tokio::test]
    async fn open_with_stream_keeps_remote_header() {
        let mock = MockBuilder::new().write(&encode()).read(&encode()).build();
        let connection = Builder::new()
            .negotiation_timeout(Duration::from_secs(1))
            .open_with_stream(mock)
            .await
            .unwrap();
        assert_eq!(connection.remote_header(), &ProtocolHeader::amqp());
    }

    #[tokio::test]
    async fn open_with_stream_reports_mismatch() {
        let mock = MockBuilder::new()
            .write(&encode())
            .read(b"AMQP\x03\x01\x00\x00")
            .build();
        let err = Builder::new().open_with_stream(mock).await.unwrap_err();
        assert!(matches!(err, OpenError::ProtocolHeaderMismatch(buf) if &buf == b"AMQP\x03\x01\x00\x00"));
    }

    #[tokio::test]
    async fn open_rejects_unknown_scheme() {
        let err = Builder::new().open("amqps://localhost").await.unwrap_err();
        assert!(matches!(err, OpenError::InvalidScheme));

        let err = Builder::new().open("not a url").await.unwrap_err();
        assert!(matches!(err, OpenError::UrlError(_)));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_connect() {
        let token = CancellationToken::new();
        token.cancel();

        // Non-routable address, a plain connect would hang until the OS gives up
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            Builder::new().shutdown(token).open("amqp://10.255.255.1:5672"),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, OpenError::Cancelled));
    }
}

//! Client side connection
//!
//! A [`Connection`] is a stream over which the protocol headers have been
//! exchanged and matched. Frames can then be exchanged with
//! [`Connection::into_framed`].

use std::convert::TryInto;

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tokio_util::codec::Framed;
use url::Url;

use crate::transport::{FrameCodec, ProtocolHeader};

mod builder;
pub use builder::*;

mod error;
pub use error::*;

/// A negotiated connection
///
/// # Open with default configuration
///
/// ```rust,ignore
/// use donkeymq::Connection;
///
/// let connection = Connection::open("amqp://localhost:5672").await.unwrap();
/// connection.close().await.unwrap();
/// ```
///
/// # Customize configuration with [`Builder`]
///
/// ```rust,ignore
/// let connection = Connection::builder()
///     .negotiation_timeout(Duration::from_secs(5))
///     .max_frame_size(4096)
///     .open("amqp://localhost:5672")
///     .await
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct Connection<Io> {
    stream: Io,
    remote_header: ProtocolHeader,
    max_frame_size: usize,
}

impl Connection<TcpStream> {
    /// Creates a [`Builder`] for [`Connection`]
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Connects to the url with the default configuration
    pub async fn open(
        url: impl TryInto<Url, Error = url::ParseError>,
    ) -> Result<Self, OpenError> {
        Builder::new().open(url).await
    }
}

impl<Io> Connection<Io>
where
    Io: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: Io, remote_header: ProtocolHeader, max_frame_size: usize) -> Self {
        Self {
            stream,
            remote_header,
            max_frame_size,
        }
    }

    /// The protocol header sent by the remote peer
    pub fn remote_header(&self) -> &ProtocolHeader {
        &self.remote_header
    }

    /// Max frame size used when framing the stream
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> &Io {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> &mut Io {
        &mut self.stream
    }

    /// Consume the connection to get the underlying stream
    pub fn into_inner(self) -> Io {
        self.stream
    }

    /// Wrap the stream in a [`FrameCodec`] to exchange frames
    pub fn into_framed(self) -> Framed<Io, FrameCodec> {
        Framed::new(self.stream, FrameCodec::new(self.max_frame_size))
    }

    /// Shuts down the write half of the stream
    pub async fn close(mut self) -> Result<(), std::io::Error> {
        self.stream.shutdown().await
    }
}

//! TCP listener that negotiates every incoming connection

use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
};

use donkeymq_types::definitions::PORT;
use tokio::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use crate::connection::{Connection, OpenError};

use super::ConnectionAcceptor;

/// `0.0.0.0:5672`
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PORT));

/// Accepts TCP connections and runs the server side of the protocol header
/// exchange on each of them
///
/// ```rust,ignore
/// use donkeymq::acceptor::{ConnectionAcceptor, Listener, DEFAULT_BIND_ADDR};
/// use tokio_util::sync::CancellationToken;
///
/// let listener = Listener::bind(DEFAULT_BIND_ADDR, ConnectionAcceptor::new()).await?;
/// let shutdown = CancellationToken::new();
/// listener
///     .serve(shutdown.clone(), |connection, addr| async move {
///         // exchange frames over `connection.into_framed()`
///     })
///     .await?;
/// ```
#[derive(Debug)]
pub struct Listener {
    tcp: TcpListener,
    acceptor: ConnectionAcceptor,
}

impl Listener {
    /// Binds a TCP listener to `addr`
    pub async fn bind(addr: impl ToSocketAddrs, acceptor: ConnectionAcceptor) -> io::Result<Self> {
        let tcp = TcpListener::bind(addr).await?;

        #[cfg(feature = "tracing")]
        tracing::info!("Serving on {:?}", tcp.local_addr());
        #[cfg(feature = "log")]
        log::info!("Serving on {:?}", tcp.local_addr());

        Ok(Self { tcp, acceptor })
    }

    /// Wraps an already bound TCP listener
    pub fn from_tcp(tcp: TcpListener, acceptor: ConnectionAcceptor) -> Self {
        Self { tcp, acceptor }
    }

    /// The local address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp.local_addr()
    }

    /// The acceptor used for incoming connections
    pub fn acceptor(&self) -> &ConnectionAcceptor {
        &self.acceptor
    }

    /// Accepts and negotiates a single connection
    pub async fn accept(&self) -> Result<(Connection<TcpStream>, SocketAddr), OpenError> {
        let (stream, addr) = self.tcp.accept().await?;
        let connection = self.acceptor.accept(stream).await?;
        Ok((connection, addr))
    }

    /// Accepts connections until `shutdown` is cancelled.
    ///
    /// Each connection is negotiated in its own task, so a slow peer never
    /// holds up the others. Connections that negotiate successfully are handed
    /// to `handler`; the rest are dropped. On shutdown, pending negotiations
    /// and running handlers are abandoned and every task is joined before this
    /// returns.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn serve<F, Fut>(self, shutdown: CancellationToken, handler: F) -> io::Result<()>
    where
        F: Fn(Connection<TcpStream>, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let tasks_token = shutdown.child_token();
        let mut tasks = JoinSet::new();

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break Ok(()),
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(_err) = joined {
                        #[cfg(feature = "tracing")]
                        tracing::error!("Connection task failed {:?}", _err);
                        #[cfg(feature = "log")]
                        log::error!("Connection task failed {:?}", _err);
                    }
                }
                accepted = self.tcp.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) if is_transient(&err) => continue,
                        Err(err) => break Err(err),
                    };

                    let acceptor = self.acceptor.clone();
                    let handler = handler.clone();
                    let token = tasks_token.child_token();
                    tasks.spawn(async move {
                        let connection = match acceptor.accept_with_shutdown(stream, token.clone()).await {
                            Ok(connection) => connection,
                            Err(_err) => {
                                #[cfg(feature = "tracing")]
                                tracing::warn!("Negotiation with {} failed {:?}", addr, _err);
                                #[cfg(feature = "log")]
                                log::warn!("Negotiation with {} failed {:?}", addr, _err);
                                return;
                            }
                        };

                        #[cfg(feature = "tracing")]
                        tracing::debug!("Negotiated connection with {}", addr);
                        #[cfg(feature = "log")]
                        log::debug!("Negotiated connection with {}", addr);

                        tokio::select! {
                            _ = token.cancelled() => {},
                            _ = handler(connection, addr) => {},
                        }
                    });
                }
            }
        };

        // Also reached on a fatal accept error, where `shutdown` itself is not cancelled
        tasks_token.cancel();
        while tasks.join_next().await.is_some() {}

        result
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}

//! Builder for acceptors

use std::time::Duration;

use donkeymq_types::definitions::MIN_MAX_FRAME_SIZE;

use crate::transport::DEFAULT_NEGOTIATION_TIMEOUT;

use super::ConnectionAcceptor;

/// Builder for [`ConnectionAcceptor`]
#[derive(Debug)]
pub struct Builder {
    pub(crate) inner: ConnectionAcceptor,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a new Builder for `ConnectionAcceptor`
    pub fn new() -> Self {
        let inner = ConnectionAcceptor {
            negotiation_timeout: Some(DEFAULT_NEGOTIATION_TIMEOUT),
            max_frame_size: MIN_MAX_FRAME_SIZE,
        };

        Self { inner }
    }

    /// Bound on the wait for the remote protocol header. `None` waits forever,
    /// which leaves a silent client holding its task until shutdown.
    pub fn negotiation_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.inner.negotiation_timeout = timeout.into();
        self
    }

    /// Max frame size of the accepted connections
    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.inner.max_frame_size = std::cmp::max(MIN_MAX_FRAME_SIZE, max_frame_size);
        self
    }

    /// Build the instance
    pub fn build(self) -> ConnectionAcceptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::acceptor::ConnectionAcceptor;

    #[test]
    fn into_builder_keeps_fields() {
        let acceptor = ConnectionAcceptor::builder()
            .negotiation_timeout(Duration::from_secs(3))
            .max_frame_size(100)
            .build();
        assert_eq!(acceptor.max_frame_size, 512);

        let acceptor = acceptor.into_builder().max_frame_size(2048).build();
        assert_eq!(acceptor.negotiation_timeout, Some(Duration::from_secs(3)));
        assert_eq!(acceptor.max_frame_size, 2048);
    }
}

//! Definition of the protocol header negotiation state

/// Negotiation states, following the header states of the connection state
/// machine in the AMQP 1.0 Protocol Part 2.4.6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// In this state a connection exists, but nothing has been sent or received. This is the state an
    /// implementation would be in immediately after performing a socket connect or socket accept
    Start,

    /// In this state the protocol header has been sent to the peer but no protocol header has
    /// been received.
    HeaderSent,

    /// In this state the protocol header has been received from the peer but a protocol header
    /// has not been sent.
    HeaderReceived,

    /// Both headers have been exchanged and the remote header equals the local one
    Matched,

    /// Both headers have been exchanged but the remote header differs from the local one.
    /// The connection is left open; what happens next is up to the owner of the connection.
    Mismatched,
}

impl NegotiationState {
    /// Returns whether the negotiation reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Matched | NegotiationState::Mismatched)
    }
}

impl Default for NegotiationState {
    fn default() -> Self {
        Self::Start
    }
}

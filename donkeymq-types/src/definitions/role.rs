/// Which side of the protocol header exchange a peer plays
///
/// Both roles share one handshake grammar and only differ in who speaks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends its header first, then waits for the peer's
    Client,
    /// Waits for the peer's header, then always answers with its own
    Server,
}

impl Role {
    /// Returns whether this is the client role
    pub fn is_client(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// Returns whether this is the server role
    pub fn is_server(&self) -> bool {
        matches!(self, Role::Server)
    }
}

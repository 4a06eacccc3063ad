
/// the IANA assigned port number for AMQP.
/// The standard AMQP port number that has been assigned
/// by IANA for TCP, UDP, and SCTP.
pub const PORT: u16 = 5672;

/// the IANA assigned port number for secure AMQP (amqps).
/// Implementations listening on this port SHOULD NOT expect a protocol handshake before TLS is negotiated.
pub const SECURE_PORT: u16 = 5671;

/// major protocol version.
pub const MAJOR: u8 = 1;

///  minor protocol version.
pub const MINOR: u8 = 0;

/// protocol revision
pub const REVISION: u8 = 0;

/// the lower bound for the agreed maximum frame size (in
/// bytes).
/// Until the peers have agreed a definitive maximum frame size for a connection,
/// they can rely on frames of up to this size being accepted.
pub const MIN_MAX_FRAME_SIZE: usize = 512;

/// Length of the protocol header exchanged before any frame
pub const PROTOCOL_HEADER_SIZE: usize = 8;

/// Length of the fixed part of a frame header
pub const FRAME_HEADER_SIZE: usize = 8;

/// Smallest legal data offset, in 4-byte words
pub const MIN_DATA_OFFSET: u8 = 2;

/// Frame type code of an AMQP frame
pub const FRAME_TYPE_AMQP: u8 = 0x00;

/// Frame type code of a SASL frame
pub const FRAME_TYPE_SASL: u8 = 0x01;

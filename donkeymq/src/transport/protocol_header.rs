//! Implements the protocol headers

use std::convert::{TryFrom, TryInto};

use bytes::Bytes;
use donkeymq_types::definitions::{MAJOR, MINOR, PROTOCOL_HEADER_SIZE, REVISION};

const PROTOCOL_HEADER_PREFIX: &[u8; 4] = b"AMQP";

/// The only protocol header this peer emits or accepts: `AMQP` followed by the
/// plain AMQP layer id and version 1.0.0
pub const AMQP_PROTOCOL_HEADER: [u8; PROTOCOL_HEADER_SIZE] = [
    PROTOCOL_HEADER_PREFIX[0], // b'A'
    PROTOCOL_HEADER_PREFIX[1], // b'M'
    PROTOCOL_HEADER_PREFIX[2], // b'Q'
    PROTOCOL_HEADER_PREFIX[3], // b'P'
    ProtocolId::Amqp as u8,
    MAJOR,
    MINOR,
    REVISION,
];

/// Returns the canonical protocol header bytes
pub fn encode() -> [u8; PROTOCOL_HEADER_SIZE] {
    AMQP_PROTOCOL_HEADER
}

/// Returns whether `candidate` is byte-for-byte the canonical protocol header.
///
/// A candidate of any length other than 8 simply does not match.
pub fn matches(candidate: &[u8]) -> bool {
    candidate == &AMQP_PROTOCOL_HEADER[..]
}

/// Protocol header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    /// Protocol ID
    pub id: ProtocolId,

    /// Major number
    pub major: u8,

    /// Minor number
    pub minor: u8,

    /// Revision number
    pub revision: u8,
}

impl Default for ProtocolHeader {
    fn default() -> Self {
        Self::amqp()
    }
}

impl ProtocolHeader {
    /// Creates a new protocol header
    pub fn new(id: ProtocolId, major: u8, minor: u8, revision: u8) -> Self {
        Self {
            id,
            major,
            minor,
            revision,
        }
    }

    /// Creates an AMQP protocol header
    pub fn amqp() -> Self {
        Self::new(ProtocolId::Amqp, MAJOR, MINOR, REVISION)
    }

    /// Creates a TLS protocol header
    pub fn tls() -> Self {
        Self::new(ProtocolId::Tls, MAJOR, MINOR, REVISION)
    }

    /// Creates a SASL protocol header
    pub fn sasl() -> Self {
        Self::new(ProtocolId::Sasl, MAJOR, MINOR, REVISION)
    }

    /// Returns whether the protocol id is AMQP
    pub fn is_amqp(&self) -> bool {
        matches!(self.id, ProtocolId::Amqp)
    }

    /// Returns whether the protocol id is TLS
    pub fn is_tls(&self) -> bool {
        matches!(self.id, ProtocolId::Tls)
    }

    /// Returns whether the protocol id is SASL
    pub fn is_sasl(&self) -> bool {
        matches!(self.id, ProtocolId::Sasl)
    }

    /// Returns whether this header is the one this peer supports
    pub fn is_supported(&self) -> bool {
        *self == Self::amqp()
    }
}

impl From<ProtocolHeader> for [u8; PROTOCOL_HEADER_SIZE] {
    fn from(value: ProtocolHeader) -> Self {
        [
            PROTOCOL_HEADER_PREFIX[0],
            PROTOCOL_HEADER_PREFIX[1],
            PROTOCOL_HEADER_PREFIX[2],
            PROTOCOL_HEADER_PREFIX[3],
            value.id as u8,
            value.major,
            value.minor,
            value.revision,
        ]
    }
}

impl From<ProtocolHeader> for Bytes {
    fn from(header: ProtocolHeader) -> Self {
        let bytes: [u8; PROTOCOL_HEADER_SIZE] = header.into();
        Bytes::copy_from_slice(&bytes[..])
    }
}

impl TryFrom<[u8; PROTOCOL_HEADER_SIZE]> for ProtocolHeader {
    type Error = [u8; PROTOCOL_HEADER_SIZE];

    fn try_from(v: [u8; PROTOCOL_HEADER_SIZE]) -> Result<Self, Self::Error> {
        ProtocolHeader::try_from(&v[..]).map_err(|_| v)
    }
}

impl<'a> TryFrom<&'a [u8]> for ProtocolHeader {
    type Error = &'a [u8];

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        if value.len() != PROTOCOL_HEADER_SIZE {
            return Err(value);
        }

        if value[..4] != PROTOCOL_HEADER_PREFIX[..] {
            return Err(value);
        }

        let id = value[4].try_into().map_err(|_| value)?;

        Ok(Self::new(id, value[5], value[6], value[7]))
    }
}

/// Protocol ID
///
/// Only [`ProtocolId::Amqp`] is ever negotiated. The security layer ids are
/// recognised so that a peer asking for them can be reported precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolId {
    /// AMQP
    Amqp = 0x0,

    /// TLS
    Tls = 0x2,

    /// SASL
    Sasl = 0x3,
}

impl TryFrom<u8> for ProtocolId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let val = match value {
            0x0 => Self::Amqp,
            0x2 => Self::Tls,
            0x3 => Self::Sasl,
            _ => return Err(value),
        };
        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use bytes::Bytes;

    use super::{encode, matches, ProtocolHeader, ProtocolId};

    #[test]
    fn encode_is_the_canonical_amqp_header() {
        let first = encode();
        let second = encode();
        assert_eq!(first, [0x41, 0x4D, 0x51, 0x50, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&first[..], b"AMQP\x00\x01\x00\x00");
        assert_eq!(first, second);
    }

    #[test]
    fn matches_only_the_exact_header() {
        assert!(matches(&encode()));

        let mut other = encode();
        for i in 0..other.len() {
            other[i] ^= 0xff;
            assert!(!matches(&other), "byte {} flipped should not match", i);
            other[i] ^= 0xff;
        }

        // SASL layer and other versions
        assert!(!matches(b"AMQP\x03\x01\x00\x00"));
        assert!(!matches(b"AMQP\x00\x00\x09\x01"));
    }

    #[test]
    fn matches_rejects_other_lengths() {
        assert!(!matches(&[]));
        assert!(!matches(b"AMQP"));
        assert!(!matches(b"AMQP\x00\x01\x00"));
        assert!(!matches(b"AMQP\x00\x01\x00\x00\x00"));
    }

    #[test]
    fn header_into_bytes() {
        let buf: [u8; 8] = ProtocolHeader::amqp().into();
        assert_eq!(buf, encode());

        let bytes: Bytes = ProtocolHeader::sasl().into();
        assert_eq!(&bytes[..], b"AMQP\x03\x01\x00\x00");

        let buf: [u8; 8] = ProtocolHeader::tls().into();
        assert_eq!(&buf, b"AMQP\x02\x01\x00\x00");
    }

    #[test]
    fn layer_constructors() {
        assert!(ProtocolHeader::sasl().is_sasl());
        assert!(ProtocolHeader::tls().is_tls());
        assert!(!ProtocolHeader::sasl().is_supported());
        assert!(ProtocolHeader::amqp().is_supported());
    }

    #[test]
    fn parse_known_layers() {
        let header = ProtocolHeader::try_from(&b"AMQP\x02\x01\x00\x00"[..]).unwrap();
        assert!(header.is_tls());
        assert!(!header.is_supported());

        let header = ProtocolHeader::try_from(encode()).unwrap();
        assert!(header.is_amqp());
        assert!(header.is_supported());
        assert_eq!(header, ProtocolHeader::default());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ProtocolHeader::try_from(*b"HTTP/1.1").is_err());
        assert!(ProtocolHeader::try_from(&b"AMQP\x05\x01\x00\x00"[..]).is_err());
        assert!(ProtocolHeader::try_from(&b"AMQP\x00"[..]).is_err());
        assert_eq!(ProtocolId::try_from(0x01), Err(0x01));
    }
}

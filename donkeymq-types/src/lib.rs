#![deny(missing_docs, missing_debug_implementations)]

//! Wire constants and shared state definitions for the DonkeyMQ AMQP 1.0 transport.
//!
//! Only the parts of the [AMQP 1.0 specification](http://docs.oasis-open.org/amqp/core/v1.0/os/amqp-core-overview-v1.0-os.html)
//! that precede the exchange of performatives live here: the protocol version, the
//! well-known ports, and the fixed sizes of the frame envelope.

pub mod definitions;

pub mod states;

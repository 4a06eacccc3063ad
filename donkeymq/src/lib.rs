#![deny(missing_docs, missing_debug_implementations)]

//! The negotiation and framing layer of the DonkeyMQ AMQP 1.0 peer, based on tokio.
//!
//! Before any frame is exchanged, both peers send the 8-byte protocol header
//! `AMQP\x00\x01\x00\x00` and compare it with the one they receive. This crate
//! drives that exchange for both roles and describes the envelope of every
//! frame that follows.
//!
//! # Feature flags
//!
//! ```toml
//! default = []
//! ```
//!
//! | Feature | Description |
//! |---------|-------------|
//! |`"tracing"`| enables logging with `tracing` |
//! |`"log"`| enables logging with `log` |
//!
//! # Quick start
//!
//! ## Client
//!
//! ```rust,ignore
//! use donkeymq::Connection;
//!
//! let connection = Connection::open("amqp://localhost:5672").await.unwrap();
//! let framed = connection.into_framed();
//! ```
//!
//! ## Listener
//!
//! ```rust,ignore
//! use donkeymq::acceptor::{ConnectionAcceptor, Listener};
//! use tokio_util::sync::CancellationToken;
//!
//! let shutdown = CancellationToken::new();
//! let listener = Listener::bind("localhost:5672", ConnectionAcceptor::new()).await.unwrap();
//! listener.serve(shutdown, |connection, addr| async move { /* ... */ }).await.unwrap();
//! ```
//!
//! ## Bare negotiation over any stream
//!
//! ```rust,ignore
//! use donkeymq::transport::{Negotiated, Negotiator};
//!
//! match Negotiator::client().negotiate(&mut stream).await? {
//!     Negotiated::Matched(header) => { /* exchange frames */ }
//!     Negotiated::Mismatched { received } => { /* up to the caller */ }
//! }
//! ```

pub mod acceptor;
pub mod connection;
pub mod transport;

pub use connection::Connection;
pub use donkeymq_types as types;

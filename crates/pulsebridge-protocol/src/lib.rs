//! Wire protocol for Pulsebridge.
//!
//! This crate defines the "language" spoken between a bridge and its
//! remote collector:
//!
//! - **Types** ([`Envelope`], [`EventShape`]): the self-describing
//!   `{type, payload}` wrapper and the compile-time type tag that fills
//!   in the `type` field.
//! - **Codec** ([`encode`], [`encode_named`], [`decode`]): pure
//!   conversions between event values and wire text. No I/O.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below the bridge facade and above nothing:
//! it never touches the network. The bridge encodes here, then hands the
//! resulting text frame to the transport.
//!
//! ```text
//! event value → Protocol (Envelope text) → Transport (frames)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{decode, encode, encode_named};
pub use error::ProtocolError;
pub use types::{Envelope, EventShape};

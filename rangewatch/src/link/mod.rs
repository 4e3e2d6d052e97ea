//! Peer links.
//!
//! The two nodes exchange readings over persistent point-to-point TCP
//! channels, one integer stream per channel:
//!
//! - [`ReadingSender`] - connects out and pushes a reading on a fixed
//!   cadence (the motion node's distance stream, the reporter's
//!   temperature stream)
//! - [`ReadingReceiver`] - listens, accepts exactly one peer, and decodes
//!   readings into the observation state field its [`ReadingChannel`]
//!   selects
//!
//! # Wire format
//!
//! One reading per line: the decimal ASCII integer, terminated by `\n`.
//! The receiver parses the leading integer of each line and ignores
//! anything after it.
//!
//! # Failure model
//!
//! Connect, bind, and accept failures are surfaced to the caller, which
//! treats them as fatal to the process. A mid-stream send or receive
//! failure (including the peer closing) ends only the owning loop; there
//! is no reconnect and no second accept.

mod protocol;
mod receiver;
mod sender;

use std::io;

pub use protocol::{encode_reading, parse_reading};
pub use receiver::{ReadingChannel, ReadingReceiver, ReceiverConfig};
pub use sender::{LocalDistanceSource, ReadingSender, ReadingSource, SenderConfig};

/// Error type for peer-link setup and I/O.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Failed to bind the listening socket.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Failed to accept the peer connection.
    #[error("failed to accept a peer on port {port}: {source}")]
    Accept {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Failed to establish the outbound connection.
    #[error("failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: io::Error,
    },

    /// Failed to push a reading over an established connection.
    #[error("failed to send a reading to {peer}: {source}")]
    Send {
        peer: String,
        #[source]
        source: io::Error,
    },
}

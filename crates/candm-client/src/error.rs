// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for the chrony command client.
//!
//! Public operations return `io::Result<T>`. Internally, errors are constructed
//! as `ChronyError` variants and converted to `io::Error` via
//! `From<ChronyError> for io::Error`, so transport failures keep their original
//! kind while protocol failures stay inspectable.
//!
//! Users who want programmatic error matching can downcast via
//! `io::Error::get_ref()`:
//!
//! ```no_run
//! use candm_client::ChronyClient;
//! use candm_client::error::{ChronyError, ProtocolError};
//!
//! let mut client = ChronyClient::connect("127.0.0.1:323")?;
//! match client.tracking() {
//!     Ok(tracking) => println!("stratum {}", tracking.stratum),
//!     Err(e) => {
//!         if let Some(err) = e.get_ref().and_then(|inner| inner.downcast_ref::<ChronyError>()) {
//!             match err {
//!                 ChronyError::Protocol(ProtocolError::SequenceMismatch { .. }) => {
//!                     eprintln!("stale reply: {err}")
//!                 }
//!                 _ => eprintln!("chrony error: {err}"),
//!             }
//!         }
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub use candm_proto::error::ParseError;

use std::fmt;
use std::io;

/// Errors that can occur during chrony client operations.
#[derive(Debug)]
pub enum ChronyError {
    /// Reply failed validation against the request that elicited it.
    Protocol(ProtocolError),
    /// Operation timed out.
    Timeout(TimeoutError),
    /// Invalid configuration or request.
    Config(ConfigError),
    /// Underlying I/O error (socket bind, connect, send, receive).
    Io(io::Error),
}

/// Reply validation errors.
///
/// A datagram too short to hold the reply header is not a validation error;
/// it surfaces as a [`ParseError`] decode error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// Reply packet type is not CMD_Reply.
    UnexpectedPacketType {
        /// Packet type found in the reply.
        received: u8,
    },
    /// Reply sequence number does not echo the request's.
    SequenceMismatch {
        /// Sequence number sent.
        expected: u32,
        /// Sequence number received.
        received: u32,
    },
    /// Reply protocol version differs from the request's.
    VersionMismatch {
        /// Version sent.
        expected: u8,
        /// Version received.
        received: u8,
    },
    /// Reply passed validation but answers another command or carries
    /// another reply code than the one requested.
    UnexpectedReply {
        /// Command code found in the reply.
        command: u16,
        /// Reply code found in the reply.
        reply: u16,
        /// Raw status code found in the reply.
        status: u16,
    },
}

/// Timeout errors raised by runtime timers.
///
/// The blocking client relies on socket deadlines instead, whose expiry is
/// reported as a plain [`io::Error`] of kind `WouldBlock` or `TimedOut`
/// depending on the platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TimeoutError {
    /// Sending the request timed out.
    Send,
    /// Waiting for the reply timed out.
    Recv,
}

/// Configuration errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The request carries protocol version zero.
    VersionUnset,
    /// Address resolved to no socket addresses.
    NoAddresses {
        /// The address that failed to resolve.
        address: String,
    },
    /// The per-call timeout is zero.
    ZeroTimeout,
    /// The list of candidate protocol versions is empty.
    NoVersions,
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for ChronyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChronyError::Protocol(e) => write!(f, "chrony protocol error: {e}"),
            ChronyError::Timeout(e) => write!(f, "chrony timeout: {e}"),
            ChronyError::Config(e) => write!(f, "chrony config error: {e}"),
            ChronyError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnexpectedPacketType { received } => {
                write!(f, "unexpected packet type {received} (expected command reply)")
            }
            ProtocolError::SequenceMismatch { expected, received } => {
                write!(
                    f,
                    "sequence number mismatch: sent {expected:#010x}, got {received:#010x}"
                )
            }
            ProtocolError::VersionMismatch { expected, received } => {
                write!(
                    f,
                    "protocol version mismatch: sent {expected}, got {received}"
                )
            }
            ProtocolError::UnexpectedReply {
                command,
                reply,
                status,
            } => write!(
                f,
                "unexpected reply {reply} to command {command} (status {status})"
            ),
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::Send => write!(f, "chrony send timed out"),
            TimeoutError::Recv => write!(f, "chrony recv timed out"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::VersionUnset => write!(f, "protocol version is not set"),
            ConfigError::NoAddresses { address } => {
                write!(f, "address resolved to no socket addresses: {address}")
            }
            ConfigError::ZeroTimeout => write!(f, "timeout must be non-zero"),
            ConfigError::NoVersions => {
                write!(f, "at least one candidate protocol version is required")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for ChronyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChronyError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ProtocolError {}
impl std::error::Error for TimeoutError {}
impl std::error::Error for ConfigError {}

// ── From conversions ────────────────────────────────────────────────

impl From<ChronyError> for io::Error {
    fn from(err: ChronyError) -> io::Error {
        let kind = match &err {
            ChronyError::Protocol(_) => io::ErrorKind::InvalidData,
            ChronyError::Timeout(_) => io::ErrorKind::TimedOut,
            ChronyError::Config(_) => io::ErrorKind::InvalidInput,
            ChronyError::Io(e) => e.kind(),
        };
        // Preserve the original io::Error directly for the Io variant.
        if let ChronyError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}

impl From<io::Error> for ChronyError {
    fn from(err: io::Error) -> ChronyError {
        ChronyError::Io(err)
    }
}

impl From<ProtocolError> for ChronyError {
    fn from(err: ProtocolError) -> ChronyError {
        ChronyError::Protocol(err)
    }
}

impl From<ConfigError> for ChronyError {
    fn from(err: ConfigError) -> ChronyError {
        ChronyError::Config(err)
    }
}

impl From<TimeoutError> for ChronyError {
    fn from(err: TimeoutError) -> ChronyError {
        ChronyError::Timeout(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

//! Types and constants of the chrony command and monitoring protocol.
//!
//! Provides `ReadBytes` and `WriteBytes` implementations which extend the byteorder crate
//! `WriteBytesExt` and `ReadBytesExt` traits with the ability to read and write the protocol
//! records, plus slice-based `FromBytes`/`ToBytes` implementations usable without `std`.
//!
//! All multi-byte fields are big-endian.

/// Default UDP port of the chrony command socket.
pub const PORT: u16 = 323;

/// Protocol version spoken by current chrony releases.
pub const PROTO_VERSION_6: u8 = 6;

/// Protocol version spoken by older chrony releases.
pub const PROTO_VERSION_5: u8 = 5;

/// Version used when negotiation cannot confirm any candidate.
pub const DEFAULT_PROTO_VERSION: u8 = PROTO_VERSION_6;

/// Candidate versions tried during negotiation, most preferred first.
pub const SUPPORTED_VERSIONS: [u8; 2] = [PROTO_VERSION_6, PROTO_VERSION_5];

/// Packet type of a command request (CMD_Request).
pub const PKT_TYPE_CMD_REQUEST: u8 = 1;

/// Packet type of a command reply (CMD_Reply).
pub const PKT_TYPE_CMD_REPLY: u8 = 2;

/// Null command, used for liveness probes and version negotiation.
pub const REQ_NULL: u16 = 0;

/// Tracking snapshot command.
pub const REQ_TRACKING: u16 = 33;

/// Source activity counts command.
pub const REQ_ACTIVITY: u16 = 44;

/// Reply code for a null command.
pub const RPY_NULL: u16 = 1;

/// Reply code carrying a [`TrackingPayload`].
pub const RPY_TRACKING: u16 = 5;

/// Reply code carrying an [`ActivityPayload`].
pub const RPY_ACTIVITY: u16 = 12;

/// Number of zero padding bytes at the end of every request.
pub const REQUEST_PADDING: usize = 396;

/// Size of the receive buffer; no reply datagram is larger.
pub const MAX_REPLY_SIZE: usize = 1024;

mod bytes;
#[cfg(feature = "std")]
mod io;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;

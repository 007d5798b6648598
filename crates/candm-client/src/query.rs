// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Request preparation and reply validation shared by the blocking and async clients.
//!
//! A query runs as: reject an unset version, default the sequence number,
//! send the encoded request, receive one datagram, decode the reply header and
//! validate it against the request. Validation failures keep the parsed header
//! in [`QueryError::reply`] so a caller can tell a stale or foreign packet apart
//! from silence.

use std::fmt;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use candm_proto::protocol::{
    ConstPackedSizeBytes, FromBytes, PKT_TYPE_CMD_REPLY, ReplyHeader, ReplyPayload, Request,
    ToBytes,
};
use tracing::debug;

use crate::error::{ChronyError, ConfigError, ProtocolError};

/// A validated reply: the header and the payload bytes that followed it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    /// The decoded reply header.
    pub header: ReplyHeader,
    /// Bytes following the header, including any trailing end-of-record marker.
    pub payload: Vec<u8>,
}

impl Reply {
    /// Decode the payload as a fixed-layout record.
    ///
    /// Bytes beyond the record's packed size are ignored.
    pub fn decode<T: FromBytes>(&self) -> io::Result<T> {
        let (value, _) = T::from_bytes(&self.payload)?;
        Ok(value)
    }

    /// Check that the reply answers `command` with reply code `reply`.
    ///
    /// A late reply to an earlier query in the same second passes header
    /// validation but carries the earlier command; it fails here with
    /// [`ProtocolError::UnexpectedReply`].
    pub fn expect(&self, command: u16, reply: u16) -> io::Result<()> {
        if self.header.command == command && self.header.reply == reply {
            return Ok(());
        }
        debug!(
            expected_command = command,
            expected_reply = reply,
            command = self.header.command,
            reply = self.header.reply,
            status = ?self.header.status(),
            "reply answers another command"
        );
        Err(ChronyError::Protocol(ProtocolError::UnexpectedReply {
            command: self.header.command,
            reply: self.header.reply,
            status: self.header.status,
        })
        .into())
    }

    /// Decode the payload as `T` after checking the reply carries `T`.
    pub fn decode_payload<T: ReplyPayload>(&self) -> io::Result<T> {
        self.expect(T::COMMAND, T::REPLY)?;
        self.decode()
    }
}

/// A failed query.
///
/// `reply` is set when a datagram was received and its header decoded but it
/// did not answer the request that was sent.
#[derive(Debug)]
pub struct QueryError {
    /// The parsed header of a reply that failed validation.
    pub reply: Option<ReplyHeader>,
    /// The underlying error.
    pub error: io::Error,
}

impl QueryError {
    fn mismatch(header: ReplyHeader, err: ProtocolError) -> Self {
        QueryError {
            reply: Some(header),
            error: ChronyError::Protocol(err).into(),
        }
    }

    /// The io::ErrorKind of the underlying error.
    pub fn kind(&self) -> io::ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reply {
            Some(hdr) => write!(
                f,
                "{} (reply: version {}, type {}, sequence {:#010x})",
                self.error, hdr.version, hdr.packet_type, hdr.sequence
            ),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<io::Error> for QueryError {
    fn from(error: io::Error) -> Self {
        QueryError { reply: None, error }
    }
}

impl From<ChronyError> for QueryError {
    fn from(err: ChronyError) -> Self {
        QueryError::from(io::Error::from(err))
    }
}

impl From<QueryError> for io::Error {
    fn from(err: QueryError) -> io::Error {
        err.error
    }
}

/// Current Unix time in seconds, truncated to 32 bits.
pub(crate) fn unix_sequence() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}

/// Check the request, default its sequence number and encode it.
///
/// Fails with [`ConfigError::VersionUnset`] before any I/O when the version is zero.
pub(crate) fn prepare_request(
    mut request: Request,
) -> Result<(Request, [u8; Request::PACKED_SIZE_BYTES]), QueryError> {
    if request.version == 0 {
        return Err(ChronyError::Config(ConfigError::VersionUnset).into());
    }
    if request.sequence == 0 {
        request.sequence = unix_sequence();
    }
    let mut buf = [0u8; Request::PACKED_SIZE_BYTES];
    request.to_bytes(&mut buf).map_err(io::Error::from)?;
    Ok((request, buf))
}

/// Decode the reply header from `recv` and check it answers `request`.
///
/// A datagram shorter than the header is a decode error
/// ([`ParseError::BufferTooShort`](crate::error::ParseError), kind
/// `UnexpectedEof`). Checks then run in order: packet type, sequence number,
/// protocol version.
pub(crate) fn validate_reply(request: &Request, recv: &[u8]) -> Result<Reply, QueryError> {
    let (header, consumed) = ReplyHeader::from_bytes(recv).map_err(io::Error::from)?;

    if header.packet_type != PKT_TYPE_CMD_REPLY {
        return Err(QueryError::mismatch(
            header,
            ProtocolError::UnexpectedPacketType {
                received: header.packet_type,
            },
        ));
    }
    if header.sequence != request.sequence {
        return Err(QueryError::mismatch(
            header,
            ProtocolError::SequenceMismatch {
                expected: request.sequence,
                received: header.sequence,
            },
        ));
    }
    if header.version != request.version {
        return Err(QueryError::mismatch(
            header,
            ProtocolError::VersionMismatch {
                expected: request.version,
                received: header.version,
            },
        ));
    }

    Ok(Reply {
        header,
        payload: recv[consumed..].to_vec(),
    })
}

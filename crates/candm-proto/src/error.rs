// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Codec errors for the fixed-layout candm records.
//!
//! The slice codec ([`FromBytes`](crate::protocol::FromBytes) /
//! [`ToBytes`](crate::protocol::ToBytes)) reports [`ParseError`] directly. With
//! the `std` feature a `ParseError` also travels inside an `io::Error`:
//! truncation maps to `UnexpectedEof`, a bad field to `InvalidData`, and the
//! original value can be recovered with `downcast_ref`.

use core::fmt;

/// A record could not be encoded or decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The slice ends before the record does.
    BufferTooShort {
        /// Packed size of the record.
        needed: usize,
        /// Length of the slice that was offered.
        available: usize,
    },
    /// A field holds a value the record cannot carry, such as a request whose
    /// packet type is not CMD_Request.
    InvalidField {
        /// Field name as it appears in messages.
        field: &'static str,
        /// The offending raw value.
        value: u32,
    },
}

impl ParseError {
    /// Whether more bytes would have let the operation succeed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, ParseError::BufferTooShort { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::BufferTooShort { needed, available } => {
                write!(f, "truncated record: {needed} bytes required, {available} available")
            }
            ParseError::InvalidField { field, value } => write!(f, "unexpected {field} {value}"),
        }
    }
}

#[cfg(feature = "std")]
mod io_compat {
    use super::ParseError;
    use std::io;

    impl std::error::Error for ParseError {}

    impl From<ParseError> for io::Error {
        fn from(err: ParseError) -> io::Error {
            let kind = if err.is_truncation() {
                io::ErrorKind::UnexpectedEof
            } else {
                io::ErrorKind::InvalidData
            };
            io::Error::new(kind, err)
        }
    }
}

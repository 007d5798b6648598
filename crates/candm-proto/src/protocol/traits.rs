#[cfg(feature = "std")]
use byteorder::{ReadBytesExt, WriteBytesExt};
#[cfg(feature = "std")]
use std::io;

use crate::error::ParseError;

/// Write a candm record into any `byteorder` writer.
///
/// Implemented for every `WriteBytesExt`, so `Vec<u8>`, `Cursor` and sockets
/// wrapped in a `BufWriter` can all take a record directly. Requires `std`.
#[cfg(feature = "std")]
pub trait WriteBytes {
    /// Append `record` in big-endian wire order.
    fn write_bytes<P: WriteToBytes>(&mut self, record: P) -> io::Result<()>;
}

/// Read a candm record from any `byteorder` reader. Requires `std`.
#[cfg(feature = "std")]
pub trait ReadBytes {
    /// Consume one record in big-endian wire order.
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P>;
}

/// A record with a streaming big-endian encoding. Requires `std`.
#[cfg(feature = "std")]
pub trait WriteToBytes {
    /// Encode into `writer`, including reserved and padding fields.
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()>;
}

/// A record with a streaming big-endian decoding. Requires `std`.
///
/// Truncated input surfaces as `io::ErrorKind::UnexpectedEof`.
#[cfg(feature = "std")]
pub trait ReadFromBytes: Sized {
    /// Decode from `reader`, skipping reserved and padding fields.
    fn read_from_bytes<R: ReadBytesExt>(reader: R) -> io::Result<Self>;
}

/// Records whose wire size never varies.
pub trait ConstPackedSizeBytes {
    /// Size of the record on the wire, padding included.
    const PACKED_SIZE_BYTES: usize;
}

/// Slice decoding that works without `std`.
pub trait FromBytes: Sized {
    /// Decode from the front of `buf`, returning the record and the number of
    /// bytes it occupied. Trailing bytes are left alone.
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError>;
}

/// Slice encoding that works without `std`.
pub trait ToBytes {
    /// Encode into the front of `buf`, returning the number of bytes written.
    /// Fails with [`ParseError::BufferTooShort`] when `buf` cannot hold the record.
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError>;
}

/// A reply payload and the command/reply codes that carry it.
///
/// ```
/// use candm_proto::protocol::{ReplyPayload, TrackingPayload, REQ_TRACKING, RPY_TRACKING};
///
/// assert_eq!(TrackingPayload::COMMAND, REQ_TRACKING);
/// assert_eq!(TrackingPayload::REPLY, RPY_TRACKING);
/// ```
pub trait ReplyPayload: FromBytes + ConstPackedSizeBytes {
    /// Command code of the request that asks for this payload.
    const COMMAND: u16;
    /// Reply code the daemon puts in the header when answering.
    const REPLY: u16;
}

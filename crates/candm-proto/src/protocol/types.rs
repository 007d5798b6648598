use core::fmt;
use core::net::{IpAddr, Ipv4Addr};

use super::{
    ConstPackedSizeBytes, PKT_TYPE_CMD_REPLY, REQ_ACTIVITY, REQ_TRACKING, REQUEST_PADDING,
    ReplyPayload, RPY_ACTIVITY, RPY_TRACKING,
};
use crate::numeric;

/// **Command request** - The fixed-size packet sent to the daemon. Every request is padded to
/// the same length regardless of command so the daemon can reject amplification attempts.
///
/// ### Layout
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Version    |  Packet Type  |   Reserved    |   Reserved    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Command            |            Attempt            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Sequence Number                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// .                     Padding (396 octets)                      .
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The packet type is always CMD_Request and is not stored.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Request {
    /// Protocol version. Zero means "unset" and is rejected by the query engine.
    pub version: u8,
    /// Command code, e.g. [`REQ_TRACKING`](super::REQ_TRACKING).
    pub command: u16,
    /// Retransmission counter. Unused by this client and sent as zero.
    pub attempt: u16,
    /// Correlation token echoed by the daemon. Zero means "unset".
    pub sequence: u32,
}

impl Request {
    /// Create a request for `command` with the given version and sequence number.
    pub const fn new(version: u8, command: u16, sequence: u32) -> Self {
        Request {
            version,
            command,
            attempt: 0,
            sequence,
        }
    }
}

/// **Command reply header** - The fixed prefix of every reply datagram. Command specific
/// payload bytes follow it.
///
/// ### Layout
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Version    |  Packet Type  |   Reserved    |   Reserved    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Command            |          Reply Code           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Status             |            Padding            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Padding            |            Padding            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Sequence Number                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Padding                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Padding                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Decoding a header never validates it; matching against the originating request is the
/// caller's job.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReplyHeader {
    /// Protocol version of the reply.
    pub version: u8,
    /// Packet type, [`PKT_TYPE_CMD_REPLY`] for a well-formed reply.
    pub packet_type: u8,
    /// Command code the reply answers.
    pub command: u16,
    /// Reply code describing the payload, e.g. [`RPY_TRACKING`](super::RPY_TRACKING).
    pub reply: u16,
    /// Raw status code; see [`ReplyHeader::status`].
    pub status: u16,
    /// Sequence number echoed from the request.
    pub sequence: u32,
}

impl ReplyHeader {
    /// Build a successful reply header answering `request` with the given reply code.
    pub fn answering(request: &Request, reply: u16) -> Self {
        ReplyHeader {
            version: request.version,
            packet_type: PKT_TYPE_CMD_REPLY,
            command: request.command,
            reply,
            status: 0,
            sequence: request.sequence,
        }
    }

    /// The decoded status code.
    pub fn status(&self) -> ReplyStatus {
        ReplyStatus::from(self.status)
    }
}

/// Status code carried in a reply header.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum ReplyStatus {
    /// Command succeeded.
    Success,
    /// Command failed.
    Failed,
    /// Command requires authorisation.
    Unauthorised,
    /// Command is not valid.
    Invalid,
    /// No such source.
    NoSuchSource,
    /// Invalid timestamp.
    InvalidTimestamp,
    /// Facility not enabled.
    NotEnabled,
    /// Bad subnet.
    BadSubnet,
    /// Access allowed.
    AccessAllowed,
    /// Access denied.
    AccessDenied,
    /// No host access.
    NoHostAccess,
    /// Source already known.
    SourceAlreadyKnown,
    /// Too many sources.
    TooManySources,
    /// No real-time clock.
    NoRtc,
    /// Bad real-time clock file.
    BadRtcFile,
    /// Source is inactive.
    Inactive,
    /// Bad sample.
    BadSample,
    /// Invalid address family.
    InvalidAddressFamily,
    /// The daemon does not speak the request's protocol version.
    BadPacketVersion,
    /// The request had the wrong length for its command.
    BadPacketLength,
    /// A status code this crate does not know.
    Unknown(u16),
}

impl From<u16> for ReplyStatus {
    fn from(code: u16) -> Self {
        match code {
            0 => ReplyStatus::Success,
            1 => ReplyStatus::Failed,
            2 => ReplyStatus::Unauthorised,
            3 => ReplyStatus::Invalid,
            4 => ReplyStatus::NoSuchSource,
            5 => ReplyStatus::InvalidTimestamp,
            6 => ReplyStatus::NotEnabled,
            7 => ReplyStatus::BadSubnet,
            8 => ReplyStatus::AccessAllowed,
            9 => ReplyStatus::AccessDenied,
            10 => ReplyStatus::NoHostAccess,
            11 => ReplyStatus::SourceAlreadyKnown,
            12 => ReplyStatus::TooManySources,
            13 => ReplyStatus::NoRtc,
            14 => ReplyStatus::BadRtcFile,
            15 => ReplyStatus::Inactive,
            16 => ReplyStatus::BadSample,
            17 => ReplyStatus::InvalidAddressFamily,
            18 => ReplyStatus::BadPacketVersion,
            19 => ReplyStatus::BadPacketLength,
            other => ReplyStatus::Unknown(other),
        }
    }
}

/// **Custom float** - chrony's 32-bit floating point encoding: a 7-bit two's complement
/// exponent over a 25-bit two's complement coefficient, representing
/// `coefficient * 2^(exponent - 25)`.
///
/// The raw word is kept as received so that re-encoding is lossless; conversions go through
/// [`crate::numeric`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ChronyFloat(i32);

impl ChronyFloat {
    /// Wrap a raw encoded word.
    pub const fn from_raw(raw: i32) -> Self {
        ChronyFloat(raw)
    }

    /// The raw encoded word.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Build a float from a coefficient and effective exponent.
    ///
    /// Returns `None` when either part is out of range; see
    /// [`numeric::encode_float_parts`].
    pub fn from_parts(coefficient: i32, exponent: i32) -> Option<Self> {
        numeric::encode_float_parts(coefficient, exponent).map(ChronyFloat)
    }

    /// Encode an `f64`, rounding to the nearest representable value.
    #[cfg(feature = "std")]
    pub fn from_f64(x: f64) -> Self {
        ChronyFloat(numeric::encode_float(x))
    }

    /// The decoded value.
    pub fn to_f64(self) -> f64 {
        numeric::decode_float(self.0)
    }

    /// The decoded value multiplied by 10^9 and truncated toward zero.
    pub fn scaled(self) -> i64 {
        numeric::decode_float_scaled(self.0)
    }
}

impl From<ChronyFloat> for f64 {
    fn from(f: ChronyFloat) -> f64 {
        f.to_f64()
    }
}

/// **Timestamp** - A 64-bit seconds count since the Unix epoch with nanoseconds. On the wire
/// the seconds are split into high and low 32-bit halves:
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Seconds (high)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Seconds (low)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Nanoseconds                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timespec {
    /// Seconds since 1970-01-01 00:00:00 UTC.
    pub seconds: u64,
    /// Nanoseconds, at most 999,999,999 once decoded.
    pub nanos: u32,
}

impl Timespec {
    /// Convert to a [`std::time::SystemTime`], or `None` if it does not fit.
    #[cfg(feature = "std")]
    pub fn to_system_time(self) -> Option<std::time::SystemTime> {
        std::time::UNIX_EPOCH.checked_add(std::time::Duration::new(self.seconds, self.nanos))
    }
}

/// Leap second status reported in a tracking snapshot.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum LeapStatus {
    /// No leap second pending.
    Normal,
    /// A leap second will be inserted at the end of the day.
    InsertSecond,
    /// A leap second will be deleted at the end of the day.
    DeleteSecond,
    /// The daemon is not synchronised.
    Unsynchronised,
    /// A value this crate does not know.
    Unknown(u16),
}

impl From<u16> for LeapStatus {
    fn from(value: u16) -> Self {
        match value {
            0 => LeapStatus::Normal,
            1 => LeapStatus::InsertSecond,
            2 => LeapStatus::DeleteSecond,
            3 => LeapStatus::Unsynchronised,
            other => LeapStatus::Unknown(other),
        }
    }
}

impl fmt::Display for LeapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeapStatus::Normal => write!(f, "Normal"),
            LeapStatus::InsertSecond => write!(f, "Insert second"),
            LeapStatus::DeleteSecond => write!(f, "Delete second"),
            LeapStatus::Unsynchronised => write!(f, "Not synchronised"),
            LeapStatus::Unknown(v) => write!(f, "Unknown ({v})"),
        }
    }
}

/// Reference identifier of the currently selected source.
///
/// Displays as ASCII when the identifier is a reference clock name such as `GPS` or `PPS`,
/// otherwise as eight uppercase hex digits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RefId(pub u32);

impl RefId {
    fn ascii_name(self) -> Option<[u8; 4]> {
        let bytes = self.0.to_be_bytes();
        let len = bytes.iter().rposition(|&b| b != 0)? + 1;
        if bytes[..len].iter().all(|b| b.is_ascii_graphic()) {
            Some(bytes)
        } else {
            None
        }
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ascii_name() {
            Some(bytes) => {
                for &b in bytes.iter().take_while(|&&b| b != 0) {
                    write!(f, "{}", b as char)?;
                }
                Ok(())
            }
            None => write!(f, "{:08X}", self.0),
        }
    }
}

/// **Tracking payload** - A point-in-time record of the daemon's synchronisation state,
/// carried by [`RPY_TRACKING`](super::RPY_TRACKING) replies.
///
/// Fields appear on the wire in declaration order. The address is a 16-byte dual-word record
/// followed by a 16-bit family and 16 bits of padding; see [`numeric::decode_address`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingPayload {
    /// Reference identifier of the selected source.
    pub ref_id: u32,
    /// Address of the selected source, `0.0.0.0` when there is none.
    pub ip_addr: IpAddr,
    /// Stratum of the local clock.
    pub stratum: u16,
    /// Raw leap status; see [`TrackingPayload::leap`].
    pub leap_status: u16,
    /// Time of the last clock update.
    pub ref_time: Timespec,
    /// Current correction being applied to the system clock (seconds).
    pub current_correction: ChronyFloat,
    /// Offset estimated at the last clock update (seconds).
    pub last_offset: ChronyFloat,
    /// Long-term average of the offset (seconds).
    pub rms_offset: ChronyFloat,
    /// Frequency error of the system clock (ppm).
    pub freq_ppm: ChronyFloat,
    /// Residual frequency of the selected source (ppm).
    pub resid_freq_ppm: ChronyFloat,
    /// Estimated error bound on the frequency (ppm).
    pub skew_ppm: ChronyFloat,
    /// Total network path delay to the stratum-1 reference (seconds).
    pub root_delay: ChronyFloat,
    /// Total dispersion accumulated toward the stratum-1 reference (seconds).
    pub root_dispersion: ChronyFloat,
    /// Interval between the last two clock updates (seconds).
    pub last_update_interval: ChronyFloat,
}

impl Default for TrackingPayload {
    fn default() -> Self {
        TrackingPayload {
            ref_id: 0,
            ip_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            stratum: 0,
            leap_status: 0,
            ref_time: Timespec::default(),
            current_correction: ChronyFloat::default(),
            last_offset: ChronyFloat::default(),
            rms_offset: ChronyFloat::default(),
            freq_ppm: ChronyFloat::default(),
            resid_freq_ppm: ChronyFloat::default(),
            skew_ppm: ChronyFloat::default(),
            root_delay: ChronyFloat::default(),
            root_dispersion: ChronyFloat::default(),
            last_update_interval: ChronyFloat::default(),
        }
    }
}

impl TrackingPayload {
    /// The decoded leap status.
    pub fn leap(&self) -> LeapStatus {
        LeapStatus::from(self.leap_status)
    }

    /// The reference identifier with its display form.
    pub fn reference_id(&self) -> RefId {
        RefId(self.ref_id)
    }
}

/// **Activity payload** - Counts of configured sources by state, carried by
/// [`RPY_ACTIVITY`](super::RPY_ACTIVITY) replies.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ActivityPayload {
    /// Sources currently online.
    pub online: i32,
    /// Sources currently offline.
    pub offline: i32,
    /// Sources doing a burst before going online (just started).
    pub burst_online: i32,
    /// Sources doing a burst before going offline (just stopped).
    pub burst_offline: i32,
    /// Sources whose address is not yet resolved.
    pub unresolved: i32,
}

// Size implementations.

impl ConstPackedSizeBytes for Request {
    const PACKED_SIZE_BYTES: usize = 12 + REQUEST_PADDING;
}

impl ConstPackedSizeBytes for ReplyHeader {
    const PACKED_SIZE_BYTES: usize = 28;
}

impl ConstPackedSizeBytes for ChronyFloat {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for Timespec {
    const PACKED_SIZE_BYTES: usize = 12;
}

impl ConstPackedSizeBytes for TrackingPayload {
    const PACKED_SIZE_BYTES: usize = 4 + 20 + 2 + 2 + Timespec::PACKED_SIZE_BYTES + 9 * 4;
}

impl ConstPackedSizeBytes for ActivityPayload {
    const PACKED_SIZE_BYTES: usize = 5 * 4;
}

impl ReplyPayload for TrackingPayload {
    const COMMAND: u16 = REQ_TRACKING;
    const REPLY: u16 = RPY_TRACKING;
}

impl ReplyPayload for ActivityPayload {
    const COMMAND: u16 = REQ_ACTIVITY;
    const REPLY: u16 = RPY_ACTIVITY;
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::protocol::{PKT_TYPE_CMD_REPLY, PROTO_VERSION_6, REQ_TRACKING, RPY_TRACKING};

    #[test]
    fn test_packed_sizes() {
        assert_eq!(Request::PACKED_SIZE_BYTES, 408);
        assert_eq!(ReplyHeader::PACKED_SIZE_BYTES, 28);
        assert_eq!(TrackingPayload::PACKED_SIZE_BYTES, 76);
        assert_eq!(ActivityPayload::PACKED_SIZE_BYTES, 20);
    }

    #[test]
    fn test_request_new() {
        let req = Request::new(PROTO_VERSION_6, REQ_TRACKING, 77);
        assert_eq!(req.version, 6);
        assert_eq!(req.command, 33);
        assert_eq!(req.attempt, 0);
        assert_eq!(req.sequence, 77);
        assert_eq!(Request::default().version, 0);
    }

    #[test]
    fn test_reply_header_answering() {
        let req = Request::new(5, REQ_TRACKING, 0xDEAD_BEEF);
        let hdr = ReplyHeader::answering(&req, RPY_TRACKING);
        assert_eq!(hdr.version, 5);
        assert_eq!(hdr.packet_type, PKT_TYPE_CMD_REPLY);
        assert_eq!(hdr.command, REQ_TRACKING);
        assert_eq!(hdr.reply, RPY_TRACKING);
        assert_eq!(hdr.sequence, 0xDEAD_BEEF);
        assert_eq!(hdr.status(), ReplyStatus::Success);
    }

    #[test]
    fn test_reply_status_codes() {
        assert_eq!(ReplyStatus::from(18), ReplyStatus::BadPacketVersion);
        assert_eq!(ReplyStatus::from(19), ReplyStatus::BadPacketLength);
        assert_eq!(ReplyStatus::from(2), ReplyStatus::Unauthorised);
        assert_eq!(ReplyStatus::from(400), ReplyStatus::Unknown(400));
    }

    #[test]
    fn test_leap_status() {
        assert_eq!(LeapStatus::from(0), LeapStatus::Normal);
        assert_eq!(LeapStatus::from(3), LeapStatus::Unsynchronised);
        assert_eq!(LeapStatus::from(9), LeapStatus::Unknown(9));
        assert_eq!(LeapStatus::Unsynchronised.to_string(), "Not synchronised");
    }

    #[test]
    fn test_ref_id_display_ascii() {
        assert_eq!(RefId(u32::from_be_bytes(*b"GPS\0")).to_string(), "GPS");
        assert_eq!(RefId(u32::from_be_bytes(*b"PPS1")).to_string(), "PPS1");
    }

    #[test]
    fn test_ref_id_display_hex() {
        assert_eq!(RefId(0xC0A8_0101).to_string(), "C0A80101");
        assert_eq!(RefId(0).to_string(), "00000000");
        // An embedded NUL before printable bytes is not a name.
        assert_eq!(RefId(0x4100_4100).to_string(), "41004100");
    }

    #[test]
    fn test_chrony_float_conversions() {
        let f = ChronyFloat::from_parts(3, -1).unwrap();
        assert_eq!(f.to_f64(), 1.5);
        assert_eq!(f64::from(f), 1.5);
        assert_eq!(f.scaled(), 1_500_000_000);
        assert_eq!(ChronyFloat::from_raw(f.raw()), f);
        assert_eq!(ChronyFloat::from_f64(-0.5).to_f64(), -0.5);
    }

    #[test]
    fn test_timespec_to_system_time() {
        let ts = Timespec {
            seconds: 1_700_000_000,
            nanos: 5,
        };
        let st = ts.to_system_time().unwrap();
        let since = st.duration_since(std::time::UNIX_EPOCH).unwrap();
        assert_eq!(since.as_secs(), 1_700_000_000);
        assert_eq!(since.subsec_nanos(), 5);
        let far = Timespec {
            seconds: u64::MAX,
            nanos: 0,
        };
        assert!(far.to_system_time().is_none());
    }
}

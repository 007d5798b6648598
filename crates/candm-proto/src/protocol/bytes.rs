use crate::error::ParseError;
use crate::numeric;

use super::{
    ActivityPayload, ChronyFloat, ConstPackedSizeBytes, FromBytes, PKT_TYPE_CMD_REQUEST,
    ReplyHeader, Request, Timespec, ToBytes, TrackingPayload,
};

fn check_len(buf: &[u8], needed: usize) -> Result<(), ParseError> {
    if buf.len() < needed {
        return Err(ParseError::BufferTooShort {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

fn be_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn be_u64(buf: &[u8], at: usize) -> u64 {
    ((be_u32(buf, at) as u64) << 32) | be_u32(buf, at + 4) as u64
}

// Reader implementations.

impl FromBytes for Request {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        if buf[1] != PKT_TYPE_CMD_REQUEST {
            return Err(ParseError::InvalidField {
                field: "packet type",
                value: buf[1] as u32,
            });
        }
        Ok((
            Request {
                version: buf[0],
                command: be_u16(buf, 4),
                attempt: be_u16(buf, 6),
                sequence: be_u32(buf, 8),
            },
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

impl FromBytes for ReplyHeader {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        Ok((
            ReplyHeader {
                version: buf[0],
                packet_type: buf[1],
                command: be_u16(buf, 4),
                reply: be_u16(buf, 6),
                status: be_u16(buf, 8),
                sequence: be_u32(buf, 16),
            },
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

impl FromBytes for ChronyFloat {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        Ok((
            ChronyFloat::from_raw(be_u32(buf, 0) as i32),
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

impl FromBytes for Timespec {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let ts = numeric::decode_timestamp(be_u32(buf, 0), be_u32(buf, 4), be_u32(buf, 8));
        Ok((ts, Self::PACKED_SIZE_BYTES))
    }
}

impl FromBytes for TrackingPayload {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let ip_addr = numeric::decode_address(be_u64(buf, 4), be_u64(buf, 12), be_u16(buf, 20));
        let (ref_time, _) = Timespec::from_bytes(&buf[28..])?;
        let float = |i: usize| ChronyFloat::from_raw(be_u32(buf, 40 + 4 * i) as i32);
        Ok((
            TrackingPayload {
                ref_id: be_u32(buf, 0),
                ip_addr,
                stratum: be_u16(buf, 24),
                leap_status: be_u16(buf, 26),
                ref_time,
                current_correction: float(0),
                last_offset: float(1),
                rms_offset: float(2),
                freq_ppm: float(3),
                resid_freq_ppm: float(4),
                skew_ppm: float(5),
                root_delay: float(6),
                root_dispersion: float(7),
                last_update_interval: float(8),
            },
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

impl FromBytes for ActivityPayload {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let field = |i: usize| be_u32(buf, 4 * i) as i32;
        Ok((
            ActivityPayload {
                online: field(0),
                offline: field(1),
                burst_online: field(2),
                burst_offline: field(3),
                unresolved: field(4),
            },
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

// Writer implementations.

impl ToBytes for Request {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let out = &mut buf[..Self::PACKED_SIZE_BYTES];
        out.fill(0);
        out[0] = self.version;
        out[1] = PKT_TYPE_CMD_REQUEST;
        out[4..6].copy_from_slice(&self.command.to_be_bytes());
        out[6..8].copy_from_slice(&self.attempt.to_be_bytes());
        out[8..12].copy_from_slice(&self.sequence.to_be_bytes());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for ReplyHeader {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let out = &mut buf[..Self::PACKED_SIZE_BYTES];
        out.fill(0);
        out[0] = self.version;
        out[1] = self.packet_type;
        out[4..6].copy_from_slice(&self.command.to_be_bytes());
        out[6..8].copy_from_slice(&self.reply.to_be_bytes());
        out[8..10].copy_from_slice(&self.status.to_be_bytes());
        out[16..20].copy_from_slice(&self.sequence.to_be_bytes());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for ChronyFloat {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        buf[..4].copy_from_slice(&self.raw().to_be_bytes());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for Timespec {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let (hi, lo, nsec) = numeric::encode_timestamp(*self);
        buf[0..4].copy_from_slice(&hi.to_be_bytes());
        buf[4..8].copy_from_slice(&lo.to_be_bytes());
        buf[8..12].copy_from_slice(&nsec.to_be_bytes());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for TrackingPayload {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let out = &mut buf[..Self::PACKED_SIZE_BYTES];
        out.fill(0);
        out[0..4].copy_from_slice(&self.ref_id.to_be_bytes());
        let (hi, lo, family) = numeric::encode_address(self.ip_addr);
        out[4..12].copy_from_slice(&hi.to_be_bytes());
        out[12..20].copy_from_slice(&lo.to_be_bytes());
        out[20..22].copy_from_slice(&family.to_be_bytes());
        out[24..26].copy_from_slice(&self.stratum.to_be_bytes());
        out[26..28].copy_from_slice(&self.leap_status.to_be_bytes());
        self.ref_time.to_bytes(&mut out[28..40])?;
        let floats = [
            self.current_correction,
            self.last_offset,
            self.rms_offset,
            self.freq_ppm,
            self.resid_freq_ppm,
            self.skew_ppm,
            self.root_delay,
            self.root_dispersion,
            self.last_update_interval,
        ];
        for (i, f) in floats.iter().enumerate() {
            f.to_bytes(&mut out[40 + 4 * i..])?;
        }
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for ActivityPayload {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        check_len(buf, Self::PACKED_SIZE_BYTES)?;
        let fields = [
            self.online,
            self.offline,
            self.burst_online,
            self.burst_offline,
            self.unresolved,
        ];
        for (i, v) in fields.iter().enumerate() {
            buf[4 * i..4 * i + 4].copy_from_slice(&v.to_be_bytes());
        }
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

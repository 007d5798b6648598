use byteorder::{BE, ReadBytesExt, WriteBytesExt};
use std::io;

use super::{
    ActivityPayload, ChronyFloat, PKT_TYPE_CMD_REQUEST, REQUEST_PADDING, ReadBytes,
    ReadFromBytes, ReplyHeader, Request, Timespec, TrackingPayload, WriteBytes, WriteToBytes,
};
use crate::error::ParseError;
use crate::numeric;

// Writer implementations.

impl<W> WriteBytes for W
where
    W: WriteBytesExt,
{
    fn write_bytes<P: WriteToBytes>(&mut self, protocol: P) -> io::Result<()> {
        protocol.write_to_bytes(self)
    }
}

impl<P> WriteToBytes for &P
where
    P: WriteToBytes,
{
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()> {
        (*self).write_to_bytes(writer)
    }
}

impl WriteToBytes for Request {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.version)?;
        writer.write_u8(PKT_TYPE_CMD_REQUEST)?;
        writer.write_u8(0)?;
        writer.write_u8(0)?;
        writer.write_u16::<BE>(self.command)?;
        writer.write_u16::<BE>(self.attempt)?;
        writer.write_u32::<BE>(self.sequence)?;
        writer.write_all(&[0u8; REQUEST_PADDING])?;
        Ok(())
    }
}

impl WriteToBytes for ReplyHeader {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.version)?;
        writer.write_u8(self.packet_type)?;
        writer.write_u8(0)?;
        writer.write_u8(0)?;
        writer.write_u16::<BE>(self.command)?;
        writer.write_u16::<BE>(self.reply)?;
        writer.write_u16::<BE>(self.status)?;
        for _ in 0..3 {
            writer.write_u16::<BE>(0)?;
        }
        writer.write_u32::<BE>(self.sequence)?;
        writer.write_u32::<BE>(0)?;
        writer.write_u32::<BE>(0)?;
        Ok(())
    }
}

impl WriteToBytes for ChronyFloat {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<BE>(self.raw())?;
        Ok(())
    }
}

impl WriteToBytes for Timespec {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        let (hi, lo, nsec) = numeric::encode_timestamp(*self);
        writer.write_u32::<BE>(hi)?;
        writer.write_u32::<BE>(lo)?;
        writer.write_u32::<BE>(nsec)?;
        Ok(())
    }
}

impl WriteToBytes for TrackingPayload {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<BE>(self.ref_id)?;
        let (hi, lo, family) = numeric::encode_address(self.ip_addr);
        writer.write_u64::<BE>(hi)?;
        writer.write_u64::<BE>(lo)?;
        writer.write_u16::<BE>(family)?;
        writer.write_u16::<BE>(0)?;
        writer.write_u16::<BE>(self.stratum)?;
        writer.write_u16::<BE>(self.leap_status)?;
        writer.write_bytes(self.ref_time)?;
        writer.write_bytes(self.current_correction)?;
        writer.write_bytes(self.last_offset)?;
        writer.write_bytes(self.rms_offset)?;
        writer.write_bytes(self.freq_ppm)?;
        writer.write_bytes(self.resid_freq_ppm)?;
        writer.write_bytes(self.skew_ppm)?;
        writer.write_bytes(self.root_delay)?;
        writer.write_bytes(self.root_dispersion)?;
        writer.write_bytes(self.last_update_interval)?;
        Ok(())
    }
}

impl WriteToBytes for ActivityPayload {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<BE>(self.online)?;
        writer.write_i32::<BE>(self.offline)?;
        writer.write_i32::<BE>(self.burst_online)?;
        writer.write_i32::<BE>(self.burst_offline)?;
        writer.write_i32::<BE>(self.unresolved)?;
        Ok(())
    }
}

// Reader implementations.

impl<R> ReadBytes for R
where
    R: ReadBytesExt,
{
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P> {
        P::read_from_bytes(self)
    }
}

impl ReadFromBytes for Request {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let version = reader.read_u8()?;
        let packet_type = reader.read_u8()?;
        if packet_type != PKT_TYPE_CMD_REQUEST {
            return Err(ParseError::InvalidField {
                field: "packet type",
                value: packet_type as u32,
            }
            .into());
        }
        let _reserved = reader.read_u16::<BE>()?;
        let command = reader.read_u16::<BE>()?;
        let attempt = reader.read_u16::<BE>()?;
        let sequence = reader.read_u32::<BE>()?;
        let mut padding = [0u8; REQUEST_PADDING];
        reader.read_exact(&mut padding)?;
        Ok(Request {
            version,
            command,
            attempt,
            sequence,
        })
    }
}

impl ReadFromBytes for ReplyHeader {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let version = reader.read_u8()?;
        let packet_type = reader.read_u8()?;
        let _reserved = reader.read_u16::<BE>()?;
        let command = reader.read_u16::<BE>()?;
        let reply = reader.read_u16::<BE>()?;
        let status = reader.read_u16::<BE>()?;
        for _ in 0..3 {
            reader.read_u16::<BE>()?;
        }
        let sequence = reader.read_u32::<BE>()?;
        reader.read_u32::<BE>()?;
        reader.read_u32::<BE>()?;
        Ok(ReplyHeader {
            version,
            packet_type,
            command,
            reply,
            status,
            sequence,
        })
    }
}

impl ReadFromBytes for ChronyFloat {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(ChronyFloat::from_raw(reader.read_i32::<BE>()?))
    }
}

impl ReadFromBytes for Timespec {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let hi = reader.read_u32::<BE>()?;
        let lo = reader.read_u32::<BE>()?;
        let nsec = reader.read_u32::<BE>()?;
        Ok(numeric::decode_timestamp(hi, lo, nsec))
    }
}

impl ReadFromBytes for TrackingPayload {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let ref_id = reader.read_u32::<BE>()?;
        let ip_addr = {
            let hi = reader.read_u64::<BE>()?;
            let lo = reader.read_u64::<BE>()?;
            let family = reader.read_u16::<BE>()?;
            let _pad = reader.read_u16::<BE>()?;
            numeric::decode_address(hi, lo, family)
        };
        let stratum = reader.read_u16::<BE>()?;
        let leap_status = reader.read_u16::<BE>()?;
        let ref_time = reader.read_bytes()?;
        Ok(TrackingPayload {
            ref_id,
            ip_addr,
            stratum,
            leap_status,
            ref_time,
            current_correction: reader.read_bytes()?,
            last_offset: reader.read_bytes()?,
            rms_offset: reader.read_bytes()?,
            freq_ppm: reader.read_bytes()?,
            resid_freq_ppm: reader.read_bytes()?,
            skew_ppm: reader.read_bytes()?,
            root_delay: reader.read_bytes()?,
            root_dispersion: reader.read_bytes()?,
            last_update_interval: reader.read_bytes()?,
        })
    }
}

impl ReadFromBytes for ActivityPayload {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(ActivityPayload {
            online: reader.read_i32::<BE>()?,
            offline: reader.read_i32::<BE>()?,
            burst_online: reader.read_i32::<BE>()?,
            burst_offline: reader.read_i32::<BE>()?,
            unresolved: reader.read_i32::<BE>()?,
        })
    }
}

// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Conversions between chrony's encoded numeric fields and Rust values.
//!
//! chrony packs floating point values into a signed 32-bit word with a 7-bit
//! two's complement exponent in the top bits and a 25-bit two's complement
//! coefficient in the low bits:
//!
//! ```ignore
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Exponent   |                  Coefficient                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The represented value is `coefficient * 2^(exponent - 25)`. Timestamps are
//! sent as two 32-bit halves of a 64-bit seconds count plus nanoseconds, and
//! addresses as two 64-bit words tagged with an address family.

use core::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::protocol::Timespec;

/// Number of exponent bits in an encoded float.
pub const FLOAT_EXP_BITS: u32 = 7;

/// Number of coefficient bits (including sign) in an encoded float.
pub const FLOAT_COEF_BITS: u32 = 25;

/// Smallest encodable exponent field value.
pub const FLOAT_EXP_MIN: i32 = -(1 << (FLOAT_EXP_BITS - 1));

/// Largest encodable exponent field value.
pub const FLOAT_EXP_MAX: i32 = (1 << (FLOAT_EXP_BITS - 1)) - 1;

/// Smallest encodable coefficient.
pub const FLOAT_COEF_MIN: i32 = -(1 << (FLOAT_COEF_BITS - 1));

/// Largest encodable coefficient.
pub const FLOAT_COEF_MAX: i32 = (1 << (FLOAT_COEF_BITS - 1)) - 1;

/// Scale applied by [`decode_float_scaled`] to obtain fixed-point integers.
pub const FLOAT_SCALE: f64 = 1e9;

/// Largest nanoseconds value accepted in a decoded timestamp.
pub const MAX_NANOS: u32 = 999_999_999;

/// Address family tag: no address.
pub const IPADDR_UNSPEC: u16 = 0;

/// Address family tag: IPv4.
pub const IPADDR_INET4: u16 = 1;

/// Address family tag: IPv6.
pub const IPADDR_INET6: u16 = 2;

// 2^exp for exponents inside the normal f64 range, built from the bit pattern
// so it stays exact and usable without std.
fn pow2(exp: i32) -> f64 {
    f64::from_bits(((exp + 1023) as u64) << 52)
}

/// Decode an encoded chrony float.
///
/// Every encoded value maps to an exact `f64`: the coefficient fits in the
/// mantissa and the effective exponent lies in `-89..=38`.
pub fn decode_float(raw: i32) -> f64 {
    let bits = raw as u32;

    let mut exp = (bits >> FLOAT_COEF_BITS) as i32;
    if exp >= 1 << (FLOAT_EXP_BITS - 1) {
        exp -= 1 << FLOAT_EXP_BITS;
    }
    exp -= FLOAT_COEF_BITS as i32;

    let mut coef = (bits % (1 << FLOAT_COEF_BITS)) as i32;
    if coef >= 1 << (FLOAT_COEF_BITS - 1) {
        coef -= 1 << FLOAT_COEF_BITS;
    }

    coef as f64 * pow2(exp)
}

/// Decode an encoded chrony float and scale it by [`FLOAT_SCALE`], truncating
/// toward zero.
///
/// Values beyond the `i64` range saturate.
pub fn decode_float_scaled(raw: i32) -> i64 {
    (decode_float(raw) * FLOAT_SCALE) as i64
}

/// Pack a coefficient and an effective exponent into an encoded float.
///
/// Returns `None` if the coefficient does not fit in 25 bits or the exponent
/// field (`exponent + 25`) does not fit in 7 bits.
pub fn encode_float_parts(coefficient: i32, exponent: i32) -> Option<i32> {
    if !(FLOAT_COEF_MIN..=FLOAT_COEF_MAX).contains(&coefficient) {
        return None;
    }
    let exp_field = exponent.checked_add(FLOAT_COEF_BITS as i32)?;
    if !(FLOAT_EXP_MIN..=FLOAT_EXP_MAX).contains(&exp_field) {
        return None;
    }
    Some(pack_float(coefficient, exp_field))
}

fn pack_float(coefficient: i32, exp_field: i32) -> i32 {
    let exp_bits = (exp_field as u32) & ((1 << FLOAT_EXP_BITS) - 1);
    let coef_bits = (coefficient as u32) & ((1 << FLOAT_COEF_BITS) - 1);
    ((exp_bits << FLOAT_COEF_BITS) | coef_bits) as i32
}

/// Encode an `f64` into chrony's float format, rounding to the nearest
/// representable value.
///
/// Magnitudes too large for the format saturate to the extreme coefficient
/// with the largest exponent; magnitudes too small flush to zero. NaN encodes
/// as zero.
#[cfg(feature = "std")]
pub fn encode_float(x: f64) -> i32 {
    let coef_shift = FLOAT_COEF_BITS as i32 - 1;
    let max_exp = FLOAT_EXP_MAX - FLOAT_COEF_BITS as i32;
    let min_exp = FLOAT_EXP_MIN - FLOAT_COEF_BITS as i32;

    if x.is_nan() || x.abs() < pow2(min_exp - 1) {
        return 0;
    }
    if x.abs() >= pow2(max_exp + coef_shift) {
        let coef = if x > 0.0 {
            FLOAT_COEF_MAX
        } else {
            FLOAT_COEF_MIN
        };
        return pack_float(coef, FLOAT_EXP_MAX);
    }

    // |x| < 2^exp
    let mut exp = x.abs().log2().floor() as i32 + 1;
    let mut coef = (x * 2f64.powi(coef_shift - exp)).round() as i64;
    while coef > FLOAT_COEF_MAX as i64 || coef < FLOAT_COEF_MIN as i64 {
        coef >>= 1;
        exp += 1;
    }

    let exp_field = exp - coef_shift + FLOAT_COEF_BITS as i32;
    if exp_field > FLOAT_EXP_MAX {
        let coef = if x > 0.0 {
            FLOAT_COEF_MAX
        } else {
            FLOAT_COEF_MIN
        };
        return pack_float(coef, FLOAT_EXP_MAX);
    }
    if exp_field < FLOAT_EXP_MIN {
        return 0;
    }
    pack_float(coef as i32, exp_field)
}

/// Decode a split timestamp.
///
/// The seconds count is `(hi << 32) | lo`; nanoseconds above 999,999,999 are
/// clamped.
pub fn decode_timestamp(hi: u32, lo: u32, nsec_raw: u32) -> Timespec {
    Timespec {
        seconds: ((hi as u64) << 32) | lo as u64,
        nanos: nsec_raw.min(MAX_NANOS),
    }
}

/// Split a timestamp into its `(hi, lo, nsec)` wire fields.
pub fn encode_timestamp(ts: Timespec) -> (u32, u32, u32) {
    ((ts.seconds >> 32) as u32, ts.seconds as u32, ts.nanos)
}

/// Decode a dual-width address record.
///
/// For [`IPADDR_INET4`] the address is the top 32 bits of `hi` with its bytes
/// reversed. For [`IPADDR_INET6`] the 16 bytes are `hi` then `lo`, each with
/// its byte order reversed. Any other family yields `0.0.0.0`, which stands
/// for "unknown or unset" rather than an error.
pub fn decode_address(hi: u64, lo: u64, family: u16) -> IpAddr {
    match family {
        IPADDR_INET4 => {
            let word = (hi >> 32) as u32;
            IpAddr::V4(Ipv4Addr::from(word.to_le_bytes()))
        }
        IPADDR_INET6 => {
            let h = hi.to_le_bytes();
            let l = lo.to_le_bytes();
            IpAddr::V6(Ipv6Addr::from([
                h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], l[0], l[1], l[2], l[3], l[4],
                l[5], l[6], l[7],
            ]))
        }
        _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    }
}

/// Encode an address into its `(hi, lo, family)` wire fields.
///
/// `0.0.0.0` encodes as [`IPADDR_UNSPEC`] so that it decodes back to the same
/// sentinel.
pub fn encode_address(addr: IpAddr) -> (u64, u64, u16) {
    match addr {
        IpAddr::V4(v4) if v4.is_unspecified() => (0, 0, IPADDR_UNSPEC),
        IpAddr::V4(v4) => {
            let word = u32::from_le_bytes(v4.octets());
            ((word as u64) << 32, 0, IPADDR_INET4)
        }
        IpAddr::V6(v6) => {
            let o = v6.octets();
            let hi = u64::from_le_bytes([o[0], o[1], o[2], o[3], o[4], o[5], o[6], o[7]]);
            let lo = u64::from_le_bytes([o[8], o[9], o[10], o[11], o[12], o[13], o[14], o[15]]);
            (hi, lo, IPADDR_INET6)
        }
    }
}

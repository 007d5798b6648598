// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Wire types and numeric decoders for the chrony command and monitoring
//! protocol (`candm`).
//!
//! The protocol is a fixed-layout, big-endian request/reply exchange over UDP.
//! This crate contains no networking: it encodes requests, decodes reply
//! headers and payloads, and converts chrony's custom numeric formats
//! (a 7-bit exponent / 25-bit coefficient float, a split 64-bit timestamp and
//! a dual-word address record) into ordinary Rust values.
//!
//! # Example
//!
//! ```
//! use candm_proto::protocol::{ConstPackedSizeBytes, Request, ToBytes, REQ_TRACKING};
//!
//! let request = Request::new(6, REQ_TRACKING, 0x1234_5678);
//! let mut buf = [0u8; Request::PACKED_SIZE_BYTES];
//! let written = request.to_bytes(&mut buf).unwrap();
//! assert_eq!(written, 408);
//! assert_eq!(buf[0], 6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Parse errors for buffer-based encoding and decoding.
pub mod error;

/// Pure conversions between chrony's encoded numeric fields and Rust values.
pub mod numeric;

/// Packet layouts, constants and codec traits.
pub mod protocol;

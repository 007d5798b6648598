// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but not every file uses every helper.
#![allow(unreachable_pub, dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use candm_client::protocol::{
    ActivityPayload, ConstPackedSizeBytes, FromBytes, PKT_TYPE_CMD_REQUEST, REQ_ACTIVITY,
    REQ_NULL, REQ_TRACKING, RPY_ACTIVITY, RPY_NULL, RPY_TRACKING, ReplyHeader, Request, ToBytes,
};

/// Hand-assembled tracking record:
///
/// - ref id `GPS\0`, address 127.0.0.1, stratum 1, leap normal
/// - reference time 1_700_000_000 s + 123_456_789 ns
/// - current correction 1.0, last offset -3 * 2^-12, freq 12.5 ppm,
///   last update interval 64.0, every other float zero
pub const TRACKING_PAYLOAD: [u8; 76] = [
    0x47, 0x50, 0x53, 0x00, // ref id
    0x01, 0x00, 0x00, 0x7F, 0x00, 0x00, 0x00, 0x00, // address hi
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // address lo
    0x00, 0x01, 0x00, 0x00, // family inet4, padding
    0x00, 0x01, 0x00, 0x00, // stratum, leap status
    0x00, 0x00, 0x00, 0x00, 0x65, 0x53, 0xF1, 0x00, 0x07, 0x5B, 0xCD, 0x15, // ref time
    0x32, 0x00, 0x00, 0x01, // current correction
    0x1B, 0xFF, 0xFF, 0xFD, // last offset
    0x00, 0x00, 0x00, 0x00, // rms offset
    0x30, 0x00, 0x00, 0x19, // freq ppm
    0x00, 0x00, 0x00, 0x00, // resid freq ppm
    0x00, 0x00, 0x00, 0x00, // skew ppm
    0x00, 0x00, 0x00, 0x00, // root delay
    0x00, 0x00, 0x00, 0x00, // root dispersion
    0x3E, 0x00, 0x00, 0x01, // last update interval
];

/// Activity counts served by the mock daemon.
pub const ACTIVITY: ActivityPayload = ActivityPayload {
    online: 4,
    offline: 1,
    burst_online: 0,
    burst_offline: 2,
    unresolved: 3,
};

/// How the mock daemon corrupts replies to non-probe commands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Tamper {
    #[default]
    None,
    /// Reply with the request packet type.
    PacketType,
    /// Echo the sequence number plus one.
    Sequence,
    /// Reply with the other supported version.
    Version,
    /// Send only the first 20 bytes of the header.
    Truncate,
}

/// Mock daemon configuration.
#[derive(Clone, Debug)]
pub struct Behavior {
    /// Versions the daemon answers; requests with any other version are ignored.
    pub answer_versions: Vec<u8>,
    pub tamper: Tamper,
    /// Hold back the reply to the first non-probe request.
    pub delay_first: Option<Duration>,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            answer_versions: vec![6, 5],
            tamper: Tamper::None,
            delay_first: None,
        }
    }
}

impl Behavior {
    pub fn answering(versions: &[u8]) -> Self {
        Behavior {
            answer_versions: versions.to_vec(),
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        Self::answering(&[])
    }
}

/// A chronyd stand-in serving canned replies on a loopback UDP socket.
pub struct MockDaemon {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<Request>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockDaemon {
    pub fn spawn(behavior: Behavior) -> Self {
        let sock = UdpSocket::bind("127.0.0.1:0").expect("bind mock daemon");
        sock.set_read_timeout(Some(Duration::from_millis(20)))
            .expect("set read timeout");
        let addr = sock.local_addr().expect("local addr");
        let stop = Arc::new(AtomicBool::new(false));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handle = {
            let stop = stop.clone();
            let requests = requests.clone();
            thread::spawn(move || serve(sock, behavior, stop, requests))
        };
        MockDaemon {
            addr,
            stop,
            requests,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every well-formed request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockDaemon {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    sock: UdpSocket,
    behavior: Behavior,
    stop: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<Request>>>,
) {
    let mut buf = [0u8; 1024];
    let mut delay = behavior.delay_first;
    while !stop.load(Ordering::Relaxed) {
        let Ok((len, src)) = sock.recv_from(&mut buf) else {
            continue;
        };
        let Ok((req, _)) = Request::from_bytes(&buf[..len]) else {
            continue;
        };
        requests.lock().unwrap().push(req);
        if !behavior.answer_versions.contains(&req.version) {
            continue;
        }
        if req.command != REQ_NULL {
            if let Some(d) = delay.take() {
                thread::sleep(d);
            }
        }
        let _ = sock.send_to(&reply_for(&req, behavior.tamper), src);
    }
}

fn reply_for(req: &Request, tamper: Tamper) -> Vec<u8> {
    let (code, payload) = match req.command {
        REQ_TRACKING => (RPY_TRACKING, TRACKING_PAYLOAD.to_vec()),
        REQ_ACTIVITY => {
            let mut body = vec![0u8; ActivityPayload::PACKED_SIZE_BYTES];
            ACTIVITY.to_bytes(&mut body).unwrap();
            (RPY_ACTIVITY, body)
        }
        _ => (RPY_NULL, Vec::new()),
    };

    let mut header = ReplyHeader::answering(req, code);
    if req.command != REQ_NULL {
        match tamper {
            Tamper::None | Tamper::Truncate => {}
            Tamper::PacketType => header.packet_type = PKT_TYPE_CMD_REQUEST,
            Tamper::Sequence => header.sequence = header.sequence.wrapping_add(1),
            Tamper::Version => header.version = if req.version == 6 { 5 } else { 6 },
        }
    }

    let mut out = vec![0u8; ReplyHeader::PACKED_SIZE_BYTES];
    header.to_bytes(&mut out).unwrap();
    if req.command != REQ_NULL && tamper == Tamper::Truncate {
        out.truncate(20);
        return out;
    }
    if !payload.is_empty() {
        out.extend_from_slice(&payload);
        // End-of-record marker.
        out.extend_from_slice(&[0u8; 4]);
    }
    out
}

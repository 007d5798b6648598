// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

mod common;

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use candm_client::error::{ChronyError, ParseError, ProtocolError};
use candm_client::protocol::{
    LeapStatus, PKT_TYPE_CMD_REQUEST, PKT_TYPE_CMD_REPLY, REQ_ACTIVITY, REQ_NULL, REQ_TRACKING,
    RPY_TRACKING, Request,
};
use candm_client::{ChronyClient, QueryError};
use common::{ACTIVITY, Behavior, MockDaemon, Tamper};

const SHORT: Duration = Duration::from_millis(200);

fn connect(daemon: &MockDaemon) -> ChronyClient {
    ChronyClient::builder(daemon.addr())
        .timeout(Duration::from_secs(2))
        .connect()
        .expect("connect to mock daemon")
}

fn protocol_error(err: &io::Error) -> Option<&ProtocolError> {
    match err.get_ref()?.downcast_ref::<ChronyError>()? {
        ChronyError::Protocol(p) => Some(p),
        _ => None,
    }
}

fn query_protocol_error(err: &QueryError) -> Option<&ProtocolError> {
    protocol_error(&err.error)
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as u32
}

#[test]
fn test_tracking_end_to_end() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    assert_eq!(client.version(), 6);

    let tracking = client.tracking().unwrap();
    assert_eq!(tracking.ref_id, 0x4750_5300);
    assert_eq!(tracking.reference_id().to_string(), "GPS");
    assert_eq!(tracking.ip_addr, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    assert_eq!(tracking.stratum, 1);
    assert_eq!(tracking.leap(), LeapStatus::Normal);
    assert_eq!(tracking.ref_time.seconds, 1_700_000_000);
    assert_eq!(tracking.ref_time.nanos, 123_456_789);

    assert_eq!(tracking.current_correction.to_f64(), 1.0);
    assert_eq!(tracking.last_offset.to_f64(), -0.000_732_421_875);
    assert_eq!(tracking.rms_offset.to_f64(), 0.0);
    assert_eq!(tracking.freq_ppm.to_f64(), 12.5);
    assert_eq!(tracking.resid_freq_ppm.to_f64(), 0.0);
    assert_eq!(tracking.skew_ppm.to_f64(), 0.0);
    assert_eq!(tracking.root_delay.to_f64(), 0.0);
    assert_eq!(tracking.root_dispersion.to_f64(), 0.0);
    assert_eq!(tracking.last_update_interval.to_f64(), 64.0);
    assert_eq!(tracking.last_offset.scaled(), -732_421);
}

#[test]
fn test_activity_end_to_end() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    assert_eq!(client.activity().unwrap(), ACTIVITY);
}

#[test]
fn test_ping() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    client.ping().unwrap();

    let requests = daemon.requests();
    let last = requests.last().unwrap();
    assert_eq!(last.command, REQ_NULL);
    assert_eq!(last.version, 6);
}

#[test]
fn test_negotiation_prefers_first_candidate() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let client = connect(&daemon);
    assert_eq!(client.version(), 6);

    let probes = daemon.requests();
    assert_eq!(probes.len(), 1);
    assert_eq!(probes[0].command, REQ_NULL);
    assert_eq!(probes[0].version, 6);
}

#[test]
fn test_negotiation_pins_fallback_version() {
    let daemon = MockDaemon::spawn(Behavior::answering(&[5]));
    let mut client = ChronyClient::builder(daemon.addr())
        .timeout(SHORT)
        .connect()
        .unwrap();
    assert_eq!(client.version(), 5);

    let tracking = client.tracking().unwrap();
    assert_eq!(tracking.stratum, 1);

    let requests = daemon.requests();
    let versions: Vec<u8> = requests.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![6, 5, 5]);
    assert_eq!(requests[2].command, REQ_TRACKING);
}

#[test]
fn test_negotiation_silent_daemon_falls_back_to_default() {
    let daemon = MockDaemon::spawn(Behavior::silent());
    let mut client = ChronyClient::builder(daemon.addr())
        .timeout(SHORT)
        .connect()
        .expect("negotiation failure must not fail the connection");
    assert_eq!(client.version(), 6);
    assert_eq!(daemon.requests().len(), 2);

    // The daemon stays silent, so queries time out but do not poison the client.
    let err = client.ping().unwrap_err();
    assert!(matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ));
    assert!(!client.is_closed());
}

#[test]
fn test_negotiation_uses_configured_default() {
    let daemon = MockDaemon::spawn(Behavior::silent());
    let client = ChronyClient::builder(daemon.addr())
        .timeout(SHORT)
        .versions([6u8])
        .default_version(5)
        .connect()
        .unwrap();
    assert_eq!(client.version(), 5);
}

#[test]
fn test_sequence_mismatch_returns_parsed_header() {
    let daemon = MockDaemon::spawn(Behavior {
        tamper: Tamper::Sequence,
        ..Default::default()
    });
    let mut client = connect(&daemon);

    let err = client
        .query(Request::new(6, REQ_TRACKING, 0x1000))
        .unwrap_err();
    let header = err.reply.expect("parsed header attached");
    assert_eq!(header.sequence, 0x1001);
    assert_eq!(header.reply, RPY_TRACKING);
    assert_eq!(
        query_protocol_error(&err),
        Some(&ProtocolError::SequenceMismatch {
            expected: 0x1000,
            received: 0x1001
        })
    );

    // The public operation reports the same failure without the header.
    let err = client.tracking().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(matches!(
        protocol_error(&err),
        Some(ProtocolError::SequenceMismatch { .. })
    ));
}

#[test]
fn test_packet_type_mismatch_returns_parsed_header() {
    let daemon = MockDaemon::spawn(Behavior {
        tamper: Tamper::PacketType,
        ..Default::default()
    });
    let mut client = connect(&daemon);

    let err = client.query(Request::new(6, REQ_ACTIVITY, 77)).unwrap_err();
    let header = err.reply.unwrap();
    assert_eq!(header.packet_type, PKT_TYPE_CMD_REQUEST);
    assert_eq!(header.sequence, 77);
    assert_eq!(
        query_protocol_error(&err),
        Some(&ProtocolError::UnexpectedPacketType {
            received: PKT_TYPE_CMD_REQUEST
        })
    );
}

#[test]
fn test_version_mismatch_returns_parsed_header() {
    let daemon = MockDaemon::spawn(Behavior {
        tamper: Tamper::Version,
        ..Default::default()
    });
    let mut client = connect(&daemon);

    let err = client.query(Request::new(6, REQ_TRACKING, 5)).unwrap_err();
    let header = err.reply.unwrap();
    assert_eq!(header.version, 5);
    assert_eq!(header.packet_type, PKT_TYPE_CMD_REPLY);
    assert_eq!(
        query_protocol_error(&err),
        Some(&ProtocolError::VersionMismatch {
            expected: 6,
            received: 5
        })
    );
}

#[test]
fn test_truncated_reply_is_decode_error() {
    let daemon = MockDaemon::spawn(Behavior {
        tamper: Tamper::Truncate,
        ..Default::default()
    });
    let mut client = connect(&daemon);

    let err = client.query(Request::new(6, REQ_TRACKING, 9)).unwrap_err();
    assert!(err.reply.is_none());
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    let inner = err.error.get_ref().unwrap().downcast_ref::<ParseError>();
    assert_eq!(
        inner,
        Some(&ParseError::BufferTooShort {
            needed: 28,
            available: 20
        })
    );
}

#[test]
fn test_sequence_defaults_to_unix_time() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);

    let before = unix_now();
    let reply = client.query(Request::new(6, REQ_NULL, 0)).unwrap();
    let after = unix_now();

    assert!(reply.header.sequence >= before && reply.header.sequence <= after);
    let sent = daemon.requests().last().copied().unwrap();
    assert_eq!(sent.sequence, reply.header.sequence);
}

#[test]
fn test_explicit_sequence_is_sent_verbatim() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    let reply = client
        .query(Request::new(6, REQ_NULL, 0xCAFE_F00D))
        .unwrap();
    assert_eq!(reply.header.sequence, 0xCAFE_F00D);
    assert!(reply.payload.is_empty());
}

#[test]
fn test_unset_version_fails_without_io() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    let sent_before = daemon.requests().len();

    let err = client.query(Request::new(0, REQ_TRACKING, 1)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(err.reply.is_none());

    // Let any stray datagram reach the daemon before counting.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(daemon.requests().len(), sent_before);
}

#[test]
fn test_timeout_leaves_client_reusable() {
    let daemon = MockDaemon::spawn(Behavior {
        delay_first: Some(Duration::from_millis(400)),
        ..Default::default()
    });
    let mut client = ChronyClient::builder(daemon.addr())
        .timeout(SHORT)
        .connect()
        .unwrap();

    let err = client.tracking().unwrap_err();
    assert!(matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ));

    // Let the late reply land in the socket queue.
    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(client.activity().unwrap(), ACTIVITY);
}

#[test]
fn test_late_reply_during_next_query_is_never_decoded() {
    let daemon = MockDaemon::spawn(Behavior {
        delay_first: Some(Duration::from_millis(300)),
        ..Default::default()
    });
    let mut client = ChronyClient::builder(daemon.addr())
        .timeout(SHORT)
        .connect()
        .unwrap();

    assert!(client.tracking().is_err());

    // No pause: the tracking reply arrives while activity() is waiting and
    // carries the same Unix-second sequence number.
    let mut answered = false;
    for _ in 0..3 {
        match client.activity() {
            Ok(activity) => {
                assert_eq!(activity, ACTIVITY);
                answered = true;
                break;
            }
            Err(err) => {
                assert_eq!(err.kind(), io::ErrorKind::InvalidData);
                assert!(matches!(
                    protocol_error(&err),
                    Some(
                        ProtocolError::UnexpectedReply {
                            command: REQ_TRACKING,
                            reply: RPY_TRACKING,
                            ..
                        } | ProtocolError::SequenceMismatch { .. }
                    )
                ));
            }
        }
    }
    assert!(answered);
}

#[test]
fn test_connect_skips_unusable_addresses() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let broadcast = SocketAddr::from((Ipv4Addr::BROADCAST, daemon.addr().port()));
    let addrs = [broadcast, daemon.addr()];

    let mut client = ChronyClient::builder(&addrs[..])
        .timeout(Duration::from_secs(2))
        .connect()
        .unwrap();
    assert_eq!(client.peer_addr(), daemon.addr());
    client.ping().unwrap();
}

#[test]
fn test_close_is_idempotent() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let mut client = connect(&daemon);
    assert!(client.local_addr().is_ok());
    assert_eq!(client.peer_addr(), daemon.addr());
    assert_eq!(client.timeout(), Duration::from_secs(2));

    client.close();
    client.close();
    assert!(client.is_closed());
    assert!(client.local_addr().is_err());

    let err = client.ping().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);
}

#[test]
fn test_connect_with_defaults() {
    let daemon = MockDaemon::spawn(Behavior::default());
    let client = ChronyClient::connect(daemon.addr()).unwrap();
    assert_eq!(client.version(), 6);
    assert_eq!(client.timeout(), Duration::from_secs(5));
}

// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Blocking chrony command client.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let mut client = candm_client::ChronyClient::builder("127.0.0.1:323")
//!     .timeout(Duration::from_secs(1))
//!     .connect()?;
//! let tracking = client.tracking()?;
//! println!(
//!     "ref {} stratum {} offset {:+.9}s",
//!     tracking.reference_id(),
//!     tracking.stratum,
//!     tracking.last_offset.to_f64()
//! );
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use candm_proto::protocol::{
    ActivityPayload, DEFAULT_PROTO_VERSION, MAX_REPLY_SIZE, REQ_NULL, RPY_NULL, ReplyPayload,
    Request, SUPPORTED_VERSIONS, TrackingPayload,
};
use tracing::{debug, warn};

use crate::error::{ChronyError, ConfigError};
use crate::query::{QueryError, Reply, prepare_request, validate_reply};
use crate::transport::UdpTransport;

/// Default per-call timeout for send and for receive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client settings fixed at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Deadline applied separately to each send and each receive.
    pub timeout: Duration,
    /// Candidate protocol versions, probed in order during negotiation.
    pub versions: Vec<u8>,
    /// Version used when no candidate is confirmed by the daemon.
    pub default_version: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout: DEFAULT_TIMEOUT,
            versions: SUPPORTED_VERSIONS.to_vec(),
            default_version: DEFAULT_PROTO_VERSION,
        }
    }
}

impl ClientConfig {
    /// Check the settings, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.versions.is_empty() {
            return Err(ConfigError::NoVersions);
        }
        if self.default_version == 0 || self.versions.contains(&0) {
            return Err(ConfigError::VersionUnset);
        }
        Ok(())
    }
}

/// Builder for [`ChronyClient`].
#[derive(Clone, Debug)]
pub struct ChronyClientBuilder<A> {
    addr: A,
    config: ClientConfig,
}

impl<A: ToSocketAddrs + fmt::Debug> ChronyClientBuilder<A> {
    /// Set the per-call timeout (default 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the candidate protocol versions in probe order (default `[6, 5]`).
    pub fn versions(mut self, versions: impl Into<Vec<u8>>) -> Self {
        self.config.versions = versions.into();
        self
    }

    /// Set the fallback version used when negotiation confirms nothing (default 6).
    pub fn default_version(mut self, version: u8) -> Self {
        self.config.default_version = version;
        self
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Open the socket and negotiate the protocol version.
    pub fn connect(self) -> io::Result<ChronyClient> {
        ChronyClient::with_config(self.addr, self.config)
    }
}

/// A blocking client for chronyd's command port.
///
/// Each operation blocks for at most the configured timeout on send plus the
/// same on receive. Operations take `&mut self`, so only one query is ever in
/// flight; share a client across threads behind a `Mutex` or use one client
/// per thread.
#[derive(Debug)]
pub struct ChronyClient {
    transport: UdpTransport,
    config: ClientConfig,
    version: u8,
}

impl ChronyClient {
    /// Connect with default settings and negotiate the protocol version.
    pub fn connect<A: ToSocketAddrs + fmt::Debug>(addr: A) -> io::Result<Self> {
        Self::with_config(addr, ClientConfig::default())
    }

    /// Start building a client for `addr`.
    pub fn builder<A: ToSocketAddrs + fmt::Debug>(addr: A) -> ChronyClientBuilder<A> {
        ChronyClientBuilder {
            addr,
            config: ClientConfig::default(),
        }
    }

    /// Connect with explicit settings and negotiate the protocol version.
    ///
    /// Negotiation never fails the connection: when no candidate version is
    /// confirmed the configured default is used.
    pub fn with_config<A: ToSocketAddrs + fmt::Debug>(
        addr: A,
        config: ClientConfig,
    ) -> io::Result<Self> {
        config.validate().map_err(ChronyError::Config)?;
        let transport = UdpTransport::connect(addr)?;
        let mut client = ChronyClient {
            transport,
            version: config.default_version,
            config,
        };
        client.version = client.negotiate();
        Ok(client)
    }

    fn negotiate(&mut self) -> u8 {
        let candidates = self.config.versions.clone();
        for version in candidates {
            // A reply in another version fails validation.
            match self.query(Request::new(version, REQ_NULL, 0)) {
                Ok(_) => {
                    debug!(version, peer = %self.peer_addr(), "protocol version confirmed");
                    return version;
                }
                Err(e) => {
                    debug!(version, error = %e, "version probe failed");
                }
            }
        }
        warn!(
            version = self.config.default_version,
            peer = %self.peer_addr(),
            "no protocol version confirmed, using default"
        );
        self.config.default_version
    }

    /// Send one request and return the validated reply.
    ///
    /// A zero sequence number is replaced by the current Unix time in seconds.
    /// On a validation mismatch the returned error carries the parsed reply header.
    pub fn query(&mut self, request: Request) -> Result<Reply, QueryError> {
        let (request, send_buf) = prepare_request(request)?;
        self.transport.discard_pending()?;
        self.transport.send(&send_buf, self.config.timeout)?;
        let mut recv_buf = [0u8; MAX_REPLY_SIZE];
        let recv_len = self.transport.receive(&mut recv_buf, self.config.timeout)?;
        validate_reply(&request, &recv_buf[..recv_len])
    }

    /// Request the payload `T` with the negotiated version and decode the reply.
    pub fn fetch<T: ReplyPayload>(&mut self) -> io::Result<T> {
        let reply = self.query(Request::new(self.version, T::COMMAND, 0))?;
        reply.decode_payload()
    }

    /// Fetch the daemon's tracking snapshot.
    pub fn tracking(&mut self) -> io::Result<TrackingPayload> {
        self.fetch()
    }

    /// Fetch the counts of sources by state.
    pub fn activity(&mut self) -> io::Result<ActivityPayload> {
        self.fetch()
    }

    /// Check that the daemon answers.
    pub fn ping(&mut self) -> io::Result<()> {
        let reply = self.query(Request::new(self.version, REQ_NULL, 0))?;
        reply.expect(REQ_NULL, RPY_NULL)
    }

    /// Release the socket. Later operations fail with `NotConnected`.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// The negotiated protocol version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The daemon's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.transport.peer_addr()
    }

    /// The local socket address, or an error once closed.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }
}

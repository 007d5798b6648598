// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Async chrony command client using the Tokio runtime.
//!
//! Mirrors [`ChronyClient`](crate::ChronyClient): the same negotiation, the same
//! three operations and the same reply validation, with
//! [`tokio::net::UdpSocket`] for I/O and [`tokio::time::timeout`] bounding each
//! send and each receive.
//!
//! # Runtime Requirements
//!
//! These functions must be called from within a Tokio runtime context.
//! The library does **not** create a runtime.
//!
//! # Cancellation
//!
//! Dropping an operation's future abandons the query. The client stays usable:
//! any late reply still queued on the socket is discarded before the next
//! request is sent.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! let mut client = candm_client::async_client::AsyncChronyClient::connect("127.0.0.1:323").await?;
//! let activity = client.activity().await?;
//! println!("{} sources online", activity.online);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use candm_proto::protocol::{
    ActivityPayload, MAX_REPLY_SIZE, REQ_NULL, RPY_NULL, ReplyPayload, Request, TrackingPayload,
};
use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{debug, warn};

use crate::client::ClientConfig;
use crate::error::{ChronyError, ConfigError, TimeoutError};
use crate::query::{QueryError, Reply, prepare_request, validate_reply};
use crate::transport::bind_addr_for;

/// An async client for chronyd's command port.
#[derive(Debug)]
pub struct AsyncChronyClient {
    sock: Option<UdpSocket>,
    peer: SocketAddr,
    config: ClientConfig,
    version: u8,
}

impl AsyncChronyClient {
    /// Connect with default settings and negotiate the protocol version.
    pub async fn connect<A: ToSocketAddrs + fmt::Debug>(addr: A) -> io::Result<Self> {
        Self::with_config(addr, ClientConfig::default()).await
    }

    /// Connect with explicit settings and negotiate the protocol version.
    ///
    /// Resolved addresses are tried in order; the first that accepts a socket
    /// is used.
    pub async fn with_config<A: ToSocketAddrs + fmt::Debug>(
        addr: A,
        config: ClientConfig,
    ) -> io::Result<Self> {
        config.validate().map_err(ChronyError::Config)?;
        let address = format!("{addr:?}");
        let mut last_err = None;
        for peer in tokio::net::lookup_host(addr).await? {
            match Self::connect_one(peer).await {
                Ok(sock) => {
                    let mut client = AsyncChronyClient {
                        sock: Some(sock),
                        peer,
                        version: config.default_version,
                        config,
                    };
                    client.version = client.negotiate().await;
                    return Ok(client);
                }
                Err(e) => {
                    debug!(%peer, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ChronyError::Config(ConfigError::NoAddresses { address }).into()
        }))
    }

    async fn connect_one(peer: SocketAddr) -> io::Result<UdpSocket> {
        let sock = UdpSocket::bind(bind_addr_for(&peer)).await?;
        sock.connect(peer).await?;
        debug!(%peer, local = ?sock.local_addr(), "connected");
        Ok(sock)
    }

    async fn negotiate(&mut self) -> u8 {
        let candidates = self.config.versions.clone();
        for version in candidates {
            // A reply in another version fails validation.
            match self.query(Request::new(version, REQ_NULL, 0)).await {
                Ok(_) => {
                    debug!(version, peer = %self.peer, "protocol version confirmed");
                    return version;
                }
                Err(e) => {
                    debug!(version, error = %e, "version probe failed");
                }
            }
        }
        warn!(
            version = self.config.default_version,
            peer = %self.peer,
            "no protocol version confirmed, using default"
        );
        self.config.default_version
    }

    fn socket(&self) -> io::Result<&UdpSocket> {
        self.sock
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "client is closed"))
    }

    fn discard_pending(sock: &UdpSocket) -> io::Result<()> {
        let mut scratch = [0u8; MAX_REPLY_SIZE];
        let mut discarded = 0usize;
        loop {
            match sock.try_recv(&mut scratch) {
                Ok(_) => discarded += 1,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => discarded += 1,
                Err(e) => return Err(e),
            }
        }
        if discarded > 0 {
            debug!(datagrams = discarded, "discarded stale datagrams");
        }
        Ok(())
    }

    /// Send one request and return the validated reply.
    ///
    /// Send and receive are each bounded by the configured timeout; expiry is
    /// reported as [`TimeoutError::Send`] or [`TimeoutError::Recv`].
    pub async fn query(&mut self, request: Request) -> Result<Reply, QueryError> {
        let (request, send_buf) = prepare_request(request)?;
        let timeout = self.config.timeout;
        let sock = self.socket()?;
        Self::discard_pending(sock)?;

        let sent = tokio::time::timeout(timeout, sock.send(&send_buf))
            .await
            .map_err(|_| ChronyError::Timeout(TimeoutError::Send))??;
        debug!(bytes = sent, "sent");

        let mut recv_buf = [0u8; MAX_REPLY_SIZE];
        let recv_len = tokio::time::timeout(timeout, sock.recv(&mut recv_buf))
            .await
            .map_err(|_| ChronyError::Timeout(TimeoutError::Recv))??;
        debug!(bytes = recv_len, "recv");

        validate_reply(&request, &recv_buf[..recv_len])
    }

    /// Request the payload `T` with the negotiated version and decode the reply.
    pub async fn fetch<T: ReplyPayload>(&mut self) -> io::Result<T> {
        let reply = self.query(Request::new(self.version, T::COMMAND, 0)).await?;
        reply.decode_payload()
    }

    /// Fetch the daemon's tracking snapshot.
    pub async fn tracking(&mut self) -> io::Result<TrackingPayload> {
        self.fetch().await
    }

    /// Fetch the counts of sources by state.
    pub async fn activity(&mut self) -> io::Result<ActivityPayload> {
        self.fetch().await
    }

    /// Check that the daemon answers.
    pub async fn ping(&mut self) -> io::Result<()> {
        let reply = self.query(Request::new(self.version, REQ_NULL, 0)).await?;
        reply.expect(REQ_NULL, RPY_NULL)
    }

    /// Release the socket. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        if self.sock.take().is_some() {
            debug!(peer = %self.peer, "closed");
        }
    }

    /// The negotiated protocol version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The daemon's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// The local socket address, or an error once closed.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket()?.local_addr()
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.sock.is_none()
    }
}

// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Datagram transport bound to a single chronyd endpoint.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use candm_proto::protocol::MAX_REPLY_SIZE;
use tracing::debug;

use crate::error::{ChronyError, ConfigError};

/// Return the unspecified bind address matching the target's address family.
pub(crate) fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// A connected UDP socket with per-call deadlines.
///
/// The socket is connected to the peer, so the kernel drops datagrams from
/// any other source before [`receive`](Self::receive) sees them.
#[derive(Debug)]
pub(crate) struct UdpTransport {
    sock: Option<UdpSocket>,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Resolve `addr` and connect to the first address that accepts a socket.
    pub(crate) fn connect<A: ToSocketAddrs + fmt::Debug>(addr: A) -> io::Result<Self> {
        let mut last_err = None;
        for peer in addr.to_socket_addrs()? {
            match Self::connect_one(peer) {
                Ok(transport) => return Ok(transport),
                Err(e) => {
                    debug!(%peer, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ChronyError::Config(ConfigError::NoAddresses {
                address: format!("{addr:?}"),
            })
            .into()
        }))
    }

    fn connect_one(peer: SocketAddr) -> io::Result<Self> {
        let sock = UdpSocket::bind(bind_addr_for(&peer))?;
        sock.connect(peer)?;
        debug!(%peer, local = ?sock.local_addr(), "connected");
        Ok(UdpTransport {
            sock: Some(sock),
            peer,
        })
    }

    fn socket(&self) -> io::Result<&UdpSocket> {
        self.sock
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))
    }

    /// Send one datagram, failing if it cannot be written within `timeout`.
    pub(crate) fn send(&self, buf: &[u8], timeout: Duration) -> io::Result<()> {
        let sock = self.socket()?;
        sock.set_write_timeout(Some(timeout))?;
        let sent = sock.send(buf)?;
        debug!(bytes = sent, "sent");
        if sent != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {sent} of {} bytes", buf.len()),
            ));
        }
        Ok(())
    }

    /// Receive one datagram into `buf`, waiting at most `timeout`.
    ///
    /// Returns the number of bytes received. Datagrams longer than `buf` are
    /// truncated by the socket.
    pub(crate) fn receive(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let sock = self.socket()?;
        sock.set_read_timeout(Some(timeout))?;
        let received = sock.recv(buf)?;
        debug!(bytes = received, "recv");
        Ok(received)
    }

    /// Drop every datagram already queued on the socket without blocking.
    ///
    /// Returns the number of datagrams discarded.
    pub(crate) fn discard_pending(&self) -> io::Result<usize> {
        let sock = self.socket()?;
        sock.set_nonblocking(true)?;
        let mut scratch = [0u8; MAX_REPLY_SIZE];
        let mut discarded = 0;
        let result = loop {
            match sock.recv(&mut scratch) {
                Ok(_) => discarded += 1,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(discarded),
                // A refused probe leaves a pending ICMP error; it belongs to the old query.
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => discarded += 1,
                Err(e) => break Err(e),
            }
        };
        sock.set_nonblocking(false)?;
        if let Ok(n) = result {
            if n > 0 {
                debug!(datagrams = n, "discarded stale datagrams");
            }
        }
        result
    }

    /// Release the socket. Calling this more than once is a no-op.
    pub(crate) fn close(&mut self) {
        if self.sock.take().is_some() {
            debug!(peer = %self.peer, "closed");
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sock.is_none()
    }

    pub(crate) fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket()?.local_addr()
    }
}

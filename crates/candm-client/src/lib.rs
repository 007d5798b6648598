// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Client for the chrony daemon's command-and-monitoring (candm) protocol.

The client talks to chronyd's UDP command port, negotiates the protocol
version once at connection time, and exposes three read-only operations:
a tracking snapshot, source activity counts and a liveness probe.

# Example

```rust,no_run
fn main() -> std::io::Result<()> {
    let mut client = candm_client::ChronyClient::connect("127.0.0.1:323")?;
    let tracking = client.tracking()?;
    println!("reference: {} ({})", tracking.reference_id(), tracking.ip_addr);
    println!("stratum:   {}", tracking.stratum);
    println!("offset:    {:+.9} s", tracking.last_offset.to_f64());
    println!("leap:      {}", tracking.leap());
    Ok(())
}
```

# Feature Flags

| Feature | Default | Description |
|---------|---------|-------------|
| `tokio` | no | [`AsyncChronyClient`](async_client::AsyncChronyClient) using the tokio runtime. |

# Errors

All operations return `io::Result`. Protocol, timeout and configuration
failures are carried as an [`error::ChronyError`] inside the `io::Error` and
can be recovered with `get_ref()` and `downcast_ref`. The lower-level
[`ChronyClient::query`] returns a [`QueryError`] that also keeps the parsed
header of a reply that failed validation.
*/

#![warn(missing_docs)]

pub use candm_proto::{numeric, protocol};

/// Async client using the Tokio runtime.
#[cfg(feature = "tokio")]
pub mod async_client;

mod client;
pub mod error;
mod query;
mod transport;

pub use client::{ChronyClient, ChronyClientBuilder, ClientConfig, DEFAULT_TIMEOUT};
pub use query::{QueryError, Reply};

#[cfg(feature = "tokio")]
pub use async_client::AsyncChronyClient;

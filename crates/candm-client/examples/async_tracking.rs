// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Poll several chronyd instances concurrently.
//!
//! Run with: `cargo run --example async_tracking --features tokio -- 127.0.0.1:323 [::1]:323`

use std::time::Duration;

use candm_client::{AsyncChronyClient, ClientConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer())
        .init();

    let mut daemons: Vec<String> = std::env::args().skip(1).collect();
    if daemons.is_empty() {
        daemons.push("127.0.0.1:323".to_string());
    }

    let handles: Vec<_> = daemons
        .into_iter()
        .map(|addr| {
            tokio::spawn(async move {
                let config = ClientConfig {
                    timeout: Duration::from_secs(1),
                    ..Default::default()
                };
                let result = async {
                    let mut client = AsyncChronyClient::with_config(addr.as_str(), config).await?;
                    let tracking = client.tracking().await?;
                    let activity = client.activity().await?;
                    Ok::<_, std::io::Error>((client.version(), tracking, activity))
                }
                .await;
                (addr, result)
            })
        })
        .collect();

    for handle in handles {
        let (addr, result) = handle.await.unwrap();
        match result {
            Ok((version, t, a)) => println!(
                "{}: v{} ref={} stratum={} offset={:+.9}s online={} offline={}",
                addr,
                version,
                t.reference_id(),
                t.stratum,
                t.last_offset.to_f64(),
                a.online,
                a.offline
            ),
            Err(e) => println!("{}: error: {}", addr, e),
        }
    }
}

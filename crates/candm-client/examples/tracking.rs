// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Print chronyd's tracking state and source activity, like `chronyc tracking`.
//!
//! Run with: `RUST_LOG=debug cargo run --example tracking -- 127.0.0.1:323`

use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:323".to_string());

    let mut client = candm_client::ChronyClient::builder(addr.as_str())
        .timeout(Duration::from_secs(1))
        .connect()?;
    println!("Protocol version : {}", client.version());

    let t = client.tracking()?;
    println!("Reference ID     : {:08X} ({})", t.ref_id, t.reference_id());
    println!("Source address   : {}", t.ip_addr);
    println!("Stratum          : {}", t.stratum);
    println!(
        "Ref time (UTC)   : {}.{:09}",
        t.ref_time.seconds, t.ref_time.nanos
    );
    println!(
        "System time      : {:.9} seconds",
        t.current_correction.to_f64()
    );
    println!("Last offset      : {:+.9} seconds", t.last_offset.to_f64());
    println!("RMS offset       : {:.9} seconds", t.rms_offset.to_f64());
    println!("Frequency        : {:.3} ppm", t.freq_ppm.to_f64());
    println!("Residual freq    : {:+.3} ppm", t.resid_freq_ppm.to_f64());
    println!("Skew             : {:.3} ppm", t.skew_ppm.to_f64());
    println!("Root delay       : {:.9} seconds", t.root_delay.to_f64());
    println!("Root dispersion  : {:.9} seconds", t.root_dispersion.to_f64());
    println!(
        "Update interval  : {:.1} seconds",
        t.last_update_interval.to_f64()
    );
    println!("Leap status      : {}", t.leap());

    let a = client.activity()?;
    println!();
    println!("{} sources online", a.online);
    println!("{} sources offline", a.offline);
    println!("{} sources doing burst (return to online)", a.burst_online);
    println!("{} sources doing burst (return to offline)", a.burst_offline);
    println!("{} sources with unknown address", a.unresolved);

    client.close();
    Ok(())
}

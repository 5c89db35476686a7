// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic properties example.
//!
//! This example demonstrates:
//! - Layering a runtime override config over a polled remote source and defaults
//! - Reading a subtree through a prefixed view
//! - Typed property handles that follow every change
//! - Counting property reads with a usage tracker
//!
//! To run this example:
//! ```bash
//! cargo run --example dynamic_properties
//! ```

use livecfg::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== livecfg: Dynamic Properties Example ===\n");

    // A fake remote store the polling config reads from
    let remote = Arc::new(Mutex::new(vec![
        ("server.port".to_string(), "8080".to_string()),
        ("server.workers".to_string(), "4".to_string()),
    ]));
    let remote_reader = Arc::clone(&remote);

    let tracker = Arc::new(
        UsageTracker::builder()
            .on_flush(|usage| {
                for record in usage {
                    println!("  read {} x{}", record.details, record.count);
                }
            })
            .build(),
    );
    let strategy = Arc::new(ManualPollingStrategy::new());
    let polled = PollingConfig::builder(
        move || {
            Ok(PollingResponse::for_snapshot(
                remote_reader.lock().clone(),
                Vec::new(),
            ))
        },
        strategy.clone(),
    )
    .name("remote")
    .access_monitor(tracker.clone())
    .build()?;
    strategy.fire()?;

    let overrides = Arc::new(SettableConfig::with_name("overrides"));
    let defaults = Arc::new(
        MapConfig::builder()
            .name("defaults")
            .put("server.host", "0.0.0.0")
            .put("server.port", 80)
            .put("server.url", "http://${server.host}:${server.port}")
            .build(),
    );

    let app = CompositeConfig::builder()
        .name("app")
        .with_config("overrides", overrides.clone())?
        .with_config("remote", polled.clone())?
        .with_config("defaults", defaults)?
        .build()?;

    let server = app.prefixed_view("server");
    let factory = PropertyFactory::new(server.clone());
    let port = factory.get_property("port").as_integer(0);
    let workers = factory.get_property("workers").as_integer(1);
    port.add_listener(|value| println!("  port is now {}", value));

    println!("=== Initial Values ===");
    println!("  port = {}", port.get());
    println!("  workers = {}", workers.get());
    println!("  url = {}", server.get_string_or("url", "<unset>"));

    println!("\n=== Remote Update ===");
    remote.lock()[0].1 = "9090".to_string();
    strategy.fire()?;
    println!("  url = {}", server.get_string_or("url", "<unset>"));

    println!("\n=== Runtime Override ===");
    overrides.set_property("server.port", 7000);
    println!("  url = {}", server.get_string_or("url", "<unset>"));

    println!("\n=== Override Cleared ===");
    overrides.clear_property("server.port");
    println!("  port = {}", port.get());

    println!("\n=== Usage ===");
    tracker.flush();

    Ok(())
}

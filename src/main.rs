//! Rover firmware — main entry point.
//!
//! Wires the control core to the real hardware: claims the GPIO pins,
//! registers the SIGINT handler that clears the running flag, and hands
//! control to the drive loop. Exit code 0 on a graceful interrupt,
//! 1 if the GPIO subsystem cannot be brought up.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::info;

use rover::config::RoverConfig;
use rover::drive::DriveController;
use rover::events::LogEventSink;
use rover::hw::rpi::RpiGpio;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("rover v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration (fixed at startup, no files) ─────────
    let config = RoverConfig::default();
    config.validate().context("configuration rejected")?;
    info!(
        "config: {}",
        serde_json::to_string(&config).context("config dump failed")?
    );

    // ── 2. SIGINT → cooperative cancellation flag ─────────────
    // The drive loop checks the flag once per cycle; the in-flight
    // maneuver always completes before the loop exits.
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("interrupt received, finishing current cycle");
        flag.store(false, Ordering::SeqCst);
    })
    .context("failed to register SIGINT handler")?;

    // ── 3. GPIO bring-up (the only fatal path) ────────────────
    let mut gpio = RpiGpio::new(&config.owned_pins()).context("GPIO init failed")?;

    // ── 4. Drive until interrupted ────────────────────────────
    let mut controller = DriveController::new(config);
    controller.init(&mut gpio);

    let mut sink = LogEventSink::new();
    controller.run(&mut gpio, &mut sink, &running);

    info!("shutdown complete");
    Ok(())
}

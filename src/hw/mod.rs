//! Hardware backends for the [`GpioPort`](crate::ports::GpioPort) boundary.
//!
//! ## Dual-target design
//!
//! On the Pi (`rpi` feature): [`rpi::RpiGpio`] drives real pins through
//! rppal. On host/test: [`mock::MockGpio`] replays a scripted echo
//! timeline against a simulated clock, so timing behavior — including
//! timeouts — is exercised deterministically and instantly.

pub mod mock;

#[cfg(feature = "rpi")]
pub mod rpi;

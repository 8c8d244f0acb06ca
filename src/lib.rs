//! Rover obstacle-avoidance firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. The control core is hardware-agnostic: every pin access
//! and every blocking delay goes through the [`ports::GpioPort`] trait,
//! so the whole drive loop runs deterministically against the scripted
//! backend in [`hw::mock`]. The real Raspberry Pi backend in [`hw::rpi`]
//! is gated behind the `rpi` cargo feature.
//!
//! ```text
//!   GpioPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   (pins,       │       DriveController        │     (structured
//!    clock,      │  DistanceSensor · median     │      drive events)
//!    delays)  ◀──│  MotorActuator · stuck check │
//!                └──────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod drive;
pub mod events;
pub mod filter;
pub mod hw;
pub mod motor;
pub mod ports;
pub mod sensor;

pub mod error;
pub mod pins;

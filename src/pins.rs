//! GPIO pin assignments for the rover main board.
//!
//! Single source of truth — every component references this module (via
//! [`RoverConfig`](crate::config::RoverConfig)) rather than hard-coding
//! pin numbers. All numbers use the Broadcom (BCM) numbering scheme.

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

/// Digital output: 10 µs trigger pulse starts a measurement.
pub const TRIGGER_GPIO: u8 = 4;
/// Digital input: echo pulse whose width encodes the round-trip time.
/// Must be level-shifted — the sensor echoes at 5 V.
pub const ECHO_GPIO: u8 = 17;

// ---------------------------------------------------------------------------
// L298N dual H-bridge (no PWM — speed is binary)
// ---------------------------------------------------------------------------

/// Motor 1 direction line A.
pub const MOTOR_IN1_GPIO: u8 = 27;
/// Motor 1 direction line B.
pub const MOTOR_IN2_GPIO: u8 = 22;
/// Motor 2 direction line A.
pub const MOTOR_IN3_GPIO: u8 = 5;
/// Motor 2 direction line B.
pub const MOTOR_IN4_GPIO: u8 = 6;

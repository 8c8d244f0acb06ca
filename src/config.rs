//! System configuration parameters
//!
//! All tunable parameters for the rover: pin wiring, echo-timing
//! constants, and the behavioral thresholds of the avoidance state
//! machine. Fixed at startup — there is no runtime reconfiguration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Core rover configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoverConfig {
    // --- Wiring (BCM numbering) ---
    /// HC-SR04 trigger pin (output).
    pub trigger_pin: u8,
    /// HC-SR04 echo pin (input).
    pub echo_pin: u8,
    /// H-bridge IN1 (motor 1 direction line A).
    pub motor_in1_pin: u8,
    /// H-bridge IN2 (motor 1 direction line B).
    pub motor_in2_pin: u8,
    /// H-bridge IN3 (motor 2 direction line A).
    pub motor_in3_pin: u8,
    /// H-bridge IN4 (motor 2 direction line B).
    pub motor_in4_pin: u8,

    // --- Echo timing ---
    /// Trigger held low before each ping to guarantee a clean edge (ms).
    pub settle_delay_ms: u64,
    /// Trigger pulse width (µs).
    pub trigger_pulse_us: u64,
    /// Hard deadline for the whole echo round trip (µs). 500 ms bounds
    /// the worst case to ~171 m, far beyond sensor range.
    pub echo_deadline_us: u64,

    // --- Avoidance thresholds ---
    /// Distance below which a forward-moving rover stops and turns (cm).
    pub obstacle_threshold_cm: f32,
    /// Distance below which a turning rover keeps turning (cm).
    pub turn_continue_threshold_cm: f32,
    /// Maximum spread between adjacent history samples for the rover to
    /// be considered wedged (cm).
    pub stuck_epsilon_cm: f32,

    // --- Maneuver delays ---
    /// Pause after a stop command (ms).
    pub stop_delay_ms: u64,
    /// Reverse duration when backing away from an obstacle (ms).
    pub reverse_delay_ms: u64,
    /// Longer reverse duration when recovering from a stuck condition (ms).
    pub reverse_stuck_delay_ms: u64,
    /// Pivot duration per turn step (ms).
    pub turn_delay_ms: u64,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            // Wiring
            trigger_pin: pins::TRIGGER_GPIO,
            echo_pin: pins::ECHO_GPIO,
            motor_in1_pin: pins::MOTOR_IN1_GPIO,
            motor_in2_pin: pins::MOTOR_IN2_GPIO,
            motor_in3_pin: pins::MOTOR_IN3_GPIO,
            motor_in4_pin: pins::MOTOR_IN4_GPIO,

            // Echo timing
            settle_delay_ms: 50,
            trigger_pulse_us: 10,
            echo_deadline_us: 500_000,

            // Thresholds
            obstacle_threshold_cm: 20.0,
            turn_continue_threshold_cm: 30.0,
            stuck_epsilon_cm: 1.0,

            // Maneuver delays
            stop_delay_ms: 200,
            reverse_delay_ms: 500,
            reverse_stuck_delay_ms: 1000,
            turn_delay_ms: 700,
        }
    }
}

impl RoverConfig {
    /// Every pin the firmware claims, sensor first. The echo pin is
    /// included: it is owned for the process lifetime even though it is
    /// never driven.
    pub fn owned_pins(&self) -> [u8; 6] {
        [
            self.trigger_pin,
            self.echo_pin,
            self.motor_in1_pin,
            self.motor_in2_pin,
            self.motor_in3_pin,
            self.motor_in4_pin,
        ]
    }

    /// Reject inconsistent values before any pin is claimed. Invalid
    /// ranges are errors, not silently clamped.
    pub fn validate(&self) -> Result<()> {
        let pins = self.owned_pins();
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err(Error::Config("pin assigned to more than one line"));
            }
        }
        if self.trigger_pulse_us == 0 {
            return Err(Error::Config("trigger pulse width must be non-zero"));
        }
        if self.echo_deadline_us == 0 {
            return Err(Error::Config("echo deadline must be non-zero"));
        }
        if self.obstacle_threshold_cm <= 0.0 {
            return Err(Error::Config("obstacle threshold must be positive"));
        }
        if self.turn_continue_threshold_cm < self.obstacle_threshold_cm {
            return Err(Error::Config(
                "turn-continue threshold must not be below the obstacle threshold",
            ));
        }
        if self.stuck_epsilon_cm <= 0.0 {
            return Err(Error::Config("stuck epsilon must be positive"));
        }
        if self.stop_delay_ms == 0 || self.reverse_delay_ms == 0 || self.turn_delay_ms == 0 {
            return Err(Error::Config("maneuver delays must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = RoverConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.turn_continue_threshold_cm > c.obstacle_threshold_cm);
        assert!(c.echo_deadline_us > c.trigger_pulse_us);
        assert!(c.reverse_stuck_delay_ms >= c.reverse_delay_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = RoverConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: RoverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.trigger_pin, c2.trigger_pin);
        assert_eq!(c.echo_deadline_us, c2.echo_deadline_us);
        assert!((c.obstacle_threshold_cm - c2.obstacle_threshold_cm).abs() < 0.001);
    }

    #[test]
    fn duplicate_pin_rejected() {
        let c = RoverConfig {
            echo_pin: pins::TRIGGER_GPIO,
            ..Default::default()
        };
        assert_eq!(
            c.validate(),
            Err(Error::Config("pin assigned to more than one line"))
        );
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let c = RoverConfig {
            obstacle_threshold_cm: 40.0,
            ..Default::default()
        };
        assert!(c.validate().is_err(), "20cm-class turn threshold below a 40cm obstacle threshold would oscillate");
    }

    #[test]
    fn zero_deadline_rejected() {
        let c = RoverConfig {
            echo_deadline_us: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}

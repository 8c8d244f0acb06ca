//! HC-SR04 ultrasonic ranger.
//!
//! A measurement is a microsecond-precision timing exercise: pulse the
//! trigger line, then bound *both* echo-edge waits by one shared
//! deadline computed before the first poll. Sharing the deadline is the
//! correctness-critical part — a fresh deadline per poll would let a
//! pathological half-timeout double the allowed measurement window.
//!
//! ## Failure semantics
//!
//! A timeout is expected in normal operation (nothing reflected the
//! pulse, or the target is beyond range). It is logged and surfaced as
//! [`Reading::OutOfRange`], which collapses to the 0 cm sentinel before
//! filtering — the drive loop then treats it like a very close obstacle
//! and fails safe. There is no fatal path in this module.

use log::{debug, warn};

use crate::config::RoverConfig;
use crate::filter::median_of_three;
use crate::ports::{GpioPort, Level, PinMode};

/// Half the speed of sound in cm/µs: converts a round-trip echo pulse
/// width to a one-way distance.
const CM_PER_ROUND_TRIP_US: f32 = 0.017_150;

/// One distance measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Distance to the nearest reflecting surface.
    Centimeters(f32),
    /// The echo never arrived (or never ended) within the deadline.
    OutOfRange,
}

impl Reading {
    /// Collapse to the numeric sentinel the filter and the state
    /// machine operate on: out-of-range reads as 0 cm.
    pub fn cm(self) -> f32 {
        match self {
            Self::Centimeters(cm) => cm,
            Self::OutOfRange => 0.0,
        }
    }

    pub fn is_out_of_range(self) -> bool {
        matches!(self, Self::OutOfRange)
    }
}

/// Pure conversion from a ping/pong timestamp pair to centimeters.
pub fn distance_from_pulse(ping_us: u64, pong_us: u64) -> f32 {
    (pong_us.saturating_sub(ping_us)) as f32 * CM_PER_ROUND_TRIP_US
}

/// Busy-poll `pin` until it reads `target` or the shared deadline
/// elapses. Returns the timestamp of the edge, or `None` on timeout.
/// The level check runs before the deadline check, so an edge observed
/// exactly at the deadline still counts.
fn wait_for_level<G: GpioPort>(gpio: &mut G, pin: u8, target: Level, deadline_us: u64) -> Option<u64> {
    loop {
        if gpio.read(pin) == target {
            return Some(gpio.now_micros());
        }
        if gpio.now_micros() >= deadline_us {
            return None;
        }
    }
}

/// Forward-facing ultrasonic ranger. Owns the trigger (output) and echo
/// (input) pins for the process lifetime; holds no other state.
pub struct DistanceSensor {
    trigger_pin: u8,
    echo_pin: u8,
    settle_delay_ms: u64,
    trigger_pulse_us: u64,
    echo_deadline_us: u64,
}

impl DistanceSensor {
    pub fn new(config: &RoverConfig) -> Self {
        Self {
            trigger_pin: config.trigger_pin,
            echo_pin: config.echo_pin,
            settle_delay_ms: config.settle_delay_ms,
            trigger_pulse_us: config.trigger_pulse_us,
            echo_deadline_us: config.echo_deadline_us,
        }
    }

    /// Configure pin directions. Call once before the first measurement.
    pub fn init<G: GpioPort>(&self, gpio: &mut G) {
        gpio.set_mode(self.trigger_pin, PinMode::Output);
        gpio.set_mode(self.echo_pin, PinMode::Input);
        gpio.write(self.trigger_pin, Level::Low);
    }

    /// Run one full trigger/echo cycle.
    pub fn measure<G: GpioPort>(&self, gpio: &mut G) -> Reading {
        // Ensure the trigger line is settled low before pinging.
        gpio.write(self.trigger_pin, Level::Low);
        gpio.delay_ms(self.settle_delay_ms);

        // Trigger the ping.
        gpio.write(self.trigger_pin, Level::High);
        gpio.delay_us(self.trigger_pulse_us);
        gpio.write(self.trigger_pin, Level::Low);

        // One deadline bounds both edge waits.
        let deadline_us = gpio.now_micros() + self.echo_deadline_us;

        let Some(ping_us) = wait_for_level(gpio, self.echo_pin, Level::High, deadline_us) else {
            warn!("echo never rose within {} us — out of range", self.echo_deadline_us);
            return Reading::OutOfRange;
        };

        let Some(pong_us) = wait_for_level(gpio, self.echo_pin, Level::Low, deadline_us) else {
            warn!("echo never fell within the shared deadline — out of range");
            return Reading::OutOfRange;
        };

        Reading::Centimeters(distance_from_pulse(ping_us, pong_us))
    }

    /// Three measurements, median-filtered, as the sentinel-carrying
    /// centimeter value the drive loop consumes. A single dropout is
    /// rejected; two dropouts pull the result to 0.
    pub fn sample<G: GpioPort>(&self, gpio: &mut G) -> f32 {
        let a = self.measure(gpio).cm();
        let b = self.measure(gpio).cm();
        let c = self.measure(gpio).cm();

        let filtered = median_of_three(a, b, c);
        debug!("filtered distance {:.2} cm", filtered);
        filtered
    }

    /// Release owned pins: both read back as inputs so the lines float.
    pub fn release<G: GpioPort>(&self, gpio: &mut G) {
        gpio.set_mode(self.trigger_pin, PinMode::Input);
        gpio.set_mode(self.echo_pin, PinMode::Input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_pure_and_deterministic() {
        // 582 µs round trip → ~9.98 cm.
        let d = distance_from_pulse(1000, 1582);
        assert!((d - 9.98).abs() < 0.005, "got {d}");
    }

    #[test]
    fn conversion_of_zero_width_is_zero() {
        assert_eq!(distance_from_pulse(1000, 1000), 0.0);
    }

    #[test]
    fn out_of_range_reads_as_sentinel_zero() {
        assert_eq!(Reading::OutOfRange.cm(), 0.0);
        assert!(Reading::OutOfRange.is_out_of_range());
        assert!(!Reading::Centimeters(0.0).is_out_of_range());
    }
}

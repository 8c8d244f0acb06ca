//! Raspberry Pi GPIO backend over rppal.
//!
//! One-shot bring-up: every pin the rover owns is claimed here, before
//! the control loop starts, and a failure to claim any of them is
//! fatal (exit code 1) — no safe autonomous operation is possible
//! without working outputs. After construction no GPIO call can fail.
//!
//! Pin numbers are BCM. The microsecond clock is monotonic from
//! process start; only differences are meaningful.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{error, info};
use rppal::gpio::{Gpio, IoPin, Mode};

use crate::error::InitError;
use crate::ports::{GpioPort, Level, PinMode};

/// Below this, `delay_us` spins instead of sleeping: the scheduler's
/// wake-up granularity would stretch a 10 µs trigger pulse by an order
/// of magnitude.
const SPIN_THRESHOLD_US: u64 = 1000;

pub struct RpiGpio {
    pins: HashMap<u8, IoPin>,
    epoch: Instant,
}

impl RpiGpio {
    /// Claim every listed pin (initially as input) from the GPIO
    /// character device.
    pub fn new(pins: &[u8]) -> Result<Self, InitError> {
        let gpio = Gpio::new().map_err(|e| {
            error!("GPIO chip unavailable: {e}");
            InitError::ChipUnavailable
        })?;

        let mut claimed = HashMap::new();
        for &number in pins {
            let pin = gpio
                .get(number)
                .map_err(|e| {
                    error!("failed to claim GPIO {number}: {e}");
                    InitError::PinClaimFailed(number)
                })?
                .into_io(Mode::Input);
            claimed.insert(number, pin);
        }

        info!("claimed {} GPIO pins", claimed.len());
        Ok(Self {
            pins: claimed,
            epoch: Instant::now(),
        })
    }

    fn pin_mut(&mut self, pin: u8) -> Option<&mut IoPin> {
        let found = self.pins.get_mut(&pin);
        debug_assert!(found.is_some(), "GPIO {pin} was never claimed");
        found
    }
}

impl GpioPort for RpiGpio {
    fn set_mode(&mut self, pin: u8, mode: PinMode) {
        if let Some(p) = self.pin_mut(pin) {
            p.set_mode(match mode {
                PinMode::Input => Mode::Input,
                PinMode::Output => Mode::Output,
            });
        }
    }

    fn write(&mut self, pin: u8, level: Level) {
        if let Some(p) = self.pin_mut(pin) {
            match level {
                Level::High => p.set_high(),
                Level::Low => p.set_low(),
            }
        }
    }

    fn read(&mut self, pin: u8) -> Level {
        match self.pin_mut(pin).map(|p| p.read()) {
            Some(rppal::gpio::Level::High) => Level::High,
            _ => Level::Low,
        }
    }

    fn now_micros(&mut self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn delay_us(&mut self, us: u64) {
        if us >= SPIN_THRESHOLD_US {
            std::thread::sleep(Duration::from_micros(us));
        } else {
            let until = self.epoch.elapsed() + Duration::from_micros(us);
            while self.epoch.elapsed() < until {
                std::hint::spin_loop();
            }
        }
    }
}

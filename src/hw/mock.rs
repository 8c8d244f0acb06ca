//! Scripted simulation backend.
//!
//! Implements [`GpioPort`] over a virtual microsecond clock. Delays
//! advance the clock instead of sleeping, and every poll of the echo
//! pin advances it by one tick, so the busy-wait loops in the sensor
//! terminate in simulated time.
//!
//! Echo behavior is a script: each falling edge of the trigger line
//! (the end of a ping) consumes the next [`EchoScript`] entry and
//! schedules the corresponding pulse. An exhausted script behaves as
//! silence, i.e. a timeout.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::config::RoverConfig;
use crate::ports::{GpioPort, Level, PinMode};

/// Clock advance per echo-pin poll (µs). Keeps edge timestamps within
/// a tick of the scripted pulse widths.
const POLL_TICK_US: u64 = 10;

/// Echo the sensor will "hear" for one ping.
#[derive(Debug, Clone, Copy)]
pub enum EchoScript {
    /// Echo rises `rise_after_us` after the ping and stays high for
    /// `width_us`.
    Pulse { rise_after_us: u64, width_us: u64 },
    /// No echo at all — the rising-edge wait times out.
    Silence,
}

impl EchoScript {
    /// A prompt echo with the given pulse width.
    pub fn echo(width_us: u64) -> Self {
        Self::Pulse {
            rise_after_us: 150,
            width_us,
        }
    }

    /// A prompt echo whose width corresponds to `cm` centimeters.
    pub fn echo_cm(cm: f32) -> Self {
        Self::echo((cm / 0.017_150) as u64)
    }

    /// No echo: the measurement times out.
    pub fn silence() -> Self {
        Self::Silence
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePulse {
    rise_at: u64,
    fall_at: u64,
}

/// In-memory [`GpioPort`] with a scripted echo line and a full record
/// of modes and writes for assertions.
pub struct MockGpio {
    trigger_pin: u8,
    echo_pin: u8,
    now_us: u64,
    modes: HashMap<u8, PinMode>,
    levels: HashMap<u8, Level>,
    script: VecDeque<EchoScript>,
    active: Option<ActivePulse>,
    /// Every `write` call in order, for sequence assertions.
    pub writes: Vec<(u8, Level)>,
}

impl MockGpio {
    pub fn new(config: &RoverConfig) -> Self {
        Self {
            trigger_pin: config.trigger_pin,
            echo_pin: config.echo_pin,
            now_us: 0,
            modes: HashMap::new(),
            levels: HashMap::new(),
            script: VecDeque::new(),
            active: None,
            writes: Vec::new(),
        }
    }

    /// Append entries to the echo script.
    pub fn push_script(&mut self, entries: impl IntoIterator<Item = EchoScript>) {
        self.script.extend(entries);
    }

    /// Scripted pings not yet consumed.
    pub fn script_remaining(&self) -> usize {
        self.script.len()
    }

    /// Last configured mode of a pin, if any.
    pub fn mode_of(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Writes observed on one pin, in order.
    pub fn writes_to(&self, pin: u8) -> Vec<Level> {
        self.writes
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, l)| *l)
            .collect()
    }

    fn echo_level(&self) -> Level {
        match self.active {
            Some(p) if self.now_us >= p.rise_at && self.now_us < p.fall_at => Level::High,
            _ => Level::Low,
        }
    }

    fn arm_next_pulse(&mut self) {
        self.active = match self.script.pop_front() {
            Some(EchoScript::Pulse {
                rise_after_us,
                width_us,
            }) => {
                let rise_at = self.now_us + rise_after_us;
                Some(ActivePulse {
                    rise_at,
                    fall_at: rise_at + width_us,
                })
            }
            Some(EchoScript::Silence) | None => None,
        };
    }
}

impl GpioPort for MockGpio {
    fn set_mode(&mut self, pin: u8, mode: PinMode) {
        self.modes.insert(pin, mode);
    }

    fn write(&mut self, pin: u8, level: Level) {
        let previous = self.levels.insert(pin, level).unwrap_or(Level::Low);
        self.writes.push((pin, level));

        // A falling edge on the trigger line ends the ping and starts
        // the (scripted) acoustic round trip.
        if pin == self.trigger_pin && previous == Level::High && level == Level::Low {
            self.arm_next_pulse();
        }
    }

    fn read(&mut self, pin: u8) -> Level {
        self.now_us += POLL_TICK_US;
        if pin == self.echo_pin {
            self.echo_level()
        } else {
            self.levels.get(&pin).copied().unwrap_or(Level::Low)
        }
    }

    fn now_micros(&mut self) -> u64 {
        self.now_us
    }

    fn delay_ms(&mut self, ms: u64) {
        self.now_us += ms * 1000;
    }

    fn delay_us(&mut self, us: u64) {
        self.now_us += us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_advance_the_clock() {
        let mut gpio = MockGpio::new(&RoverConfig::default());
        let t0 = gpio.now_micros();
        gpio.delay_ms(2);
        gpio.delay_us(50);
        assert_eq!(gpio.now_micros(), t0 + 2050);
    }

    #[test]
    fn trigger_falling_edge_consumes_the_script() {
        let config = RoverConfig::default();
        let mut gpio = MockGpio::new(&config);
        gpio.push_script([EchoScript::echo(500)]);

        gpio.write(config.trigger_pin, Level::High);
        assert_eq!(gpio.script_remaining(), 1);
        gpio.write(config.trigger_pin, Level::Low);
        assert_eq!(gpio.script_remaining(), 0);
    }

    #[test]
    fn scripted_pulse_rises_then_falls() {
        let config = RoverConfig::default();
        let mut gpio = MockGpio::new(&config);
        gpio.push_script([EchoScript::echo(400)]);

        gpio.write(config.trigger_pin, Level::High);
        gpio.write(config.trigger_pin, Level::Low);

        // Poll until the rise, then until the fall.
        while gpio.read(config.echo_pin) == Level::Low {}
        let rise = gpio.now_micros();
        while gpio.read(config.echo_pin) == Level::High {}
        let fall = gpio.now_micros();
        let width = fall - rise;
        assert!((390..=420).contains(&width), "width {width}");
    }

    #[test]
    fn exhausted_script_is_silence() {
        let config = RoverConfig::default();
        let mut gpio = MockGpio::new(&config);
        gpio.write(config.trigger_pin, Level::High);
        gpio.write(config.trigger_pin, Level::Low);
        for _ in 0..100 {
            assert_eq!(gpio.read(config.echo_pin), Level::Low);
        }
    }
}

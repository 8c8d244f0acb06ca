//! L298N dual H-bridge motor actuator.
//!
//! Four direction lines, two per motor: one high/one low selects the
//! direction, both low coasts that motor. No PWM — speed is binary.
//!
//! This is a dumb actuator: it translates a discrete steering command
//! into a fixed four-line truth table and keeps no decision logic. All
//! sequencing (when to stop, how long to reverse) lives in the drive
//! controller.

use log::debug;

use crate::config::RoverConfig;
use crate::ports::{GpioPort, Level, PinMode};

/// Side the rover pivots toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// The opposite bias.
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Differential-drive actuator over four H-bridge input lines.
pub struct MotorActuator {
    in1: u8,
    in2: u8,
    in3: u8,
    in4: u8,
}

impl MotorActuator {
    pub fn new(config: &RoverConfig) -> Self {
        Self {
            in1: config.motor_in1_pin,
            in2: config.motor_in2_pin,
            in3: config.motor_in3_pin,
            in4: config.motor_in4_pin,
        }
    }

    /// Configure all four lines as outputs, coasting.
    pub fn init<G: GpioPort>(&self, gpio: &mut G) {
        for pin in [self.in1, self.in2, self.in3, self.in4] {
            gpio.set_mode(pin, PinMode::Output);
            gpio.write(pin, Level::Low);
        }
    }

    pub fn forward<G: GpioPort>(&self, gpio: &mut G) {
        debug!("motor: forward");
        self.set_lines(gpio, Level::Low, Level::High, Level::High, Level::Low);
    }

    pub fn reverse<G: GpioPort>(&self, gpio: &mut G) {
        debug!("motor: reverse");
        self.set_lines(gpio, Level::High, Level::Low, Level::Low, Level::High);
    }

    pub fn turn_left<G: GpioPort>(&self, gpio: &mut G) {
        debug!("motor: turn left");
        self.set_lines(gpio, Level::High, Level::Low, Level::High, Level::Low);
    }

    pub fn turn_right<G: GpioPort>(&self, gpio: &mut G) {
        debug!("motor: turn right");
        self.set_lines(gpio, Level::Low, Level::High, Level::Low, Level::High);
    }

    /// Pivot toward `direction`.
    pub fn turn<G: GpioPort>(&self, gpio: &mut G, direction: TurnDirection) {
        match direction {
            TurnDirection::Left => self.turn_left(gpio),
            TurnDirection::Right => self.turn_right(gpio),
        }
    }

    /// Coast both motors (all lines low).
    pub fn stop<G: GpioPort>(&self, gpio: &mut G) {
        debug!("motor: stop");
        self.set_lines(gpio, Level::Low, Level::Low, Level::Low, Level::Low);
    }

    /// Release owned pins to input mode so the bridge inputs float
    /// instead of being driven into an undefined state.
    pub fn release<G: GpioPort>(&self, gpio: &mut G) {
        for pin in [self.in1, self.in2, self.in3, self.in4] {
            gpio.set_mode(pin, PinMode::Input);
        }
    }

    fn set_lines<G: GpioPort>(&self, gpio: &mut G, a: Level, b: Level, c: Level, d: Level) {
        gpio.write(self.in1, a);
        gpio.write(self.in2, b);
        gpio.write(self.in3, c);
        gpio.write(self.in4, d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::mock::MockGpio;

    fn setup() -> (MockGpio, MotorActuator, RoverConfig) {
        let config = RoverConfig::default();
        let gpio = MockGpio::new(&config);
        let motor = MotorActuator::new(&config);
        (gpio, motor, config)
    }

    fn lines(gpio: &mut MockGpio, c: &RoverConfig) -> [Level; 4] {
        [
            gpio.read(c.motor_in1_pin),
            gpio.read(c.motor_in2_pin),
            gpio.read(c.motor_in3_pin),
            gpio.read(c.motor_in4_pin),
        ]
    }

    #[test]
    fn truth_tables_match_the_bridge() {
        let (mut gpio, motor, c) = setup();
        motor.init(&mut gpio);

        use Level::{High, Low};
        motor.forward(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), [Low, High, High, Low]);
        motor.reverse(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), [High, Low, Low, High]);
        motor.turn_right(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), [Low, High, Low, High]);
        motor.turn_left(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), [High, Low, High, Low]);
        motor.stop(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), [Low, Low, Low, Low]);
    }

    #[test]
    fn turn_dispatches_on_direction() {
        let (mut gpio, motor, c) = setup();
        motor.init(&mut gpio);

        motor.turn(&mut gpio, TurnDirection::Right);
        let right = lines(&mut gpio, &c);
        motor.turn_right(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), right);

        motor.turn(&mut gpio, TurnDirection::Left);
        let left = lines(&mut gpio, &c);
        motor.turn_left(&mut gpio);
        assert_eq!(lines(&mut gpio, &c), left);
        assert_ne!(left, right);
    }

    #[test]
    fn release_floats_all_four_lines() {
        let (mut gpio, motor, c) = setup();
        motor.init(&mut gpio);
        motor.forward(&mut gpio);
        motor.release(&mut gpio);
        for pin in [c.motor_in1_pin, c.motor_in2_pin, c.motor_in3_pin, c.motor_in4_pin] {
            assert_eq!(gpio.mode_of(pin), Some(PinMode::Input));
        }
    }

    #[test]
    fn flipped_alternates() {
        assert_eq!(TurnDirection::Right.flipped(), TurnDirection::Left);
        assert_eq!(TurnDirection::Left.flipped(), TurnDirection::Right);
        assert_eq!(TurnDirection::Left.flipped().flipped(), TurnDirection::Left);
    }
}

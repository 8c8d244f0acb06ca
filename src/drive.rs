//! Obstacle-avoidance drive controller.
//!
//! A two-state machine over median-filtered distance samples:
//!
//! ```text
//! ┌───────────────┐  reading < 20 cm, or history plateau   ┌─────────────┐
//! │ MovingForward │ ──────────────────────────────────────▶│   Turning   │
//! │               │ ◀──────────────────────────────────────│ (bias L/R)  │
//! └───────────────┘  reading ≥ 30 cm and no forced turn    └─────────────┘
//! ```
//!
//! Every cycle stores one filtered reading in a five-slot ring. The
//! *stuck predicate* compares all five circularly-adjacent pairs
//! against a 1 cm epsilon: a sustained plateau means the rover is
//! wedged at some angle, reporting a near-constant above-threshold
//! distance that the close-obstacle test alone would never catch. The
//! check is rotation-invariant, so it fires regardless of where in the
//! ring the plateau starts.
//!
//! The loop runs on one thread; sensing, decisions, and actuation never
//! overlap. Cancellation is cooperative — the flag is checked only at
//! the top of each cycle, so an in-flight maneuver (including its
//! blocking delays) always completes first.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::config::RoverConfig;
use crate::events::DriveEvent;
use crate::motor::{MotorActuator, TurnDirection};
use crate::ports::{EventSink, GpioPort};
use crate::sensor::DistanceSensor;

/// History window length. Three was tried on the bench and produced
/// too many false stuck positives; five is stable.
pub const HISTORY_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Distance history ring
// ---------------------------------------------------------------------------

/// Fixed five-slot ring of the most recent filtered readings. The
/// cursor always wraps into `[0, HISTORY_LEN)` and the oldest entry is
/// overwritten on each cycle.
#[derive(Debug, Clone)]
pub struct DistanceHistory {
    slots: [f32; HISTORY_LEN],
    cursor: usize,
}

impl DistanceHistory {
    pub fn new() -> Self {
        Self {
            slots: [0.0; HISTORY_LEN],
            cursor: 0,
        }
    }

    /// Overwrite the slot under the cursor. The cursor does not move —
    /// the cycle advances it after the decision step.
    pub fn store(&mut self, cm: f32) {
        self.slots[self.cursor] = cm;
    }

    /// Advance the cursor, wrapping modulo the window length.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % HISTORY_LEN;
    }

    /// True when every circularly-adjacent pair of samples differs by
    /// less than `epsilon_cm` — including the wrap pair.
    pub fn is_plateau(&self, epsilon_cm: f32) -> bool {
        (0..HISTORY_LEN).all(|i| {
            let next = (i + 1) % HISTORY_LEN;
            (self.slots[i] - self.slots[next]).abs() < epsilon_cm
        })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn slots(&self) -> &[f32; HISTORY_LEN] {
        &self.slots
    }
}

// ---------------------------------------------------------------------------
// Drive state
// ---------------------------------------------------------------------------

/// The machine is in exactly one of these at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    MovingForward,
    Turning,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns all mutable drive state and runs the avoidance loop. Hardware
/// comes in through [`GpioPort`]; structured events go out through
/// [`EventSink`]. No globals anywhere.
pub struct DriveController {
    config: RoverConfig,
    sensor: DistanceSensor,
    motor: MotorActuator,
    state: DriveState,
    turn_direction: TurnDirection,
    force_turn: bool,
    history: DistanceHistory,
}

impl DriveController {
    pub fn new(config: RoverConfig) -> Self {
        let sensor = DistanceSensor::new(&config);
        let motor = MotorActuator::new(&config);
        Self {
            config,
            sensor,
            motor,
            state: DriveState::MovingForward,
            turn_direction: TurnDirection::Right,
            force_turn: false,
            history: DistanceHistory::new(),
        }
    }

    /// Configure every owned pin. Call once before [`run`](Self::run).
    pub fn init<G: GpioPort>(&self, gpio: &mut G) {
        self.sensor.init(gpio);
        self.motor.init(gpio);
    }

    /// Fill the whole history window with live samples so the stuck
    /// predicate never evaluates zero-initialized slots.
    pub fn prime<G: GpioPort>(&mut self, gpio: &mut G) {
        for _ in 0..HISTORY_LEN {
            let cm = self.sensor.sample(gpio);
            self.history.store(cm);
            self.history.advance();
        }
    }

    /// Drive until the running flag is cleared, then stop the motors
    /// and release every owned pin.
    ///
    /// The flag is observed only here, at the cycle boundary: a cycle
    /// already in flight — blocking delays included — runs to
    /// completion, so cancellation latency is bounded by one worst-case
    /// maneuver.
    pub fn run<G: GpioPort, S: EventSink>(
        &mut self,
        gpio: &mut G,
        sink: &mut S,
        running: &AtomicBool,
    ) {
        self.motor.forward(gpio);
        self.prime(gpio);
        sink.emit(&DriveEvent::Started);

        while running.load(Ordering::SeqCst) {
            self.cycle(gpio, sink);
        }

        info!("cancellation observed, shutting down");
        self.motor.stop(gpio);
        self.sensor.release(gpio);
        self.motor.release(gpio);
        sink.emit(&DriveEvent::ShutDown);
    }

    /// One control cycle: sample, decide, actuate, advance the ring.
    pub fn cycle<G: GpioPort, S: EventSink>(&mut self, gpio: &mut G, sink: &mut S) {
        let reading = self.sensor.sample(gpio);
        self.history.store(reading);

        match self.state {
            DriveState::MovingForward => {
                if reading < self.config.obstacle_threshold_cm {
                    // An out-of-range sentinel lands here too: treat it
                    // as a close obstacle and fail safe.
                    sink.emit(&DriveEvent::ObstacleDetected { distance_cm: reading });
                    self.avoid_obstacle(gpio);
                    self.transition(DriveState::Turning, sink);
                } else if self.history.is_plateau(self.config.stuck_epsilon_cm) {
                    sink.emit(&DriveEvent::StuckDetected);
                    self.back_off_stuck(gpio);
                    self.force_turn = true;
                    self.transition(DriveState::Turning, sink);
                }
            }
            DriveState::Turning => {
                if reading < self.config.turn_continue_threshold_cm || self.force_turn {
                    self.continue_turn(gpio);
                    self.force_turn = false;
                } else {
                    // Clear ahead: resume and flip the bias so the next
                    // obstacle is taken from the other side, instead of
                    // turning repeatedly into the same corner.
                    self.motor.forward(gpio);
                    self.transition(DriveState::MovingForward, sink);
                    self.turn_direction = self.turn_direction.flipped();
                    sink.emit(&DriveEvent::TurnBiasFlipped { now: self.turn_direction });
                }
            }
        }

        self.history.advance();
    }

    /// Stop, back away, pivot, stop.
    fn avoid_obstacle<G: GpioPort>(&self, gpio: &mut G) {
        self.motor.stop(gpio);
        gpio.delay_ms(self.config.stop_delay_ms);
        self.motor.reverse(gpio);
        gpio.delay_ms(self.config.reverse_delay_ms);
        self.motor.turn(gpio, self.turn_direction);
        gpio.delay_ms(self.config.turn_delay_ms);
        self.motor.stop(gpio);
    }

    /// Stuck recovery: stop, then a long reverse. The pivot itself is
    /// forced on the next cycle via `force_turn`, while the motors are
    /// still reversing.
    fn back_off_stuck<G: GpioPort>(&self, gpio: &mut G) {
        self.motor.stop(gpio);
        gpio.delay_ms(self.config.stop_delay_ms);
        self.motor.reverse(gpio);
        gpio.delay_ms(self.config.reverse_stuck_delay_ms);
    }

    /// One more pivot step in the current direction.
    fn continue_turn<G: GpioPort>(&self, gpio: &mut G) {
        gpio.delay_ms(self.config.stop_delay_ms);
        self.motor.turn(gpio, self.turn_direction);
        gpio.delay_ms(self.config.turn_delay_ms);
        self.motor.stop(gpio);
    }

    fn transition<S: EventSink>(&mut self, to: DriveState, sink: &mut S) {
        let from = self.state;
        self.state = to;
        if from != to {
            sink.emit(&DriveEvent::StateChanged { from, to });
        }
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn_direction
    }

    pub fn force_turn(&self) -> bool {
        self.force_turn
    }

    pub fn history(&self) -> &DistanceHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_cycles_through_all_slots() {
        let mut h = DistanceHistory::new();
        let mut seen = Vec::new();
        for i in 0..7 {
            seen.push(h.cursor());
            h.store(i as f32);
            h.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn five_writes_overwrite_every_seed() {
        let mut h = DistanceHistory::new();
        for v in [9.0, 9.5, 8.0, 7.5, 10.0] {
            h.store(v);
            h.advance();
        }
        assert_eq!(h.slots(), &[9.0, 9.5, 8.0, 7.5, 10.0]);
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn plateau_detects_sustained_flat_window() {
        let mut h = DistanceHistory::new();
        for v in [50.0, 50.5, 50.2, 50.1, 50.3] {
            h.store(v);
            h.advance();
        }
        assert!(h.is_plateau(1.0));
    }

    #[test]
    fn alternating_window_is_not_a_plateau() {
        let mut h = DistanceHistory::new();
        for v in [50.0, 10.0, 50.0, 10.0, 50.0] {
            h.store(v);
            h.advance();
        }
        assert!(!h.is_plateau(1.0));
    }

    #[test]
    fn plateau_boundary_includes_wrap_pair() {
        let mut h = DistanceHistory::new();
        for v in [10.0, 10.0, 10.0, 10.0, 10.99] {
            h.store(v);
            h.advance();
        }
        // |10.99 - 10| = 0.99 on both the adjacent and the wrap pair.
        assert!(h.is_plateau(1.0));

        let mut h = DistanceHistory::new();
        for v in [10.0, 10.0, 10.0, 10.0, 11.0] {
            h.store(v);
            h.advance();
        }
        assert!(!h.is_plateau(1.0));
    }

    #[test]
    fn fresh_controller_starts_forward_biased_right() {
        let c = DriveController::new(RoverConfig::default());
        assert_eq!(c.state(), DriveState::MovingForward);
        assert_eq!(c.turn_direction(), TurnDirection::Right);
        assert!(!c.force_turn());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn plateau_is_rotation_invariant(
            window in proptest::array::uniform5(0.0f32..400.0),
            epsilon in 0.1f32..5.0,
            rot in 0usize..5,
        ) {
            let fill = |values: &[f32]| {
                let mut h = DistanceHistory::new();
                for &v in values {
                    h.store(v);
                    h.advance();
                }
                h
            };

            let rotated: Vec<f32> = (0..5).map(|i| window[(i + rot) % 5]).collect();
            prop_assert_eq!(
                fill(&window).is_plateau(epsilon),
                fill(&rotated).is_plateau(epsilon)
            );
        }

        #[test]
        fn plateau_never_fires_on_a_big_step(
            base in 0.0f32..200.0,
            step in 10.0f32..100.0,
            at in 0usize..5,
        ) {
            let mut h = DistanceHistory::new();
            for i in 0..5 {
                h.store(if i == at { base + step } else { base });
                h.advance();
            }
            prop_assert!(!h.is_plateau(1.0));
        }
    }
}

//! Outbound drive events.
//!
//! The [`DriveController`](crate::drive::DriveController) emits these
//! through the [`EventSink`](crate::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — today that is the
//! serial log.

use log::info;

use crate::drive::DriveState;
use crate::motor::TurnDirection;
use crate::ports::EventSink;

/// Structured events emitted by the drive loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveEvent {
    /// The control loop has started (history primed, motors forward).
    Started,

    /// A filtered reading fell below the obstacle threshold while
    /// moving forward. Carries the offending distance; `0.0` means the
    /// reading was out of range and is being treated as a close
    /// obstacle.
    ObstacleDetected { distance_cm: f32 },

    /// The history window flattened out — the rover is wedged and is
    /// backing off.
    StuckDetected,

    /// The state machine transitioned.
    StateChanged { from: DriveState, to: DriveState },

    /// The turn bias flipped after a completed avoidance maneuver.
    TurnBiasFlipped { now: TurnDirection },

    /// Cancellation observed; motors stopped and pins released.
    ShutDown,
}

/// Adapter that logs every [`DriveEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DriveEvent) {
        match event {
            DriveEvent::Started => {
                info!("START | history primed, driving forward");
            }
            DriveEvent::ObstacleDetected { distance_cm } => {
                info!("OBSTACLE | {:.2} cm ahead", distance_cm);
            }
            DriveEvent::StuckDetected => {
                info!("STUCK | distance plateau detected, backing off");
            }
            DriveEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            DriveEvent::TurnBiasFlipped { now } => {
                info!("TURN | next avoidance turns {:?}", now);
            }
            DriveEvent::ShutDown => {
                info!("SHUTDOWN | motors stopped, pins released");
            }
        }
    }
}

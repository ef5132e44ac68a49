// Servo sweep for the two angle-positioned actuators
//
// Moves one degree per step with a blocking delay in between, so the arm never
// jumps across its whole travel at once.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PIN_ROLES, Pin};
use crate::hal::{Clock, ServoOutput};

/// Which of the two servo outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServoId {
    A,
    B,
}

impl ServoId {
    pub fn pin(self) -> Pin {
        match self {
            ServoId::A => PIN_ROLES.servo_a,
            ServoId::B => PIN_ROLES.servo_b,
        }
    }
}

/// The pair of servo outputs
#[derive(Debug, Clone)]
pub struct Servos<S> {
    pub a: S,
    pub b: S,
}

impl<S: ServoOutput> Servos<S> {
    pub fn get_mut(&mut self, id: ServoId) -> &mut S {
        match id {
            ServoId::A => &mut self.a,
            ServoId::B => &mut self.b,
        }
    }
}

/// Step `servo` from its current angle to `target`, waiting `step_delay` after
/// each write. Returns the number of writes.
pub fn sweep(
    servo: &mut impl ServoOutput,
    clock: &impl Clock,
    target: u8,
    step_delay: Duration,
) -> usize {
    let start = servo.angle();
    let mut angle = start;
    let mut writes = 0;

    while angle != target {
        angle = if target > angle { angle + 1 } else { angle - 1 };
        servo.write_angle(angle);
        clock.delay(step_delay);
        writes += 1;
    }

    debug!("Servo swept {} -> {} in {} steps", start, target, writes);
    writes
}

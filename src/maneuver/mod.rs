// Maneuver sequencing
//
// Provides:
// - The maneuver state set published while a run is in progress
// - The blocking sequencer that composes sensors, PD laws and the motor driver

mod sequencer;

use serde::{Deserialize, Serialize};

pub use sequencer::{CrossSummary, ManeuverSequencer, SequencerConfig};

/// Phase the vehicle is in. Every blocking wait belongs to exactly one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverState {
    Idle,
    CalibrateSpin,
    StraightRamp,
    CrossDetectWait,
    CrossScan,
    CubePause,
    EncoderRun,
    Arc,
    TurnSpin,
    TurnAlign,
    TurnSettle,
    Stopped,
}

/// Spin direction for turns and calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Left wheel forward, right wheel back
    Right,
    Left,
}

impl Rotation {
    pub fn sign(self) -> i32 {
        match self {
            Rotation::Right => 1,
            Rotation::Left => -1,
        }
    }

    /// Symmetric spin command at the given magnitude
    pub fn spin(self, speed: i32) -> (i32, i32) {
        (speed * self.sign(), -speed * self.sign())
    }
}

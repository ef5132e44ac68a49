// Error types for the control core and the runtime around it

use std::time::Duration;

use crate::maneuver::ManeuverState;
use crate::odometry::Side;

/// Failures the control core can report. Both variants are opt-in: without a
/// wait deadline or strict calibration the core stays fail-silent.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Wait in {state:?} not satisfied after {waited:?}")]
    WaitTimeout { state: ManeuverState, waited: Duration },

    #[error("Calibration of {channel:?} line sensor is flat at {value}")]
    DegenerateCalibration { channel: Side, value: i32 },
}

pub type Result<T> = std::result::Result<T, ControlError>;

/// Mission file problems
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid mission: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mission has no steps")]
    Empty,
}

/// Top-level failures of the binary
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Mission(#[from] MissionError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Mission still running after {0:?}, giving up")]
    TimeLimit(Duration),

    #[error("Control thread failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// Per-run control state owned by the sequencer
//
// Holds what used to be loose globals: the odometry handle, the PD memory and the
// cube flag. Phases start from a clean slate through `reset_phase`.

use crate::control::pd::PdState;
use crate::odometry::{Odometry, Side};

#[derive(Debug, Clone)]
pub struct ControlContext {
    pub odometry: Odometry,
    pub pd: PdState,
    pub cube_detected: bool,
}

impl ControlContext {
    pub fn new(odometry: Odometry) -> Self {
        Self {
            odometry,
            pd: PdState::default(),
            cube_detected: false,
        }
    }

    /// Zero both displacement counters and the previous error
    pub fn reset_phase(&mut self) {
        self.odometry.reset();
        self.pd.reset();
    }

    pub fn displacement(&self, side: Side) -> i64 {
        self.odometry.read(side)
    }

    /// Mean absolute displacement of both wheels, in whole units
    pub fn mean_distance(&self) -> i64 {
        (self.odometry.left().abs() + self.odometry.right().abs()) / 2
    }
}

// Line-sensor calibration bookkeeping
//
// The sequencer spins the vehicle over the line and feeds every raw sample here;
// the calibrator keeps the running extrema and reports what it saw.

use tracing::{info, warn};

use crate::odometry::Side;
use crate::sensors::{RangeTracker, SensorCalibration};

/// Outcome of one calibration spin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationReport {
    pub calibration: SensorCalibration,
    pub samples: u32,
    /// Channels whose range came out flat
    pub degenerate: Vec<Side>,
}

impl CalibrationReport {
    pub fn is_degenerate(&self) -> bool {
        !self.degenerate.is_empty()
    }
}

/// Running min/max for both line-sensor channels
#[derive(Debug, Default)]
pub struct Calibrator {
    right: RangeTracker,
    left: RangeTracker,
    samples: u32,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, right: u16, left: u16) {
        self.right.observe(right);
        self.left.observe(left);
        self.samples = self.samples.saturating_add(1);
    }

    pub fn finish(self) -> CalibrationReport {
        let calibration = SensorCalibration {
            right: self.right.finish(),
            left: self.left.finish(),
        };

        let mut degenerate = Vec::new();
        for (side, range) in [(Side::Right, calibration.right), (Side::Left, calibration.left)] {
            if range.is_degenerate() {
                warn!(
                    "{:?} line sensor range is flat ({}..{}), readings will stay at the far end",
                    side, range.min, range.max
                );
                degenerate.push(side);
            }
        }

        info!(
            "Calibrated over {} samples: right {}..{}, left {}..{}",
            self.samples,
            calibration.right.min,
            calibration.right.max,
            calibration.left.min,
            calibration.left.max
        );

        CalibrationReport {
            calibration,
            samples: self.samples,
            degenerate,
        }
    }
}

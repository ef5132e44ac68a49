// Line-position and auxiliary range sensors
//
// Line sensors read high over the dark line. After calibration a reading is mapped
// linearly onto [300, 100]: smaller means closer to the line center.

use crate::config::{ADC_MAX, AUX_C, AUX_EXP, AUX_K, LINE_FAR, LINE_NEAR, PIN_ROLES, PinRoles};
use crate::hal::AnalogInputs;

/// Observed raw extrema of one line-sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub min: i32,
    pub max: i32,
}

impl ChannelRange {
    pub const FULL_SCALE: ChannelRange = ChannelRange {
        min: 0,
        max: ADC_MAX as i32,
    };

    /// A flat range cannot be normalized
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Map a raw reading onto [LINE_FAR, LINE_NEAR] with integer truncation.
    /// Readings outside the range extrapolate. A degenerate range yields LINE_FAR.
    pub fn normalize(&self, raw: i32) -> i32 {
        if self.is_degenerate() {
            return LINE_FAR;
        }
        (raw - self.min) * (LINE_NEAR - LINE_FAR) / (self.max - self.min) + LINE_FAR
    }
}

/// Running min/max while sampling a channel
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeTracker {
    range: Option<ChannelRange>,
}

impl RangeTracker {
    pub fn observe(&mut self, raw: u16) {
        let raw = i32::from(raw);
        self.range = Some(match self.range {
            None => ChannelRange { min: raw, max: raw },
            Some(r) => ChannelRange {
                min: r.min.min(raw),
                max: r.max.max(raw),
            },
        });
    }

    /// Range seen so far; a channel never sampled stays at full scale
    pub fn finish(&self) -> ChannelRange {
        self.range.unwrap_or(ChannelRange::FULL_SCALE)
    }
}

/// Reference ranges for both line-sensor channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCalibration {
    pub right: ChannelRange,
    pub left: ChannelRange,
}

impl SensorCalibration {
    pub const UNCALIBRATED: SensorCalibration = SensorCalibration {
        right: ChannelRange::FULL_SCALE,
        left: ChannelRange::FULL_SCALE,
    };
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::UNCALIBRATED
    }
}

/// Normalized line-sensor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReading {
    pub right: i32,
    pub left: i32,
}

impl LineReading {
    /// Line-following error: right minus left
    pub fn error(&self) -> i32 {
        self.right - self.left
    }

    /// Both sensors over a marker
    pub fn both_below(&self, threshold: i32) -> bool {
        self.right < threshold && self.left < threshold
    }
}

/// Convert a raw auxiliary reading into a range estimate.
///
/// Zero means "no target" and maps to 0. Otherwise the inverse power law
/// `32 * (raw * 5 / 1024)^-1.1` applies, so larger readings mean closer targets.
pub fn aux_range(raw: u16) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    AUX_K * (f32::from(raw) * AUX_C).powf(AUX_EXP)
}

/// Sensor access plus the calibration in force
#[derive(Debug, Clone)]
pub struct SensorModel {
    pins: PinRoles,
    calibration: SensorCalibration,
}

impl SensorModel {
    pub fn new(calibration: SensorCalibration) -> Self {
        Self::with_pins(PIN_ROLES, calibration)
    }

    pub fn with_pins(pins: PinRoles, calibration: SensorCalibration) -> Self {
        Self { pins, calibration }
    }

    pub fn calibration(&self) -> SensorCalibration {
        self.calibration
    }

    /// Install a freshly produced calibration
    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.calibration = calibration;
    }

    pub fn read_right(&self, inputs: &mut impl AnalogInputs) -> i32 {
        let raw = inputs.read(self.pins.right_line);
        self.calibration.right.normalize(i32::from(raw))
    }

    pub fn read_left(&self, inputs: &mut impl AnalogInputs) -> i32 {
        let raw = inputs.read(self.pins.left_line);
        self.calibration.left.normalize(i32::from(raw))
    }

    pub fn line_error(&self, inputs: &mut impl AnalogInputs) -> LineReading {
        LineReading {
            right: self.read_right(inputs),
            left: self.read_left(inputs),
        }
    }

    /// Raw (right, left) line-sensor readings, used while calibrating
    pub fn read_raw(&self, inputs: &mut impl AnalogInputs) -> (u16, u16) {
        (
            inputs.read(self.pins.right_line),
            inputs.read(self.pins.left_line),
        )
    }

    pub fn aux_range(&self, inputs: &mut impl AnalogInputs) -> f32 {
        aux_range(inputs.read(self.pins.aux_range))
    }
}

impl Default for SensorModel {
    fn default() -> Self {
        Self::new(SensorCalibration::UNCALIBRATED)
    }
}

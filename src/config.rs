// Pin roles, tuned control constants, timing windows
//
// The numeric constants below were tuned on the track and are kept as literals.
// Units: "deg" is one encoder edge, speeds are signed duty values before clamping.
use std::time::Duration;

/// Physical channel identifier (board pin number)
pub type Pin = u8;

// Motor output
pub const MAX_DUTY: i32 = 255;

// Active brake: restoring gain and wall-clock window
pub const BRAKE_GAIN: i32 = 10;
pub const BRAKE_WINDOW: Duration = Duration::from_millis(200);

// Line sensor normalization range (raw min -> 300, raw max -> 100)
pub const LINE_FAR: i32 = 300;
pub const LINE_NEAR: i32 = 100;

// Full ADC scale used before calibration
pub const ADC_MAX: u16 = 1023;

// Auxiliary range sensor: k * (raw * c)^exp
pub const AUX_K: f32 = 32.0;
pub const AUX_C: f32 = 5.0 / 1024.0;
pub const AUX_EXP: f32 = -1.1;

// PD controllers
pub const PD_KP: f32 = 0.15;
pub const PD_KD: i32 = 1;
pub const PD_REF_SPEED: i32 = 70;

// Calibration spin
pub const CALIBRATION_SPEED: i32 = 60;

// Line-cross run
pub const CROSS_THRESHOLD: i32 = 200;
pub const RAMP_MIN_SPEED: i32 = 60;
pub const RAMP_AIM_DEG: f32 = 600.0;
pub const SCAN_SPEED: i32 = 60;
pub const SCAN_DEG: i64 = 210;
pub const CUBE_PROXIMITY: f32 = 15.0;
pub const CUBE_MIN_SAMPLES: u32 = 2;
pub const CUBE_PAUSE: Duration = Duration::from_millis(500);

// Fixed-angle turn: (speed, distance) per phase
pub const TURN_SPIN_SPEED: i32 = 140;
pub const TURN_SPIN_DEG: i64 = 200;
pub const TURN_ALIGN_SPEED: i32 = 80;
pub const TURN_ALIGN_THRESHOLD: i32 = 200;
pub const TURN_SETTLE_SPEED: i32 = 60;
pub const TURN_SETTLE_DEG: i64 = 35;

/// Direction-sense level that makes an encoder count upward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderPolarity {
    /// Count +1 when the sense input is high at the edge
    UpWhenHigh,
    /// Count -1 when the sense input is high at the edge
    DownWhenHigh,
}

impl EncoderPolarity {
    pub fn step(self, sense_high: bool) -> i64 {
        match (self, sense_high) {
            (EncoderPolarity::UpWhenHigh, true) | (EncoderPolarity::DownWhenHigh, false) => 1,
            _ => -1,
        }
    }

    /// Sense level an encoder shows while its wheel turns in the given direction
    pub fn sense_for(self, forward: bool) -> bool {
        match self {
            EncoderPolarity::UpWhenHigh => forward,
            EncoderPolarity::DownWhenHigh => !forward,
        }
    }
}

/// Direction and PWM channels for one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorPins {
    pub direction: Pin,
    pub pwm: Pin,
}

/// Fixed mapping of logical roles to board channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRoles {
    pub left_sense: Pin,
    pub right_sense: Pin,
    pub left_polarity: EncoderPolarity,
    pub right_polarity: EncoderPolarity,
    pub right_line: Pin,
    pub left_line: Pin,
    pub aux_range: Pin,
    pub left_motor: MotorPins,
    pub right_motor: MotorPins,
    pub servo_a: Pin,
    pub servo_b: Pin,
}

pub const PIN_ROLES: PinRoles = PinRoles {
    left_sense: 8,
    right_sense: 9,
    // Wheels are mirror-mounted
    left_polarity: EncoderPolarity::DownWhenHigh,
    right_polarity: EncoderPolarity::UpWhenHigh,
    right_line: 14,
    left_line: 15,
    aux_range: 17,
    left_motor: MotorPins { direction: 4, pwm: 6 },
    right_motor: MotorPins { direction: 7, pwm: 5 },
    servo_a: 10,
    servo_b: 13,
};

// Simulator plant step and overall mission limit used by the binary
pub const PLANT_STEP: Duration = Duration::from_millis(1);
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);

// Differential motor driver
//
// Turns a signed (left, right) speed pair into direction bits and PWM duty for the
// two motor channels, and provides the odometry-assisted active brake.

use tracing::{debug, trace};

use crate::config::{BRAKE_GAIN, BRAKE_WINDOW, MAX_DUTY, MotorPins, PIN_ROLES};
use crate::hal::{Clock, MotorOutputs};
use crate::odometry::Odometry;

/// Direction bit and duty for one motor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCommand {
    /// High selects the not-forward direction (speed <= 0)
    pub reverse: bool,
    pub duty: u8,
}

impl ChannelCommand {
    pub fn from_speed(speed: i32) -> Self {
        Self {
            reverse: speed <= 0,
            duty: speed.unsigned_abs().min(MAX_DUTY as u32) as u8,
        }
    }
}

/// Clamp a wide speed value into the drive range
pub fn saturate(speed: i64) -> i32 {
    speed.clamp(-i64::from(MAX_DUTY), i64::from(MAX_DUTY)) as i32
}

/// Driver for the left/right motor pair
#[derive(Debug, Clone, Copy)]
pub struct MotorDriver {
    left: MotorPins,
    right: MotorPins,
}

impl MotorDriver {
    pub fn new() -> Self {
        Self::with_pins(PIN_ROLES.left_motor, PIN_ROLES.right_motor)
    }

    pub fn with_pins(left: MotorPins, right: MotorPins) -> Self {
        Self { left, right }
    }

    /// Command both motors. Magnitudes above the duty range are clamped.
    pub fn drive(&self, out: &mut impl MotorOutputs, left: i32, right: i32) {
        let l = ChannelCommand::from_speed(left);
        let r = ChannelCommand::from_speed(right);
        trace!("drive: left={} right={}", left, right);

        out.set_direction(self.left.direction, l.reverse);
        out.set_direction(self.right.direction, r.reverse);
        out.set_duty(self.left.pwm, l.duty);
        out.set_duty(self.right.pwm, r.duty);
    }

    /// Cut power to both motors
    pub fn stop(&self, out: &mut impl MotorOutputs) {
        self.drive(out, 0, 0);
    }

    /// Closed-loop stop.
    ///
    /// Zeroes odometry, then for the brake window keeps commanding a restoring
    /// speed proportional to each wheel's drift, then cuts power. Blocks for the
    /// whole window whatever the starting speed.
    pub fn active_brake<B>(&self, board: &mut B, odometry: &Odometry)
    where
        B: MotorOutputs + Clock,
    {
        odometry.reset();
        let deadline = board.elapsed() + BRAKE_WINDOW;
        let mut ticks = 0u32;

        while board.elapsed() < deadline {
            let left = saturate(-i64::from(BRAKE_GAIN) * odometry.left());
            let right = saturate(-i64::from(BRAKE_GAIN) * odometry.right());
            self.drive(board, left, right);
            ticks += 1;
        }

        debug!(
            "Active brake done after {} ticks, drift left={} right={}",
            ticks,
            odometry.left(),
            odometry.right()
        );
        self.stop(board);
    }
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

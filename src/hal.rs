// Hardware seam consumed by the control core
//
// Implemented by the simulator plant and by the test fakes. Every method is
// infallible: the board offers no failure channel, faults show up as motion.

use std::time::{Duration, Instant};

use crate::config::Pin;

/// Analog input channels (10-bit scale, 0..=1023)
pub trait AnalogInputs {
    fn read(&mut self, pin: Pin) -> u16;
}

/// Direction and PWM duty outputs of the motor channels
pub trait MotorOutputs {
    fn set_direction(&mut self, pin: Pin, high: bool);
    fn set_duty(&mut self, pin: Pin, duty: u8);
}

/// Monotonic wall clock plus a blocking delay
pub trait Clock {
    fn elapsed(&self) -> Duration;
    fn delay(&self, duration: Duration);
}

/// Angle-positioned actuator (servo)
pub trait ServoOutput {
    fn angle(&self) -> u8;
    fn write_angle(&mut self, degrees: u8);
}

/// Everything the maneuver sequencer needs from the board
pub trait Board: AnalogInputs + MotorOutputs + Clock {}

impl<T: AnalogInputs + MotorOutputs + Clock> Board for T {}

/// Clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn delay(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

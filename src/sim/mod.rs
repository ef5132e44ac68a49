// Simulated board: the control core's hardware seam over the plant model

pub mod plant;
pub mod track;

pub use plant::Plant;
pub use track::{Pose, Track};

use std::time::Duration;

use crate::actuator::Servos;
use crate::config::Pin;
use crate::hal::{AnalogInputs, Clock, MotorOutputs, ServoOutput, SystemClock};

/// Board handle over a shared plant; reads sample the plant at its current pose
#[derive(Debug, Clone)]
pub struct SimBoard {
    plant: Plant,
    clock: SystemClock,
}

impl SimBoard {
    pub fn plant(&self) -> &Plant {
        &self.plant
    }
}

impl AnalogInputs for SimBoard {
    fn read(&mut self, pin: Pin) -> u16 {
        let pins = *self.plant.pins();
        let state = self.plant.lock();
        if let Some(&value) = state.overrides.get(&pin) {
            return value;
        }
        let track = self.plant.track();
        if pin == pins.right_line {
            track.line_sensors(&state.pose).0
        } else if pin == pins.left_line {
            track.line_sensors(&state.pose).1
        } else if pin == pins.aux_range {
            track.aux_raw(&state.pose)
        } else {
            0
        }
    }
}

impl MotorOutputs for SimBoard {
    fn set_direction(&mut self, pin: Pin, high: bool) {
        self.plant.lock().directions.insert(pin, high);
    }

    fn set_duty(&mut self, pin: Pin, duty: u8) {
        self.plant.lock().duties.insert(pin, duty);
    }
}

impl Clock for SimBoard {
    fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    fn delay(&self, duration: Duration) {
        self.clock.delay(duration);
    }
}

/// One servo output of the plant
#[derive(Debug, Clone)]
pub struct SimServo {
    plant: Plant,
    pin: Pin,
}

impl ServoOutput for SimServo {
    fn angle(&self) -> u8 {
        self.plant.lock().servos.get(&self.pin).copied().unwrap_or(0)
    }

    fn write_angle(&mut self, degrees: u8) {
        self.plant.lock().servos.insert(self.pin, degrees);
    }
}

impl Plant {
    pub fn board(&self) -> SimBoard {
        SimBoard {
            plant: self.clone(),
            clock: SystemClock::new(),
        }
    }

    pub fn servos(&self) -> Servos<SimServo> {
        let servo = |pin| SimServo {
            plant: self.clone(),
            pin,
        };
        Servos {
            a: servo(self.pins().servo_a),
            b: servo(self.pins().servo_b),
        }
    }
}

// Deterministic stand-ins for the board, shared by the unit tests
//
// `FakeBoard` advances a manual clock by one millisecond on every `elapsed()` call
// and, on the same step, moves each powered wheel by one encoder edge in its
// commanded direction. Every control wait polls the clock, so motion and time
// progress in lock-step with the control loop.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{PIN_ROLES, Pin, PinRoles};
use crate::hal::{AnalogInputs, Clock, MotorOutputs, ServoOutput};
use crate::odometry::{Odometry, Side};

/// Analog channels with values scriptable from another thread
#[derive(Debug, Clone, Default)]
pub struct ScriptedInputs {
    channels: Arc<Mutex<HashMap<Pin, VecDeque<u16>>>>,
}

impl ScriptedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constant reading from now on
    pub fn set(&self, pin: Pin, value: u16) {
        self.script(pin, [value]);
    }

    /// One value per read; the last value repeats once the script runs out
    pub fn script(&self, pin: Pin, values: impl IntoIterator<Item = u16>) {
        let values: VecDeque<u16> = values.into_iter().collect();
        self.channels.lock().unwrap().insert(pin, values);
    }
}

impl AnalogInputs for ScriptedInputs {
    fn read(&mut self, pin: Pin) -> u16 {
        let mut channels = self.channels.lock().unwrap();
        match channels.get_mut(&pin) {
            Some(values) if values.len() > 1 => values.pop_front().unwrap_or(0),
            Some(values) => values.front().copied().unwrap_or(0),
            None => 0,
        }
    }
}

/// Motor state captured at the end of each `drive` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveRecord {
    pub at: Duration,
    pub left_reverse: bool,
    pub right_reverse: bool,
    pub left_duty: u8,
    pub right_duty: u8,
    pub left_disp: i64,
    pub right_disp: i64,
}

impl DriveRecord {
    /// Signed speeds as they were commanded (zero duty reads back as 0)
    pub fn speeds(&self) -> (i32, i32) {
        let signed = |reverse: bool, duty: u8| {
            if reverse {
                -i32::from(duty)
            } else {
                i32::from(duty)
            }
        };
        (
            signed(self.left_reverse, self.left_duty),
            signed(self.right_reverse, self.right_duty),
        )
    }
}

/// Shared view of the drive commands and delays a `FakeBoard` has seen
#[derive(Debug, Clone, Default)]
pub struct BoardLog {
    drives: Arc<Mutex<Vec<DriveRecord>>>,
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl BoardLog {
    pub fn drives(&self) -> Vec<DriveRecord> {
        self.drives.lock().unwrap().clone()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct FakeBoard {
    pub inputs: ScriptedInputs,
    odometry: Odometry,
    pins: PinRoles,
    now: Cell<Duration>,
    directions: HashMap<Pin, bool>,
    duties: HashMap<Pin, u8>,
    log: BoardLog,
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            inputs: ScriptedInputs::new(),
            odometry: Odometry::new(),
            pins: PIN_ROLES,
            now: Cell::new(Duration::ZERO),
            directions: HashMap::new(),
            duties: HashMap::new(),
            log: BoardLog::default(),
        }
    }

    /// Odometry fed by this board's simulated wheels
    pub fn odometry(&self) -> Odometry {
        self.odometry.clone()
    }

    pub fn log(&self) -> BoardLog {
        self.log.clone()
    }

    pub fn commands(&self) -> Vec<DriveRecord> {
        self.log.drives()
    }

    pub fn direction(&self, pin: Pin) -> Option<bool> {
        self.directions.get(&pin).copied()
    }

    pub fn duty(&self, pin: Pin) -> Option<u8> {
        self.duties.get(&pin).copied()
    }

    fn step_wheel(&self, side: Side) {
        let (motor, polarity) = match side {
            Side::Left => (self.pins.left_motor, self.pins.left_polarity),
            Side::Right => (self.pins.right_motor, self.pins.right_polarity),
        };
        if self.duty(motor.pwm).unwrap_or(0) == 0 {
            return;
        }
        let forward = !self.direction(motor.direction).unwrap_or(true);
        self.odometry.tick(side, polarity.sense_for(forward));
    }
}

impl Default for FakeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogInputs for FakeBoard {
    fn read(&mut self, pin: Pin) -> u16 {
        self.inputs.read(pin)
    }
}

impl MotorOutputs for FakeBoard {
    fn set_direction(&mut self, pin: Pin, high: bool) {
        self.directions.insert(pin, high);
    }

    fn set_duty(&mut self, pin: Pin, duty: u8) {
        self.duties.insert(pin, duty);
        if pin == self.pins.right_motor.pwm {
            let record = DriveRecord {
                at: self.now.get(),
                left_reverse: self.direction(self.pins.left_motor.direction).unwrap_or(true),
                right_reverse: self.direction(self.pins.right_motor.direction).unwrap_or(true),
                left_duty: self.duty(self.pins.left_motor.pwm).unwrap_or(0),
                right_duty: duty,
                left_disp: self.odometry.left(),
                right_disp: self.odometry.right(),
            };
            self.log.drives.lock().unwrap().push(record);
        }
    }
}

impl Clock for FakeBoard {
    fn elapsed(&self) -> Duration {
        let now = self.now.get() + Duration::from_millis(1);
        self.now.set(now);
        self.step_wheel(Side::Left);
        self.step_wheel(Side::Right);
        now
    }

    fn delay(&self, duration: Duration) {
        self.log.delays.lock().unwrap().push(duration);
        self.now.set(self.now.get() + duration);
    }
}

/// Servo that remembers every angle written to it
#[derive(Debug, Clone)]
pub struct FakeServo {
    pub angle: u8,
    pub writes: Vec<u8>,
}

impl FakeServo {
    pub fn at(angle: u8) -> Self {
        Self {
            angle,
            writes: Vec::new(),
        }
    }
}

impl ServoOutput for FakeServo {
    fn angle(&self) -> u8 {
        self.angle
    }

    fn write_angle(&mut self, degrees: u8) {
        self.angle = degrees;
        self.writes.push(degrees);
    }
}

// Simulated drive plant: motors, wheels, encoders and pose
//
// Each step moves the wheel speeds toward the commanded duty with a first-order
// lag, converts travel into encoder edges on the shared odometry, and integrates
// the pose used by the sensor models.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::config::{PIN_ROLES, PLANT_STEP, Pin, PinRoles};
use crate::odometry::{Odometry, Side};
use crate::sim::track::{Pose, Track};

/// Wheel surface speed per unit of duty, in units per second
const UNITS_PER_DUTY: f32 = 8.0;
/// Motor response time constant
const MOTOR_LAG: Duration = Duration::from_millis(40);
/// Distance between the wheels
const WHEEL_BASE: f32 = 300.0;
/// Right motor runs slightly slow, so the steering has something to correct
const WHEEL_GAIN: [f32; 2] = [1.0, 0.98];

#[derive(Debug)]
pub struct PlantState {
    pub directions: HashMap<Pin, bool>,
    pub duties: HashMap<Pin, u8>,
    pub servos: HashMap<Pin, u8>,
    /// Analog readings forced by a test or operator, bypassing the track model
    pub overrides: HashMap<Pin, u16>,
    pub pose: Pose,
    speed: [f32; 2],
    travel: [f32; 2],
}

impl PlantState {
    fn signed_duty(&self, pins: &PinRoles, side: Side) -> f32 {
        let motor = match side {
            Side::Left => pins.left_motor,
            Side::Right => pins.right_motor,
        };
        let duty = f32::from(self.duties.get(&motor.pwm).copied().unwrap_or(0));
        if self.directions.get(&motor.direction).copied().unwrap_or(true) {
            -duty
        } else {
            duty
        }
    }
}

/// Shared plant; clones drive the same simulated vehicle
#[derive(Debug, Clone)]
pub struct Plant {
    state: Arc<Mutex<PlantState>>,
    odometry: Odometry,
    track: Arc<Track>,
    pins: PinRoles,
}

impl Plant {
    /// Plant on `track`, starting on the first line between two markers
    pub fn new(odometry: Odometry, track: Track) -> Self {
        let pose = Pose {
            x: track.spacing / 2.0,
            y: 0.0,
            heading: 0.0,
        };
        let state = PlantState {
            directions: HashMap::new(),
            duties: HashMap::new(),
            servos: HashMap::from([(PIN_ROLES.servo_a, 90), (PIN_ROLES.servo_b, 90)]),
            overrides: HashMap::new(),
            pose,
            speed: [0.0; 2],
            travel: [0.0; 2],
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            odometry,
            track: Arc::new(track),
            pins: PIN_ROLES,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PlantState> {
        // A panic while holding the lock leaves plain data behind; keep going
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn pins(&self) -> &PinRoles {
        &self.pins
    }

    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    /// Force an analog channel to a fixed value
    pub fn set_override(&self, pin: Pin, value: u16) {
        self.lock().overrides.insert(pin, value);
    }

    pub fn clear_override(&self, pin: Pin) {
        self.lock().overrides.remove(&pin);
    }

    /// Advance the plant by `dt`
    pub fn step(&self, dt: Duration) {
        let dt = dt.as_secs_f32();
        let alpha = (dt / MOTOR_LAG.as_secs_f32()).min(1.0);
        let mut state = self.lock();
        let mut moved = [0.0f32; 2];

        for (i, side) in [Side::Left, Side::Right].into_iter().enumerate() {
            let target = state.signed_duty(&self.pins, side) * UNITS_PER_DUTY * WHEEL_GAIN[i];
            state.speed[i] += (target - state.speed[i]) * alpha;
            moved[i] = state.speed[i] * dt;
            state.travel[i] += moved[i];

            let polarity = match side {
                Side::Left => self.pins.left_polarity,
                Side::Right => self.pins.right_polarity,
            };
            while state.travel[i] >= 1.0 {
                state.travel[i] -= 1.0;
                self.odometry.tick(side, polarity.sense_for(true));
            }
            while state.travel[i] <= -1.0 {
                state.travel[i] += 1.0;
                self.odometry.tick(side, polarity.sense_for(false));
            }
        }

        let ds = (moved[0] + moved[1]) / 2.0;
        let pose = &mut state.pose;
        pose.heading += (moved[1] - moved[0]) / WHEEL_BASE;
        pose.x += ds * pose.heading.cos();
        pose.y += ds * pose.heading.sin();
    }

    /// Step at the fixed plant rate until `stop` is set (test harness, plain thread)
    pub fn run_blocking(&self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            self.step(PLANT_STEP);
            std::thread::sleep(PLANT_STEP);
        }
    }

    /// Step at the fixed plant rate forever (binary, on the tokio runtime)
    pub async fn run(self) {
        info!("Plant running at {:?} steps", PLANT_STEP);
        let mut tick = interval(PLANT_STEP);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut steps: u64 = 0;

        loop {
            tick.tick().await;
            self.step(PLANT_STEP);
            steps += 1;
            if steps % 1000 == 0 {
                let pose = self.pose();
                debug!(
                    "Plant t={}s pose=({:.0}, {:.0}, {:.2} rad)",
                    steps / 1000,
                    pose.x,
                    pose.y,
                    pose.heading
                );
            }
        }
    }
}

// Blocking maneuver sequencer
//
// Every maneuver is a chain of busy-wait polls on live odometry or sensor
// predicates. Without a configured wait deadline an unmet predicate stalls the
// vehicle in place forever; only the brake window and the cube pause are timed.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::calibration::{CalibrationReport, Calibrator};
use crate::config::{
    CALIBRATION_SPEED, CROSS_THRESHOLD, CUBE_MIN_SAMPLES, CUBE_PAUSE, CUBE_PROXIMITY, RAMP_AIM_DEG,
    RAMP_MIN_SPEED, SCAN_DEG, SCAN_SPEED, TURN_ALIGN_SPEED, TURN_ALIGN_THRESHOLD, TURN_SETTLE_DEG,
    TURN_SETTLE_SPEED, TURN_SPIN_DEG, TURN_SPIN_SPEED,
};
use crate::control::{ControlContext, SpeedPair};
use crate::error::{ControlError, Result};
use crate::hal::Board;
use crate::maneuver::{ManeuverState, Rotation};
use crate::motor::MotorDriver;
use crate::odometry::{Odometry, Side};
use crate::sensors::{SensorCalibration, SensorModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerConfig {
    /// Give up on a predicate wait after this long. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Report a flat calibration range as an error
    pub strict_calibration: bool,
}

/// What a line-cross run went through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossSummary {
    pub crosses: u32,
    pub cubes: u32,
}

/// Target speed while ramping from `min` toward `max` over the aim distance
pub fn ramp_speed(distance: f32, min: i32, max: i32) -> i32 {
    let fraction = (distance / RAMP_AIM_DEG).min(1.0);
    (fraction * (max as f32 - min as f32) + min as f32) as i32
}

pub struct ManeuverSequencer<B: Board> {
    board: B,
    sensors: SensorModel,
    motors: MotorDriver,
    ctx: ControlContext,
    config: SequencerConfig,
    state: watch::Sender<ManeuverState>,
}

impl<B: Board> ManeuverSequencer<B> {
    pub fn new(board: B, odometry: Odometry, config: SequencerConfig) -> Self {
        let (state, _) = watch::channel(ManeuverState::Idle);
        Self {
            board,
            sensors: SensorModel::default(),
            motors: MotorDriver::new(),
            ctx: ControlContext::new(odometry),
            config,
            state,
        }
    }

    /// Receiver that always holds the current state
    pub fn subscribe(&self) -> watch::Receiver<ManeuverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ManeuverState {
        *self.state.borrow()
    }

    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    pub fn sensors(&self) -> &SensorModel {
        &self.sensors
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Use ranges from an earlier calibration instead of spinning
    pub fn install_calibration(&mut self, calibration: SensorCalibration) {
        self.sensors.set_calibration(calibration);
    }

    fn enter(&self, next: ManeuverState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("{:?} -> {:?}", previous, next);
        }
    }

    /// Poll `done` until it holds. Every miss checks the wait deadline, which
    /// also samples the clock once per iteration.
    fn wait_until<F>(&mut self, mut done: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> bool,
    {
        let started = self.board.elapsed();
        while !done(self) {
            self.check_deadline(started)?;
        }
        Ok(())
    }

    fn check_deadline(&mut self, started: Duration) -> Result<()> {
        let waited = self.board.elapsed().saturating_sub(started);
        match self.config.wait_timeout {
            Some(limit) if waited >= limit => {
                let state = self.state();
                warn!("Wait in {:?} not met after {:?}, cutting power", state, waited);
                self.motors.stop(&mut self.board);
                Err(ControlError::WaitTimeout { state, waited })
            }
            _ => Ok(()),
        }
    }

    fn drive(&mut self, speeds: SpeedPair) {
        self.motors.drive(&mut self.board, speeds.left, speeds.right);
    }

    fn spin(&mut self, rotation: Rotation, speed: i32) {
        let (left, right) = rotation.spin(speed);
        self.motors.drive(&mut self.board, left, right);
    }

    fn left_distance(&self) -> i64 {
        self.ctx.displacement(Side::Left).abs()
    }

    /// One tick of the line-following law at forward speed `v`
    pub fn line_follow_tick(&mut self, v: i32) -> SpeedPair {
        let reading = self.sensors.line_error(&mut self.board);
        let speeds = self.ctx.pd.line_follow(v, reading);
        self.drive(speeds);
        speeds
    }

    /// One tick of the heading law at forward speed `v`
    pub fn heading_tick(&mut self, v: i32) -> SpeedPair {
        let speeds = self
            .ctx
            .pd
            .heading(v, self.ctx.odometry.left(), self.ctx.odometry.right());
        self.drive(speeds);
        speeds
    }

    fn cross_detected(&mut self) -> bool {
        self.sensors
            .line_error(&mut self.board)
            .both_below(CROSS_THRESHOLD)
    }

    /// A zero reading (nothing echoed back) also counts as close
    fn cube_in_range(&mut self) -> bool {
        self.sensors.aux_range(&mut self.board) < CUBE_PROXIMITY
    }

    fn active_brake(&mut self) {
        self.motors.active_brake(&mut self.board, &self.ctx.odometry);
    }

    /// Active brake, then report the vehicle stopped
    pub fn brake(&mut self) {
        self.active_brake();
        self.enter(ManeuverState::Stopped);
    }

    /// Cut power and hold still for `duration`
    pub fn pause(&mut self, duration: Duration) {
        self.motors.stop(&mut self.board);
        self.board.delay(duration);
        self.enter(ManeuverState::Stopped);
    }

    fn cube_pause(&mut self) {
        self.enter(ManeuverState::CubePause);
        self.active_brake();
        self.board.delay(CUBE_PAUSE);
    }

    /// Spin in place until the left wheel has covered `target_degrees`, recording
    /// line-sensor extrema on the way. The observed ranges are always installed.
    pub fn calibrate(&mut self, target_degrees: i64, rotation: Rotation) -> Result<CalibrationReport> {
        info!("Calibrating: spinning {:?} for {} deg", rotation, target_degrees);
        self.enter(ManeuverState::CalibrateSpin);
        self.ctx.reset_phase();
        self.spin(rotation, CALIBRATION_SPEED);

        let mut calibrator = Calibrator::new();
        self.wait_until(|s| {
            if s.left_distance() >= target_degrees {
                return true;
            }
            let (right, left) = s.sensors.read_raw(&mut s.board);
            calibrator.sample(right, left);
            false
        })?;
        self.brake();

        let report = calibrator.finish();
        self.sensors.set_calibration(report.calibration);

        if self.config.strict_calibration {
            if let Some(&channel) = report.degenerate.first() {
                let range = match channel {
                    Side::Right => report.calibration.right,
                    Side::Left => report.calibration.left,
                };
                return Err(ControlError::DegenerateCalibration {
                    channel,
                    value: range.min,
                });
            }
        }
        Ok(report)
    }

    /// Follow the line across `count` perpendicular markers.
    ///
    /// Speed ramps from the floor speed toward `speed` over the aim distance.
    /// After each marker the vehicle keeps following at scan speed for a fixed
    /// distance; with `scan` set, enough close auxiliary samples in that window
    /// mean a cube, which triggers a brake and a fixed pause. The run ends
    /// without braking so the next maneuver takes over from a rolling start.
    pub fn line_follow_cross(&mut self, speed: i32, count: u32, scan: bool) -> Result<CrossSummary> {
        info!("Line follow: {} crosses at speed {}, scan={}", count, speed, scan);
        self.ctx.reset_phase();

        let mut summary = CrossSummary::default();
        let mut distance = 0.0f32;

        for i in 0..count {
            self.ctx.cube_detected = false;
            self.enter(if distance < RAMP_AIM_DEG {
                ManeuverState::StraightRamp
            } else {
                ManeuverState::CrossDetectWait
            });

            self.wait_until(|s| {
                let v = ramp_speed(distance, RAMP_MIN_SPEED, speed);
                s.line_follow_tick(v);
                distance = s.ctx.mean_distance() as f32;
                if distance >= RAMP_AIM_DEG {
                    s.enter(ManeuverState::CrossDetectWait);
                }
                s.cross_detected()
            })?;
            summary.crosses += 1;
            debug!("Cross {}/{} detected", i + 1, count);

            self.ctx.reset_phase();
            self.enter(ManeuverState::CrossScan);
            let mut close_samples = 0u32;
            self.wait_until(|s| {
                if s.left_distance() >= SCAN_DEG {
                    return true;
                }
                s.line_follow_tick(SCAN_SPEED);
                if scan && s.cube_in_range() {
                    close_samples = close_samples.saturating_add(1);
                }
                false
            })?;

            if close_samples >= CUBE_MIN_SAMPLES {
                info!("Cube after cross {} ({} close samples)", i + 1, close_samples);
                self.ctx.cube_detected = true;
                summary.cubes += 1;
                self.cube_pause();
            }
        }

        Ok(summary)
    }

    /// Follow the line until the left wheel has covered `degrees`, then brake
    pub fn line_follow_distance(&mut self, speed: i32, degrees: i64) -> Result<()> {
        info!("Line follow: {} deg at speed {}", degrees, speed);
        self.enter(ManeuverState::EncoderRun);
        self.ctx.reset_phase();
        self.wait_until(|s| {
            if s.left_distance() >= degrees {
                return true;
            }
            s.line_follow_tick(speed);
            false
        })?;
        self.brake();
        Ok(())
    }

    /// Three-phase spin: fast for a fixed distance, slower until the tracking
    /// sensor on the turn side reads off the line, then a short fixed settle.
    /// Phases always run in that order.
    pub fn turn(&mut self, rotation: Rotation) -> Result<()> {
        info!("Turn {:?}", rotation);
        self.enter(ManeuverState::TurnSpin);
        self.active_brake();
        self.ctx.reset_phase();
        self.spin(rotation, TURN_SPIN_SPEED);
        self.wait_until(|s| s.left_distance() >= TURN_SPIN_DEG)?;

        self.enter(ManeuverState::TurnAlign);
        self.spin(rotation, TURN_ALIGN_SPEED);
        self.wait_until(|s| {
            let reading = match rotation {
                Rotation::Right => s.sensors.read_right(&mut s.board),
                Rotation::Left => s.sensors.read_left(&mut s.board),
            };
            reading > TURN_ALIGN_THRESHOLD
        })?;

        self.enter(ManeuverState::TurnSettle);
        self.spin(rotation, TURN_SETTLE_SPEED);
        self.ctx.odometry.reset();
        self.wait_until(|s| s.left_distance() >= TURN_SETTLE_DEG)?;

        self.brake();
        Ok(())
    }

    /// Drive on the heading law until the left wheel has covered `degrees`
    pub fn arc(&mut self, speed: i32, degrees: i64) -> Result<()> {
        info!("Arc: {} deg at speed {}", degrees, speed);
        self.enter(ManeuverState::Arc);
        self.ctx.reset_phase();
        self.wait_until(|s| {
            if s.left_distance() >= degrees {
                return true;
            }
            s.heading_tick(speed);
            false
        })?;
        self.brake();
        Ok(())
    }
}

impl<B: Board> Drop for ManeuverSequencer<B> {
    fn drop(&mut self) {
        // Never leave the motors powered once nobody is steering
        self.motors.stop(&mut self.board);
    }
}

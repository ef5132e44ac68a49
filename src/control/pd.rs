// Proportional-derivative steering laws
//
// Both laws share one shape: u = err * kp + kd * (err - prev), speeds = (v - u, v + u).
// They differ in where the error comes from and how the gains are chosen.

use tracing::trace;

use crate::config::{PD_KD, PD_KP, PD_REF_SPEED};
use crate::sensors::LineReading;

/// Signed speed command for the two wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPair {
    pub left: i32,
    pub right: i32,
}

impl SpeedPair {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    fn steer(v: i32, u: i64) -> Self {
        let v = i64::from(v);
        Self {
            left: (v - u).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            right: (v + u).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        }
    }
}

/// Gains for the line-following law at forward speed `v`.
///
/// kp scales continuously with speed; kd uses integer division, so it only
/// steps up every 70 units of speed.
pub fn line_follow_gains(v: i32) -> (f32, f32) {
    let kp = PD_KP * v as f32 / PD_REF_SPEED as f32;
    let kd = (PD_KD * v / PD_REF_SPEED) as f32;
    (kp, kd)
}

/// Gains for the heading law
pub fn heading_gains() -> (f32, f32) {
    (PD_KP, PD_KD as f32)
}

/// Correction term, truncated toward zero
pub fn correction(err: i64, prev: i64, kp: f32, kd: f32) -> i64 {
    (err as f32 * kp + kd * (err - prev) as f32) as i64
}

/// Previous-error memory shared by whichever law is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdState {
    prev_error: i64,
}

impl PdState {
    pub fn prev_error(&self) -> i64 {
        self.prev_error
    }

    /// Forget history; required before the first tick of a new phase
    pub fn reset(&mut self) {
        self.prev_error = 0;
    }

    /// Line-following law: error is right minus left normalized reading
    pub fn line_follow(&mut self, v: i32, reading: LineReading) -> SpeedPair {
        let (kp, kd) = line_follow_gains(v);
        self.apply(v, i64::from(reading.error()), kp, kd)
    }

    /// Heading/arc law: error is left minus right displacement
    pub fn heading(&mut self, v: i32, left: i64, right: i64) -> SpeedPair {
        let (kp, kd) = heading_gains();
        self.apply(v, left - right, kp, kd)
    }

    fn apply(&mut self, v: i32, err: i64, kp: f32, kd: f32) -> SpeedPair {
        let u = correction(err, self.prev_error, kp, kd);
        trace!("pd: v={} err={} prev={} u={}", v, err, self.prev_error, u);
        self.prev_error = err;
        SpeedPair::steer(v, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(right: i32, left: i32) -> LineReading {
        LineReading { right, left }
    }

    #[test]
    fn test_zero_error_keeps_speed() {
        let mut pd = PdState::default();
        assert_eq!(pd.line_follow(150, reading(250, 250)), SpeedPair::new(150, 150));
        assert_eq!(pd.heading(90, 40, 40), SpeedPair::new(90, 90));
        assert_eq!(correction(0, 0, 0.15, 1.0), 0);
    }

    #[test]
    fn test_line_follow_gains_scale_with_speed() {
        let (kp, kd) = line_follow_gains(140);
        assert!((kp - 0.3).abs() < 1e-6);
        assert_eq!(kd, 2.0);

        // kd steps in whole units
        assert_eq!(line_follow_gains(60).1, 0.0);
        assert_eq!(line_follow_gains(69).1, 0.0);
        assert_eq!(line_follow_gains(70).1, 1.0);
        assert_eq!(line_follow_gains(139).1, 1.0);
    }

    #[test]
    fn test_line_follow_first_tick() {
        let mut pd = PdState::default();
        // err = 300 - 100 = 200, kp = 0.3, kd = 2 -> u = 60 + 400 = 460
        let out = pd.line_follow(140, reading(300, 100));
        assert_eq!(out, SpeedPair::new(140 - 460, 140 + 460));
        assert_eq!(pd.prev_error(), 200);
    }

    #[test]
    fn test_derivative_uses_previous_error() {
        let mut pd = PdState::default();
        pd.line_follow(140, reading(300, 100));
        // err unchanged: only the proportional part remains
        let out = pd.line_follow(140, reading(300, 100));
        assert_eq!(out, SpeedPair::new(80, 200));
    }

    #[test]
    fn test_correction_truncates_toward_zero() {
        // 7 * 0.15 = 1.05 -> 1
        assert_eq!(correction(7, 7, 0.15, 1.0), 1);
        assert_eq!(correction(-7, -7, 0.15, 1.0), -1);
    }

    #[test]
    fn test_heading_steers_toward_lagging_wheel() {
        let mut pd = PdState::default();
        // Left wheel ahead: slow the left, speed up the right
        let out = pd.heading(100, 20, 0);
        // u = 20 * 0.15 + (20 - 0) = 23
        assert_eq!(out, SpeedPair::new(77, 123));
        assert_eq!(pd.prev_error(), 20);
    }

    #[test]
    fn test_stale_error_spikes_until_reset() {
        let mut pd = PdState::default();
        pd.heading(100, 500, 0);
        let stale = pd.heading(100, 0, 0);
        assert_ne!(stale, SpeedPair::new(100, 100));

        pd.heading(100, 500, 0);
        pd.reset();
        assert_eq!(pd.heading(100, 0, 0), SpeedPair::new(100, 100));
    }
}

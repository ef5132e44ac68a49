pub mod actuator;
pub mod calibration;
pub mod config;
pub mod control;
pub mod error;
pub mod hal;
pub mod maneuver;
pub mod mission;
pub mod motor;
pub mod odometry;
pub mod runtime;
pub mod sensors;
pub mod sim;

#[cfg(test)]
mod fakes;

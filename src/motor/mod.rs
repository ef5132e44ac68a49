// Motor output for the differential base
//
// Provides:
// - Signed speed pair -> direction bit + PWM duty per motor
// - Active brake driven by live odometry

mod driver;

pub use driver::{ChannelCommand, MotorDriver, saturate};

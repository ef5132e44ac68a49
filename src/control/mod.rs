// Closed-loop steering
//
// Provides:
// - The line-following and heading PD laws
// - The control context that carries odometry and PD memory between ticks

mod context;
pub mod pd;

pub use context::ControlContext;
pub use pd::{PdState, SpeedPair};

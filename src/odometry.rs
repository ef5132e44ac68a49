// Encoder odometry: two signed relative-displacement counters
//
// The edge domain (encoder interrupts, or the simulator plant) calls `tick` on every
// falling edge; the control domain reads and resets. Each edge is a single atomic
// accumulate, so neither side ever blocks the other.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::{EncoderPolarity, PIN_ROLES};

/// Wheel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

#[derive(Debug)]
struct Counters {
    displacement: [AtomicI64; 2],
    polarity: [EncoderPolarity; 2],
}

/// Shared handle to both wheel counters; clones see the same counters
#[derive(Debug, Clone)]
pub struct Odometry {
    inner: Arc<Counters>,
}

impl Odometry {
    pub fn new() -> Self {
        Self::with_polarity(PIN_ROLES.left_polarity, PIN_ROLES.right_polarity)
    }

    pub fn with_polarity(left: EncoderPolarity, right: EncoderPolarity) -> Self {
        Self {
            inner: Arc::new(Counters {
                displacement: [AtomicI64::new(0), AtomicI64::new(0)],
                polarity: [left, right],
            }),
        }
    }

    /// Edge handler: `sense_high` is the level of the wheel's direction-sense
    /// input sampled at the moment of the edge
    pub fn tick(&self, side: Side, sense_high: bool) {
        let i = side.index();
        let step = self.inner.polarity[i].step(sense_high);
        self.inner.displacement[i].fetch_add(step, Ordering::Relaxed);
    }

    /// Point-in-time snapshot, may trail the edge domain by one edge
    pub fn read(&self, side: Side) -> i64 {
        self.inner.displacement[side.index()].load(Ordering::Relaxed)
    }

    pub fn left(&self) -> i64 {
        self.read(Side::Left)
    }

    pub fn right(&self) -> i64 {
        self.read(Side::Right)
    }

    pub fn reset(&self) {
        for counter in &self.inner.displacement {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Odometry {
    fn default() -> Self {
        Self::new()
    }
}

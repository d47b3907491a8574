//! Fixed timestep bookkeeping
//!
//! Frame times vary; the stage pipeline always advances by the same fixed step.
//! The accumulator banks frame time, hands out whole ticks, and keeps the
//! remainder for the interpolation alpha used when rendering.

use tracing::warn;

/// Most ticks of backlog kept before the surplus is dropped
pub const MAX_BACKLOG_TICKS: f32 = 8.0;

/// Banks variable frame time and converts it into whole fixed ticks
#[derive(Debug, Clone)]
pub struct PhysicsAccumulator {
    banked: f32,
    pub fixed_timestep: f32,
}

impl PhysicsAccumulator {
    pub fn new(fixed_timestep: f32) -> Self {
        Self {
            banked: 0.0,
            fixed_timestep,
        }
    }

    /// Bank `delta_time` and return how many ticks are now due. Negative frame
    /// times are ignored and the backlog never exceeds [`MAX_BACKLOG_TICKS`].
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        self.banked += delta_time.max(0.0);

        let ceiling = self.fixed_timestep * MAX_BACKLOG_TICKS;
        if self.banked > ceiling {
            warn!(
                backlog = self.banked,
                dropped = self.banked - ceiling,
                "Simulation fell behind, dropping backlog beyond {MAX_BACKLOG_TICKS} ticks"
            );
            self.banked = ceiling;
        }

        let due = (self.banked / self.fixed_timestep).floor();
        self.banked -= due * self.fixed_timestep;
        due as u32
    }

    /// Fraction of a tick left in the bank, in `[0, 1)`
    pub fn interpolation_alpha(&self) -> f32 {
        self.banked / self.fixed_timestep
    }

    pub fn reset(&mut self) {
        self.banked = 0.0;
    }

    /// Time banked but not yet simulated
    pub fn accumulated_time(&self) -> f32 {
        self.banked
    }
}

impl Default for PhysicsAccumulator {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

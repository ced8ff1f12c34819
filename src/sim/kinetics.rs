//! Rate-to-discrete-event scheduling
//!
//! Continuous rates (percent per frame, units per 100 frames, inverse bound
//! time) are turned into whole events per frame. Fractional kills are carried
//! in a rounding-error term so the long-run rate matches the real-valued one.

use serde::{Deserialize, Serialize};

/// Natural degradation at a percentage rate per frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Disintegration {
    /// Carried fractional kills, always in [0, 1)
    pub rounding_error: f64,
}

impl Disintegration {
    /// Number of particles to remove this frame out of `amount`, at `rate` % per frame
    pub fn kills_this_frame(&mut self, amount: usize, rate: f64) -> usize {
        if amount == 0 || rate <= 0.0 {
            return 0;
        }
        let exact = amount as f64 * rate / 100.0;
        let whole = exact.floor();
        let mut to_kill = whole as usize;

        self.rounding_error += exact - whole;
        if self.rounding_error >= 1.0 {
            to_kill += 1;
            self.rounding_error -= 1.0;
        }
        // Floating-point drift must not leave the carried term outside [0, 1)
        self.rounding_error = self.rounding_error.clamp(0.0, 1.0 - f64::EPSILON);

        to_kill
    }
}

/// Frames between spawns for a production rate in units per 100 frames
///
/// Returns `None` when production is disabled.
pub fn production_cooldown(rate: f64) -> Option<u32> {
    if rate.is_nan() || rate <= 0.0 {
        return None;
    }
    Some(((100.0 / rate).floor() as u32).max(1))
}

/// Frames a captured particle stays bound for pseudo-unbinding rate `k`
///
/// A result of 0 disables binding at the site.
pub fn unbind_ttl(k: f64) -> u32 {
    if k.is_nan() || k <= 0.0 {
        return 0;
    }
    (1.0 / k).floor() as u32
}

/// Single countdown driving production attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTimer {
    cooldown: Option<u32>,
    remaining: u32,
}

impl ProductionTimer {
    pub fn new(rate: f64) -> Self {
        let cooldown = production_cooldown(rate);
        Self {
            cooldown,
            remaining: cooldown.unwrap_or(0),
        }
    }

    /// Apply a new rate. A running countdown keeps going, capped at the new
    /// cooldown; a stopped one starts from it.
    pub fn set_rate(&mut self, rate: f64) {
        let cooldown = production_cooldown(rate);
        self.remaining = match (self.cooldown, cooldown) {
            (Some(_), Some(next)) => self.remaining.min(next),
            (None, Some(next)) => next,
            (_, None) => 0,
        };
        self.cooldown = cooldown;
    }

    pub fn cooldown(&self) -> Option<u32> {
        self.cooldown
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Count down one eligible frame. Returns true when a spawn attempt is due;
    /// the countdown resets whether or not the spawn then succeeds.
    pub fn tick(&mut self) -> bool {
        let Some(cooldown) = self.cooldown else {
            return false;
        };
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = cooldown;
            true
        } else {
            false
        }
    }
}

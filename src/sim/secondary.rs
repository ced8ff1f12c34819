//! Continuous RecA amount driven by DNA damage

use serde::{Deserialize, Serialize};

/// Real-valued RecA accumulator; the simulated particle count is its rounding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondaryIntegrator {
    pub amount: f64,
}

impl SecondaryIntegrator {
    /// One frame of decay (`delta` %) then damage-driven production (`gamma`).
    /// Returns the discrete count to simulate.
    pub fn step(&mut self, delta: f64, gamma: f64, damage: f64) -> usize {
        self.amount -= self.amount * delta / 100.0;
        self.amount += gamma * damage / 100.0;
        self.amount = self.amount.max(0.0);
        self.discrete()
    }

    pub fn discrete(&self) -> usize {
        self.amount.round() as usize
    }

    /// Seed from a discrete count (entering model D, operator override)
    pub fn reset(&mut self, amount: usize) {
        self.amount = amount as f64;
    }
}

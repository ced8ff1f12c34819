//! DNA damage and plasmid-driven repair

use std::collections::VecDeque;

use serde::Serialize;

use crate::consts::{PLASMID_COUNT, REPAIR_BUCKETS};

/// Repair table bucket for an activation ratio
#[inline]
pub fn bucket(ratio: f64) -> usize {
    ((ratio * REPAIR_BUCKETS as f64).floor().max(0.0) as usize).min(REPAIR_BUCKETS - 1)
}

/// Scalar damage plus the trailing repair magnitudes per plasmid
#[derive(Debug, Clone, Serialize)]
pub struct DamageState {
    value: f64,
    max: f64,
    histories: [VecDeque<f64>; PLASMID_COUNT],
}

impl DamageState {
    pub fn new(initial: f64, max: f64, history_len: usize) -> Self {
        let history = VecDeque::from(vec![0.0; history_len]);
        Self {
            value: initial.clamp(0.0, max),
            max,
            histories: std::array::from_fn(|_| history.clone()),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = value.clamp(0.0, self.max);
    }

    pub fn histories(&self) -> &[VecDeque<f64>; PLASMID_COUNT] {
        &self.histories
    }

    /// Apply one frame of repair from the plasmid activation ratios.
    /// Returns the magnitude each plasmid contributed.
    pub fn repair(
        &mut self,
        ratios: [f64; PLASMID_COUNT],
        tables: &[[f64; REPAIR_BUCKETS]; PLASMID_COUNT],
        weight: f64,
    ) -> [f64; PLASMID_COUNT] {
        let magnitudes: [f64; PLASMID_COUNT] =
            std::array::from_fn(|i| tables[i][bucket(ratios[i])]);

        let total: f64 = magnitudes.iter().map(|m| m * weight).sum();
        self.set(self.value - total);

        for (history, &m) in self.histories.iter_mut().zip(&magnitudes) {
            history.push_back(m);
            history.pop_front();
        }
        magnitudes
    }
}

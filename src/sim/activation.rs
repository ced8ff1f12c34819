//! Trailing-window activation measure for the plasmid operons
//!
//! A plasmid gene is "active" on a frame when its operon is not occupied.
//! Each window remembers the last `len` frames and keeps a running count of
//! active ones, so the ratio is O(1) per frame.

use rand::Rng;
use serde::Serialize;

use crate::consts::PLASMID_COUNT;

#[derive(Debug, Clone, Serialize)]
pub struct ActivationWindow {
    samples: Vec<bool>,
    cursor: usize,
    active: usize,
}

impl ActivationWindow {
    /// All-inactive window; `len` must be positive
    pub fn new(len: usize) -> Self {
        Self::from_samples(vec![false; len.max(1)])
    }

    pub fn from_samples(samples: Vec<bool>) -> Self {
        let active = samples.iter().filter(|&&s| s).count();
        Self {
            samples,
            cursor: 0,
            active,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Fraction of the window spent active, in [0, 1]
    pub fn ratio(&self) -> f64 {
        self.active as f64 / self.samples.len() as f64
    }

    /// Overwrite the oldest sample with this frame's
    pub fn record(&mut self, active: bool) {
        let old = self.samples[self.cursor];
        if old != active {
            if active {
                self.active += 1;
            } else {
                self.active -= 1;
            }
        }
        self.samples[self.cursor] = active;
        self.cursor = (self.cursor + 1) % self.samples.len();
    }
}

/// Windows pre-filled from each plasmid's pseudo-k, so model D does not start
/// from a cold, all-inactive history.
///
/// One uniform draw in [-0.5, 0.5) per sample index is shared by the three
/// windows; window `i` records active when the draw exceeds `1 / k_i / 100`.
pub fn prefill_windows<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    plasmid_k: &[f64; PLASMID_COUNT],
) -> [ActivationWindow; PLASMID_COUNT] {
    let len = len.max(1);
    let thresholds = plasmid_k.map(|k| 1.0 / k / 100.0);
    let mut samples: [Vec<bool>; PLASMID_COUNT] = std::array::from_fn(|_| Vec::with_capacity(len));

    for _ in 0..len {
        let draw = rng.random::<f64>() - 0.5;
        for (window, threshold) in samples.iter_mut().zip(thresholds) {
            window.push(draw > threshold);
        }
    }

    samples.map(ActivationWindow::from_samples)
}

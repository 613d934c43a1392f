//! Adaptive-threshold bit detector.
//!
//! Each bit slot is reduced to its mean amplitude and compared against a
//! threshold derived from a trailing window of **baseline** samples, i.e.
//! samples of earlier slots that were decoded as 0:
//!
//! ```text
//! threshold = mean(window) + nσ · std(window)
//! bit       = block_mean > threshold
//! ```
//!
//! The window ends at the start of the current slot, so a slot never
//! contributes to its own threshold. Only baseline samples enter the window;
//! a window that also held "1" slots would sit on the signal level and hide
//! every run of consecutive ones.
//!
//! While fewer than `W` baseline samples exist the window is partial. Before
//! any baseline has been seen (stream start, or only ones so far) the rest
//! level is taken as 0 and the spread is the slot's own within-slot standard
//! deviation, which carries no information about the slot's level.

use std::collections::VecDeque;

use crate::error::{Result, SimError};
use crate::signal::Waveform;
use crate::stats::{mean, mean_std};

/// Detector output with per-slot diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bits: Vec<bool>,
    pub block_means: Vec<f64>,
    pub thresholds: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveDetector {
    window: usize,
    sigma_multiplier: f64,
}

impl AdaptiveDetector {
    pub fn new(window: usize, sigma_multiplier: f64) -> Result<Self> {
        if window == 0 {
            return Err(SimError::invalid("detector_window_size", "must be at least 1"));
        }
        if !(sigma_multiplier >= 0.0) || !sigma_multiplier.is_finite() {
            return Err(SimError::invalid(
                "detector_sigma_multiplier",
                format!("must be finite and non-negative, got {}", sigma_multiplier),
            ));
        }
        Ok(Self {
            window,
            sigma_multiplier,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn sigma_multiplier(&self) -> f64 {
        self.sigma_multiplier
    }

    /// Decode one bit per slot.
    pub fn decode(&self, waveform: &Waveform) -> Vec<bool> {
        self.decode_with_thresholds(waveform).bits
    }

    /// Decode and keep the slot means and thresholds used for each decision.
    ///
    /// Never fails: non-finite samples simply make the comparison false and
    /// the slot decodes as 0.
    pub fn decode_with_thresholds(&self, waveform: &Waveform) -> Detection {
        let n = waveform.bit_count();
        let mut baseline: VecDeque<f64> = VecDeque::with_capacity(self.window);
        let mut bits = Vec::with_capacity(n);
        let mut block_means = Vec::with_capacity(n);
        let mut thresholds = Vec::with_capacity(n);

        for block in waveform.blocks() {
            let level = mean(block);
            let (rest, spread) = if baseline.is_empty() {
                (0.0, mean_std(block).1)
            } else {
                mean_std(&baseline)
            };
            let threshold = rest + self.sigma_multiplier * spread;
            let bit = level > threshold;

            if !bit {
                for &s in block {
                    if baseline.len() == self.window {
                        baseline.pop_front();
                    }
                    baseline.push_back(s);
                }
            }

            bits.push(bit);
            block_means.push(level);
            thresholds.push(threshold);
        }

        Detection {
            bits,
            block_means,
            thresholds,
        }
    }
}

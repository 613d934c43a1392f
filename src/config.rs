//! Sweep configuration.
//!
//! Every option has a default matching the reference mismatch experiment, so
//! a JSON file only needs the fields it overrides:
//!
//! ```json
//! { "sender_index": 2.0, "receiver_range": { "start": 0.0, "stop": 4.0, "step": 0.5 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detector::AdaptiveDetector;
use crate::error::{Result, SimError};
use crate::noise::NoiseModel;
use crate::signal::{LineCoding, SignalParams};

/// Inclusive receiver-index range `start..=stop` in steps of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiverRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// Slack for deciding whether the last step lands on `stop`.
const RANGE_EPSILON: f64 = 1e-9;

/// Largest number of receiver indices a single sweep may request.
pub const MAX_SWEEP_POINTS: usize = 100_000;

impl ReceiverRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.stop.is_finite() {
            return Err(SimError::invalid(
                "receiver_range",
                format!("bounds must be finite, got {}..{}", self.start, self.stop),
            ));
        }
        if self.start > self.stop {
            return Err(SimError::invalid(
                "receiver_range",
                format!("start {} exceeds stop {}", self.start, self.stop),
            ));
        }
        if !(self.step > 0.0) || !self.step.is_finite() {
            return Err(SimError::invalid(
                "receiver_range",
                format!("step must be positive and finite, got {}", self.step),
            ));
        }
        let steps = self.steps();
        if !(steps < MAX_SWEEP_POINTS as f64) {
            return Err(SimError::invalid(
                "receiver_range",
                format!(
                    "{}..{} step {} spans more than {} points",
                    self.start, self.stop, self.step, MAX_SWEEP_POINTS
                ),
            ));
        }
        Ok(())
    }

    /// Whole steps from `start` that stay within `stop`.
    fn steps(&self) -> f64 {
        ((self.stop - self.start) / self.step + RANGE_EPSILON).floor()
    }

    /// Number of points in the range. Ranges that fail [`validate`] report
    /// at most [`MAX_SWEEP_POINTS`].
    ///
    /// [`validate`]: ReceiverRange::validate
    pub fn len(&self) -> usize {
        let steps = self.steps();
        if !(steps >= 0.0) {
            return 1;
        }
        (steps.min((MAX_SWEEP_POINTS - 1) as f64) as usize) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `start + i·step` for each point, computed by index so no rounding
    /// error accumulates along the sweep.
    pub fn points(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }
}

impl Default for ReceiverRange {
    fn default() -> Self {
        Self::new(1.0, 6.0, 0.2)
    }
}

/// Largest number of gains a gain sweep may request.
pub const MAX_GAIN_POINTS: usize = 1_000;

/// Logarithmically spaced signal gains `min..=max`, `points` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainRange {
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

impl GainRange {
    pub fn new(min: f64, max: f64, points: usize) -> Self {
        Self { min, max, points }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min > 0.0) || !self.max.is_finite() || self.max < self.min {
            return Err(SimError::invalid(
                "gain_range",
                format!("need 0 < min <= max < inf, got {}..{}", self.min, self.max),
            ));
        }
        if self.points == 0 || self.points > MAX_GAIN_POINTS {
            return Err(SimError::invalid(
                "gain_range",
                format!("points must lie in 1..={}, got {}", MAX_GAIN_POINTS, self.points),
            ));
        }
        Ok(())
    }

    /// Gains in ascending order, starting exactly at `min` and ending
    /// exactly at `max`.
    pub fn values(&self) -> Vec<f64> {
        if self.points <= 1 {
            return vec![self.min];
        }
        let ratio = self.max / self.min;
        let last = self.points - 1;
        (0..self.points)
            .map(|j| match j {
                0 => self.min,
                j if j == last => self.max,
                j => self.min * ratio.powf(j as f64 / last as f64),
            })
            .collect()
    }
}

impl Default for GainRange {
    fn default() -> Self {
        Self::new(0.01, 10.0, 31)
    }
}

/// Full configuration of a mismatch sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub sender_index: f64,
    pub receiver_range: ReceiverRange,
    pub coherence_width: f64,
    pub bit_count: usize,
    pub bit_duration_seconds: f64,
    pub sampling_rate_hz: f64,
    pub measurement_noise_sigma: f64,
    pub drift_amplitude: f64,
    pub drift_frequency_hz: f64,
    pub spike_rate_per_sample: f64,
    pub spike_amplitude: f64,
    pub detector_window_size: usize,
    pub detector_sigma_multiplier: f64,
    pub line_coding: LineCoding,
    /// Multiplier on the overlap-scaled signal level.
    pub signal_gain: f64,
    /// Gain axis for critical-gain sweeps.
    pub gain_range: GainRange,
    /// Seeded trials averaged into each sweep point.
    pub trials_per_point: usize,
    /// Base seed; every (point, trial) pair derives its own stream from it.
    pub seed: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let noise = NoiseModel::reference();
        Self {
            sender_index: 3.0,
            receiver_range: ReceiverRange::default(),
            coherence_width: 0.03,
            bit_count: 16,
            bit_duration_seconds: 1.5,
            sampling_rate_hz: 200.0,
            measurement_noise_sigma: noise.gaussian_sigma,
            drift_amplitude: noise.drift_amplitude,
            drift_frequency_hz: noise.drift_frequency_hz,
            spike_rate_per_sample: noise.spike_rate,
            spike_amplitude: noise.spike_amplitude,
            detector_window_size: 300,
            detector_sigma_multiplier: 4.0,
            line_coding: LineCoding::Unipolar,
            signal_gain: 1.0,
            gain_range: GainRange::default(),
            trials_per_point: 1,
            seed: 42,
        }
    }
}

impl SweepConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file. The result is not yet validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn noise_model(&self) -> NoiseModel {
        NoiseModel {
            gaussian_sigma: self.measurement_noise_sigma,
            drift_amplitude: self.drift_amplitude,
            drift_frequency_hz: self.drift_frequency_hz,
            spike_rate: self.spike_rate_per_sample,
            spike_amplitude: self.spike_amplitude,
        }
    }

    pub fn signal_params(&self) -> SignalParams {
        SignalParams {
            bit_count: self.bit_count,
            sampling_rate_hz: self.sampling_rate_hz,
            bit_duration_seconds: self.bit_duration_seconds,
            coding: self.line_coding,
            noise: self.noise_model(),
        }
    }

    pub fn detector(&self) -> Result<AdaptiveDetector> {
        AdaptiveDetector::new(self.detector_window_size, self.detector_sigma_multiplier)
    }

    /// Check every option before any simulation work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.sender_index.is_finite() {
            return Err(SimError::invalid(
                "sender_index",
                format!("must be finite, got {}", self.sender_index),
            ));
        }
        if !(self.coherence_width > 0.0) || !self.coherence_width.is_finite() {
            return Err(SimError::invalid(
                "coherence_width",
                format!("must be positive and finite, got {}", self.coherence_width),
            ));
        }
        if !(self.signal_gain > 0.0) || !self.signal_gain.is_finite() {
            return Err(SimError::invalid(
                "signal_gain",
                format!("must be positive and finite, got {}", self.signal_gain),
            ));
        }
        self.receiver_range.validate()?;
        self.gain_range.validate()?;
        self.signal_params().validate()?;
        self.detector()?;
        if self.trials_per_point == 0 {
            return Err(SimError::invalid("trials_per_point", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_experiment() {
        let c = SweepConfig::default();
        assert_eq!(c.sender_index, 3.0);
        assert_eq!(c.receiver_range, ReceiverRange::new(1.0, 6.0, 0.2));
        assert_eq!(c.coherence_width, 0.03);
        assert_eq!(c.bit_count, 16);
        assert_eq!(c.bit_duration_seconds, 1.5);
        assert_eq!(c.sampling_rate_hz, 200.0);
        assert_eq!(c.measurement_noise_sigma, 0.05);
        assert_eq!(c.drift_amplitude, 0.02);
        assert_eq!(c.spike_rate_per_sample, 0.002);
        assert_eq!(c.detector_window_size, 300);
        assert_eq!(c.detector_sigma_multiplier, 4.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn default_range_has_26_points_ending_on_stop() {
        let pts = ReceiverRange::default().points();
        assert_eq!(pts.len(), 26);
        assert_eq!(pts[0], 1.0);
        assert!((pts[25] - 6.0).abs() < 1e-12);
        assert!((pts[10] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_range_is_one_point() {
        let r = ReceiverRange::new(3.0, 3.0, 0.5);
        assert!(r.validate().is_ok());
        assert_eq!(r.points(), vec![3.0]);
    }

    #[test]
    fn step_that_overshoots_stop_is_truncated() {
        let r = ReceiverRange::new(0.0, 1.0, 0.3);
        assert_eq!(r.len(), 4);
        assert!(r.points().iter().all(|&p| p <= 1.0));
    }

    #[test]
    fn oversized_range_rejected_before_sizing() {
        let r = ReceiverRange::new(0.0, 1e300, 1e-300);
        match r.validate() {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, "receiver_range"),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
        assert_eq!(r.len(), MAX_SWEEP_POINTS);

        let cfg = SweepConfig {
            receiver_range: r,
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().is_invalid_parameter());

        let widest = ReceiverRange::new(0.0, (MAX_SWEEP_POINTS - 1) as f64, 1.0);
        assert!(widest.validate().is_ok());
        assert_eq!(widest.len(), MAX_SWEEP_POINTS);
        let too_wide = ReceiverRange::new(0.0, MAX_SWEEP_POINTS as f64, 1.0);
        assert!(too_wide.validate().is_err());
    }

    #[test]
    fn gain_range_is_log_spaced_with_exact_ends() {
        let g = GainRange::new(0.001, 1.0, 4).values();
        assert_eq!(g.len(), 4);
        assert_eq!(g[0], 0.001);
        assert_eq!(g[3], 1.0);
        assert!((g[1] - 0.01).abs() < 1e-12);
        assert!((g[2] - 0.1).abs() < 1e-12);
        assert_eq!(GainRange::new(0.5, 0.5, 1).values(), vec![0.5]);
        assert_eq!(GainRange::default().values().len(), 31);
    }

    #[test]
    fn malformed_ranges_rejected() {
        assert!(ReceiverRange::new(6.0, 1.0, 0.2).validate().is_err());
        assert!(ReceiverRange::new(1.0, 6.0, 0.0).validate().is_err());
        assert!(ReceiverRange::new(1.0, 6.0, -0.2).validate().is_err());
        assert!(ReceiverRange::new(f64::NAN, 6.0, 0.2).validate().is_err());
    }

    #[test]
    fn validation_catches_each_bad_field() {
        let cases: Vec<(&str, SweepConfig)> = vec![
            ("coherence_width", SweepConfig { coherence_width: 0.0, ..Default::default() }),
            ("coherence_width", SweepConfig { coherence_width: -0.03, ..Default::default() }),
            ("sampling_rate_hz", SweepConfig { sampling_rate_hz: 0.0, ..Default::default() }),
            ("bit_count", SweepConfig { bit_count: 0, ..Default::default() }),
            ("bit_duration_seconds", SweepConfig { bit_duration_seconds: -1.0, ..Default::default() }),
            ("receiver_range", SweepConfig {
                receiver_range: ReceiverRange::new(5.0, 1.0, 0.2),
                ..Default::default()
            }),
            ("measurement_noise_sigma", SweepConfig { measurement_noise_sigma: -0.1, ..Default::default() }),
            ("detector_window_size", SweepConfig { detector_window_size: 0, ..Default::default() }),
            ("trials_per_point", SweepConfig { trials_per_point: 0, ..Default::default() }),
            ("signal_gain", SweepConfig { signal_gain: 0.0, ..Default::default() }),
            ("gain_range", SweepConfig {
                gain_range: GainRange::new(1.0, 0.1, 5),
                ..Default::default()
            }),
            ("gain_range", SweepConfig {
                gain_range: GainRange::new(0.01, 10.0, 0),
                ..Default::default()
            }),
        ];
        for (field, cfg) in cases {
            match cfg.validate() {
                Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, field),
                other => panic!("expected InvalidParameter for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let cfg = SweepConfig::from_json_str(
            r#"{ "sender_index": 2.0, "trials_per_point": 5, "line_coding": "bipolar" }"#,
        )
        .unwrap();
        assert_eq!(cfg.sender_index, 2.0);
        assert_eq!(cfg.trials_per_point, 5);
        assert_eq!(cfg.line_coding, LineCoding::Bipolar);
        assert_eq!(cfg.bit_count, 16);
        assert_eq!(cfg.receiver_range, ReceiverRange::default());
    }

    #[test]
    fn json_survives_a_round_trip() {
        let cfg = SweepConfig {
            seed: 7,
            drift_frequency_hz: 0.25,
            ..Default::default()
        };
        let back = SweepConfig::from_json_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let err = SweepConfig::from_json_str("{ \"bit_count\": \"many\" }").unwrap_err();
        assert!(matches!(err, SimError::ConfigFormat(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SweepConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}

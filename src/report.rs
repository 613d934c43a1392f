//! Sweep reports: ordered sweep points plus derived summaries, and the
//! receiver × gain grid behind the critical-gain analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;
use crate::error::Result;
use crate::scoring::snr_db;
use crate::sweep::{Measurement, PointOutcome, SweepPoint};

/// Result of a full sweep, sorted by receiver index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sender_index: f64,
    pub coherence_width: f64,
    pub bit_duration_seconds: f64,
    pub points: Vec<SweepPoint>,
}

/// Receiver-index interval around the sender where BER stays within a limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddressingWindow {
    pub lower: f64,
    pub upper: f64,
}

impl AddressingWindow {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl SweepReport {
    pub fn new(config: &SweepConfig, points: Vec<SweepPoint>) -> Self {
        Self {
            sender_index: config.sender_index,
            coherence_width: config.coherence_width,
            bit_duration_seconds: config.bit_duration_seconds,
            points,
        }
    }

    /// Successful points only; failed points are excluded from every summary.
    pub fn measured(&self) -> impl Iterator<Item = (&SweepPoint, &Measurement)> {
        self.points
            .iter()
            .filter_map(|p| p.measurement().map(|m| (p, m)))
    }

    pub fn failed_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_failed()).count()
    }

    /// Point with the highest mean SNR.
    pub fn peak_snr(&self) -> Option<&SweepPoint> {
        self.measured()
            .max_by(|(_, a), (_, b)| a.snr.total_cmp(&b.snr))
            .map(|(p, _)| p)
    }

    /// Mean BER over all measured points.
    pub fn mean_ber(&self) -> Option<f64> {
        let bers: Vec<f64> = self.measured().map(|(_, m)| m.ber).collect();
        if bers.is_empty() {
            return None;
        }
        Some(bers.iter().sum::<f64>() / bers.len() as f64)
    }

    /// Shannon estimate `B · log2(1 + SNR²)` with `B = 1/T`, in bits/s.
    pub fn channel_capacity_bps(&self, snr: f64) -> f64 {
        let bandwidth = 1.0 / self.bit_duration_seconds;
        bandwidth * (1.0 + snr * snr).log2()
    }

    /// Interval of receiver indices around the sender whose mean BER is at
    /// most `ber_limit`, with each edge linearly interpolated between the last
    /// passing and first failing point. An edge that never fails inside the
    /// sweep is the last measured point on that side.
    ///
    /// Returns `None` when the measured point nearest the sender already
    /// exceeds the limit.
    pub fn addressing_window(&self, ber_limit: f64) -> Option<AddressingWindow> {
        let measured: Vec<(f64, f64)> = self
            .measured()
            .map(|(p, m)| (p.receiver_index, m.ber))
            .collect();

        let centre = measured
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.0 - self.sender_index)
                    .abs()
                    .total_cmp(&(b.0 - self.sender_index).abs())
            })
            .map(|(i, _)| i)?;
        if measured[centre].1 > ber_limit {
            return None;
        }

        let crossing = |inside: (f64, f64), outside: (f64, f64)| {
            let frac = (ber_limit - inside.1) / (outside.1 - inside.1);
            inside.0 + frac * (outside.0 - inside.0)
        };

        let mut lower = measured[centre].0;
        for i in (0..centre).rev() {
            if measured[i].1 > ber_limit {
                lower = crossing(measured[i + 1], measured[i]);
                break;
            }
            lower = measured[i].0;
        }

        let mut upper = measured[centre].0;
        for i in centre + 1..measured.len() {
            if measured[i].1 > ber_limit {
                upper = crossing(measured[i - 1], measured[i]);
                break;
            }
            upper = measured[i].0;
        }

        Some(AddressingWindow { lower, upper })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {:>7}  {:>6}  {:>9}  {:>7}  {:>7}  {:>8}  {:>8}  {:>10}",
            "C_recv", "ΔC", "overlap", "BER", "±σ", "SNR", "SNR(dB)", "cap (b/s)"
        )?;
        writeln!(
            f,
            "  {:─>7}  {:─>6}  {:─>9}  {:─>7}  {:─>7}  {:─>8}  {:─>8}  {:─>10}",
            "", "", "", "", "", "", "", ""
        )?;
        for p in &self.points {
            let dc = p.receiver_index - self.sender_index;
            let o = p.overlap.unwrap_or(f64::NAN);
            match &p.outcome {
                PointOutcome::Measured(m) => writeln!(
                    f,
                    "  {:>7.2}  {:>+6.2}  {:>9.4}  {:>7.4}  {:>7.4}  {:>8.2}  {:>8.1}  {:>10.3}",
                    p.receiver_index,
                    dc,
                    o,
                    m.ber,
                    m.ber_std,
                    m.snr,
                    snr_db(m.snr),
                    self.channel_capacity_bps(m.snr)
                )?,
                PointOutcome::Failed { reason } => writeln!(
                    f,
                    "  {:>7.2}  {:>+6.2}  {:>9.4}  FAILED ({})",
                    p.receiver_index, dc, o, reason
                )?,
            }
        }
        Ok(())
    }
}

/// BER of every gain for one receiver index, in gain order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainCurve {
    pub receiver_index: f64,
    pub overlap: Option<f64>,
    pub outcomes: Vec<PointOutcome>,
}

/// Smallest gain at which one receiver is decoded within the BER limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalGain {
    pub receiver_index: f64,
    /// Receiver nearest the sender.
    pub matched: bool,
    /// `None` if no gain on the axis reaches the limit.
    pub gain: Option<f64>,
    /// Lowest mean BER seen anywhere on the gain axis.
    pub best_ber: Option<f64>,
}

/// Receiver × gain grid produced by [`crate::sweep::run_gain_sweep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainSweepReport {
    pub sender_index: f64,
    pub coherence_width: f64,
    /// Ascending gain axis shared by every curve.
    pub gains: Vec<f64>,
    /// One curve per receiver index, ascending.
    pub curves: Vec<GainCurve>,
}

impl GainSweepReport {
    /// Index of the curve whose receiver is nearest the sender.
    pub fn matched_curve(&self) -> Option<usize> {
        self.curves
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.receiver_index - self.sender_index)
                    .abs()
                    .total_cmp(&(b.receiver_index - self.sender_index).abs())
            })
            .map(|(i, _)| i)
    }

    /// Per receiver, the first gain whose mean BER is at most `ber_limit`.
    /// Failed points never count as reaching the limit.
    pub fn critical_gains(&self, ber_limit: f64) -> Vec<CriticalGain> {
        let matched = self.matched_curve();
        self.curves
            .iter()
            .enumerate()
            .map(|(i, curve)| {
                let bers = || {
                    curve.outcomes.iter().map(|o| match o {
                        PointOutcome::Measured(m) => Some(m.ber),
                        PointOutcome::Failed { .. } => None,
                    })
                };
                let gain = bers()
                    .zip(&self.gains)
                    .find(|(ber, _)| ber.map_or(false, |b| b <= ber_limit))
                    .map(|(_, &g)| g);
                let best_ber = bers().flatten().min_by(|a, b| a.total_cmp(b));
                CriticalGain {
                    receiver_index: curve.receiver_index,
                    matched: matched == Some(i),
                    gain,
                    best_ber,
                }
            })
            .collect()
    }

    /// Render the critical-gain table for `ber_limit`.
    pub fn critical_gain_table(&self, ber_limit: f64) -> String {
        let mut out = format!(
            "  {:>7}  {:>6}  {:>9}  {:>10}  {:>8}\n  {:─>7}  {:─>6}  {:─>9}  {:─>10}  {:─>8}\n",
            "C_recv", "ΔC", "overlap", "gain_crit", "best BER", "", "", "", "", ""
        );
        for (c, curve) in self.critical_gains(ber_limit).iter().zip(&self.curves) {
            let gain = match c.gain {
                Some(g) => format!("{:.4}", g),
                None => "never".to_string(),
            };
            let best = match c.best_ber {
                Some(b) => format!("{:.4}", b),
                None => "-".to_string(),
            };
            out.push_str(&format!(
                "  {:>7.2}  {:>+6.2}  {:>9.4}  {:>10}  {:>8}{}\n",
                c.receiver_index,
                c.receiver_index - self.sender_index,
                curve.overlap.unwrap_or(f64::NAN),
                gain,
                best,
                if c.matched { "  [MATCHED]" } else { "" }
            ));
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

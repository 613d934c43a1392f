//! # coherence-telephone-sim
//!
//! Numerical mismatch sweep for topologically addressed signalling. A sender
//! and a receiver each carry a topological index; their coupling decays as a
//! Gaussian in the index difference. For each receiver index in a sweep the
//! simulator synthesizes a noisy bitstream scaled by that coupling, decodes it
//! with an adaptive-threshold detector, and scores bit-error rate and SNR.
//!
//! ## Pipeline
//!
//! ```text
//! receiver range ─► overlap(Cs, Cr, ξ) ─► synthesize ─► detect ─► score ─► SweepReport
//!                                          (bits, noise)  (window)  (BER, SNR)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use coherence_telephone_sim::prelude::*;
//!
//! let config = SweepConfig {
//!     trials_per_point: 20,
//!     ..SweepConfig::default()
//! };
//! let report = run_sweep(&config).unwrap();
//! print!("{}", report);
//! if let Some(w) = report.addressing_window(0.1) {
//!     println!("addressable for C_recv in [{:.2}, {:.2}]", w.lower, w.upper);
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod noise;
pub mod overlap;
pub mod report;
pub mod scoring;
pub mod signal;
pub mod stats;
pub mod sweep;


pub mod prelude {
    pub use crate::config::*;
    pub use crate::detector::*;
    pub use crate::error::*;
    pub use crate::noise::*;
    pub use crate::overlap::*;
    pub use crate::report::*;
    pub use crate::scoring::*;
    pub use crate::signal::*;
    pub use crate::sweep::*;
}

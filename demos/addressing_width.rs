//! Addressing window width as a function of coherence width ξ.
//!
//! A narrower ξ spreads the overlap Gaussian, so more receiver indices sit
//! above the detection threshold. Outputs CSV:
//!   xi,lower,upper,width,half_overlap_mismatch
//!
//! Run with:
//!   cargo run --example addressing_width

use coherence_telephone_sim::prelude::*;

fn main() {
    env_logger::init();

    println!("xi,lower,upper,width,half_overlap_mismatch");

    for &xi in &[0.01, 0.02, 0.03, 0.05, 0.08] {
        let config = SweepConfig {
            coherence_width: xi,
            receiver_range: ReceiverRange::new(0.0, 6.0, 0.1),
            trials_per_point: 10,
            ..SweepConfig::default()
        };

        let report = match run_sweep(&config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("ξ = {}: {}", xi, e);
                continue;
            }
        };
        let half = mismatch_for_overlap(0.5, xi).unwrap_or(f64::NAN);

        match report.addressing_window(0.1) {
            Some(w) => println!(
                "{},{:.3},{:.3},{:.3},{:.3}",
                xi,
                w.lower,
                w.upper,
                w.width(),
                half
            ),
            None => println!("{},,,,{:.3}", xi, half),
        }
    }
}

//! One trial at a chosen receiver index, block by block: truth bit, block
//! mean, adaptive threshold and decoded bit.
//!
//! Run with:
//!   cargo run --example single_trial -- 3.8

use coherence_telephone_sim::prelude::*;

fn main() {
    env_logger::init();

    let receiver: f64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3.6);
    let config = SweepConfig::default();

    let record = match run_trial(&config, receiver, config.seed) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("trial failed: {}", e);
            return;
        }
    };
    let detection = match config.detector() {
        Ok(d) => d.decode_with_thresholds(&record.waveform),
        Err(e) => {
            eprintln!("detector rejected: {}", e);
            return;
        }
    };
    let o = overlap(config.sender_index, receiver, config.coherence_width).unwrap_or(f64::NAN);

    println!(
        "C_send = {}, C_recv = {}, overlap = {:.4}",
        config.sender_index, receiver, o
    );
    println!();
    println!("  {:>3}  {:>5}  {:>10}  {:>10}  {:>7}", "bit", "truth", "block mean", "threshold", "decoded");
    println!("  {:─>3}  {:─>5}  {:─>10}  {:─>10}  {:─>7}", "", "", "", "", "");
    for i in 0..record.bits.len() {
        let mark = if record.bits[i] == record.decoded[i] { "" } else { "  ✗" };
        println!(
            "  {:>3}  {:>5}  {:>10.4}  {:>10.4}  {:>7}{}",
            i,
            record.bits[i] as u8,
            detection.block_means[i],
            detection.thresholds[i],
            record.decoded[i] as u8,
            mark
        );
    }
    println!();
    println!(
        "BER = {:.4}, SNR = {:.2} ({:.1} dB)",
        record.score.ber,
        record.score.snr,
        snr_db(record.score.snr)
    );
}

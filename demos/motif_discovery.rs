//! Motif Discovery: finding repeated patterns in time series.
//!
//! A motif is a pair of subsequences that are very similar to each other,
//! plus any further occurrences within a radius of the pair's distance.
//!
//! Run with: cargo run --release --example motif_discovery

use scrimp_rs::{find_discord, find_motif, DiscordParams, MotifParams, ScrimpConfig, ScrimpEngine};

fn main() {
    // - Pattern A (sharp pulse) appears at indices ~50, ~300 and ~520
    // - Pattern B (double bump) appears at indices ~150 and ~400
    // - Background is a slow sine wave plus a little noise
    let n = 600;
    let m = 30;

    let mut ts = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64;
        let mut val = (t * std::f64::consts::TAU / 200.0).sin() * 0.3;

        for &center in &[50.0, 300.0, 520.0] {
            let d = (t - center).abs();
            if d < 15.0 {
                val += 2.0 * (-d * d / 20.0).exp();
            }
        }

        for &center in &[150.0, 400.0] {
            let d1 = (t - (center - 5.0)).abs();
            let d2 = (t - (center + 5.0)).abs();
            if d1 < 15.0 || d2 < 15.0 {
                val += 1.5 * (-d1 * d1 / 10.0).exp() + 1.5 * (-d2 * d2 / 10.0).exp();
            }
        }

        val += ((t * 7.1).sin() * (t * 11.3).cos()) * 0.02;
        ts.push(val);
    }

    let mut config = ScrimpConfig::new(m);
    config.seed = Some(7);
    let mp = ScrimpEngine::new(config).compute(&ts).unwrap();

    let motifs = find_motif(&mp, &ts, &MotifParams::default()).unwrap();

    println!("Motif Discovery");
    println!("===============");
    println!("Time series length: {n}");
    println!("Subsequence length: {m}");
    println!("Found {} motifs:\n", motifs.len());

    for (i, motif) in motifs.motifs.iter().enumerate() {
        println!(
            "  Motif #{}: pair ({}, {}), distance = {:.6}, neighbors = {:?}",
            i + 1,
            motif.pair.0,
            motif.pair.1,
            motif.distance,
            motif.neighbors
        );
    }

    println!("\nTop discords");
    println!("============");
    for discord in find_discord(&mp, &DiscordParams { n_discords: 3 }) {
        println!(
            "  index {}: distance = {:.4}, nearest neighbor = {:?}",
            discord.index, discord.distance, discord.neighbor
        );
    }
}

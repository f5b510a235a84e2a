//! Anytime matrix profile: watch the approximation converge.
//!
//! Runs SCRIMP++ with growing sample budgets and with a wall-clock limit,
//! comparing each partial profile against the exact one.
//!
//! Run with: cargo run --release --example anytime_profile

use std::time::Duration;

use scrimp_rs::{ScrimpConfig, ScrimpEngine};

fn main() {
    let n = 5_000;
    let m = 64;
    let ts: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            (t * 0.05).sin() + 0.5 * (t * 0.013).cos() + 0.2 * ((t * 7.3).sin() * (t * 1.1).cos())
        })
        .collect();

    let mut config = ScrimpConfig::new(m);
    config.seed = Some(2024);
    let exact = ScrimpEngine::new(config.clone()).compute(&ts).unwrap();

    println!("Anytime Matrix Profile");
    println!("======================");
    println!("Time series length: {n}");
    println!("Subsequence length: {m}");
    println!("Exclusion zone:     {}\n", exact.exclusion_zone);

    println!("{:>10}  {:>12}  {:>14}", "budget", "mean error", "exact entries");
    for budget in [0, 10, 50, 200, 1_000, n] {
        let mut partial = config.clone();
        partial.sample_budget = Some(budget);
        let mp = ScrimpEngine::new(partial).compute(&ts).unwrap();

        let errors: Vec<f64> = mp
            .profile
            .iter()
            .zip(&exact.profile)
            .filter(|(a, e)| a.is_finite() && e.is_finite())
            .map(|(a, e)| a - e)
            .collect();
        let mean = errors.iter().sum::<f64>() / errors.len().max(1) as f64;
        let hits = errors.iter().filter(|e| e.abs() < 1e-6).count();
        println!("{budget:>10}  {mean:>12.6}  {hits:>14}");
    }

    let mut timed = config;
    timed.time_limit = Some(Duration::from_millis(20));
    let mp = ScrimpEngine::new(timed).compute(&ts).unwrap();
    println!(
        "\nWith a 20 ms limit: {:?} after {} of {} offsets",
        mp.completion, mp.offsets_processed, mp.offsets_total
    );
}

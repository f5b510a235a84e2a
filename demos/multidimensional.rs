//! Multidimensional motifs: which dimensions share a pattern?
//!
//! Three channels; a pattern recurs in channels 0 and 2 only. mSTOMP gives
//! the k-dimensional profiles and the bit-cost search picks the subspace.
//!
//! Run with: cargo run --release --example multidimensional

use scrimp_rs::{find_multi_motif, mstomp, MultiMotifParams};

fn main() {
    let n = 400;
    let m = 24;

    let mut dims: Vec<Vec<f64>> = (0..3)
        .map(|d| {
            (0..n)
                .map(|i| {
                    let t = i as f64;
                    ((t * (1.3 + d as f64)).sin() * (t * 0.71).cos()) * 0.8
                })
                .collect()
        })
        .collect();

    let pattern: Vec<f64> = (0..m)
        .map(|i| 3.0 * (i as f64 * std::f64::consts::TAU / m as f64).sin())
        .collect();
    for dim in [0, 2] {
        for start in [60, 280] {
            dims[dim][start..start + m].copy_from_slice(&pattern);
        }
    }

    let series: Vec<&[f64]> = dims.iter().map(Vec::as_slice).collect();
    let mmp = mstomp(&series, m, 0.5).unwrap();
    let set = find_multi_motif(&mmp, &series, &MultiMotifParams::default()).unwrap();

    println!("Multidimensional Motifs");
    println!("=======================");
    println!("Dimensions: {}, length: {n}, subsequence length: {m}", series.len());
    println!("Uncompressed pair cost: {:.1} bits\n", set.base_bit_cost);

    for (i, motif) in set.motifs.iter().enumerate() {
        println!(
            "  Motif #{}: pair ({}, {}), dimensions {:?}, distance = {:.4}, cost = {:.1} bits",
            i + 1,
            motif.pair.0,
            motif.pair.1,
            motif.dimensions,
            motif.distance,
            motif.bit_cost
        );
    }
}

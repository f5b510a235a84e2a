use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrimp_rs::{
    CancellationToken, Completion, Error, MatrixProfile, ProfileKind, ScrimpConfig, ScrimpEngine,
};

const EPSILON: f64 = 1e-6;

fn noisy_sine(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| (i as f64 * 0.1).sin() + 0.3 * rng.gen_range(-1.0..1.0))
        .collect()
}

fn z_norm(s: &[f64]) -> Option<Vec<f64>> {
    let n = s.len() as f64;
    let mu = s.iter().sum::<f64>() / n;
    let sd = (s.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n).sqrt();
    if sd < scrimp_rs::EPS {
        return None;
    }
    Some(s.iter().map(|x| (x - mu) / sd).collect())
}

/// O(n^2 w) reference profile from explicitly z-normalized windows.
fn brute_force_profile(ts: &[f64], w: usize, ez: usize) -> Vec<f64> {
    let windows: Vec<Option<Vec<f64>>> =
        (0..=ts.len() - w).map(|i| z_norm(&ts[i..i + w])).collect();
    (0..windows.len())
        .map(|i| {
            let Some(a) = &windows[i] else {
                return f64::INFINITY;
            };
            windows
                .iter()
                .enumerate()
                .filter(|(j, _)| i.abs_diff(*j) > ez)
                .filter_map(|(_, b)| b.as_ref())
                .map(|b| a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt())
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

fn assert_profile_match(name: &str, actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len(), "{name}: profile length mismatch");

    let mut max_diff = 0.0_f64;
    let mut max_diff_idx = 0;
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a.is_infinite() && e.is_infinite() {
            continue;
        }
        let diff = (a - e).abs();
        if diff > max_diff || diff.is_nan() {
            max_diff = diff;
            max_diff_idx = i;
        }
    }

    assert!(
        max_diff < epsilon,
        "{name}: max diff = {max_diff:.2e} at index {max_diff_idx} \
         (actual={}, expected={}), epsilon={epsilon:.0e}",
        actual[max_diff_idx],
        expected[max_diff_idx],
    );
}

fn config(w: usize, pre_scrimp: f64, seed: u64) -> ScrimpConfig {
    let mut config = ScrimpConfig::new(w);
    config.pre_scrimp = pre_scrimp;
    config.seed = Some(seed);
    config
}

fn assert_exclusion_invariant(mp: &MatrixProfile) {
    for (i, idx) in mp.profile_index.iter().enumerate() {
        if let Some(j) = idx {
            assert!(
                i.abs_diff(*j) > mp.exclusion_zone,
                "neighbor {j} of {i} inside exclusion zone {}",
                mp.exclusion_zone
            );
        }
    }
}

#[test]
fn test_full_budget_matches_brute_force() {
    for (n, w, pre) in [(150, 8, 0.0), (300, 24, 0.25), (257, 13, 0.5)] {
        let ts = noisy_sine(n, n as u64);
        let cfg = config(w, pre, 3);
        let mp = ScrimpEngine::new(cfg.clone()).compute(&ts).unwrap();
        let expected = brute_force_profile(&ts, w, cfg.exclusion_zone_radius());
        assert_eq!(mp.completion, Completion::Exhausted);
        assert_profile_match(&format!("n={n} w={w} pre={pre}"), &mp.profile, &expected, EPSILON);
    }
}

#[test]
fn test_fixed_seed_is_idempotent() {
    let ts = noisy_sine(400, 9);
    let mut cfg = config(20, 0.25, 77);
    cfg.sample_budget = Some(50);
    let engine = ScrimpEngine::new(cfg);
    let a = engine.compute(&ts).unwrap();
    let b = engine.compute(&ts).unwrap();
    assert_eq!(a.profile, b.profile);
    assert_eq!(a.profile_index, b.profile_index);
}

#[test]
fn test_larger_budget_never_increases_profile() {
    let ts = noisy_sine(400, 4);
    let profiles: Vec<Vec<f64>> = [5, 25, 100, 400]
        .into_iter()
        .map(|budget| {
            let mut cfg = config(20, 0.0, 5);
            cfg.sample_budget = Some(budget);
            ScrimpEngine::new(cfg).compute(&ts).unwrap().profile
        })
        .collect();
    for pair in profiles.windows(2) {
        for (i, (small, large)) in pair[0].iter().zip(&pair[1]).enumerate() {
            assert!(large <= small, "profile grew at {i}: {small} -> {large}");
        }
    }
}

#[test]
fn test_exclusion_invariant_for_partial_runs() {
    let ts = noisy_sine(300, 12);
    for budget in [1, 10, 1000] {
        let mut cfg = config(16, 0.25, budget as u64);
        cfg.sample_budget = Some(budget);
        let mp = ScrimpEngine::new(cfg).compute(&ts).unwrap();
        assert_exclusion_invariant(&mp);
        assert!(mp.profile.iter().all(|&d| d >= 0.0));
        let left = mp.left.as_ref().unwrap();
        let right = mp.right.as_ref().unwrap();
        for i in 0..mp.len() {
            assert!(left.profile_index[i].map_or(true, |j| j + mp.exclusion_zone < i));
            assert!(right.profile_index[i].map_or(true, |j| j > i + mp.exclusion_zone));
        }
    }
}

#[test]
fn test_repeated_subsequence_round_trip() {
    let w = 25;
    let (p, q) = (60, 210);
    let mut ts = noisy_sine(320, 21);
    let pattern: Vec<f64> = ts[p..p + w].to_vec();
    ts[q..q + w].copy_from_slice(&pattern);

    let mp = ScrimpEngine::new(config(w, 0.25, 8)).compute(&ts).unwrap();
    assert!(mp.profile[p] < 1e-5, "profile[p] = {}", mp.profile[p]);
    assert!(mp.profile[q] < 1e-5, "profile[q] = {}", mp.profile[q]);
    assert_eq!(mp.profile_index[p], Some(q));
    assert_eq!(mp.profile_index[q], Some(p));
}

#[test]
fn test_two_bumps_are_mutual_neighbors() {
    let n = 200;
    let w = 30;
    let (p, q) = (40, 130);
    let mut ts = vec![1.0; n];
    for t in 0..w {
        let bump = (std::f64::consts::PI * t as f64 / w as f64).sin();
        ts[p + t] += bump;
        ts[q + t] += bump;
    }

    let mp = ScrimpEngine::new(config(w, 0.0, 1)).compute(&ts).unwrap();
    assert_eq!(mp.completion, Completion::Exhausted);
    assert!(mp.profile[p] < 1e-3 && mp.profile[q] < 1e-3);
    assert_eq!(mp.profile_index[p], Some(q));
    assert_eq!(mp.profile_index[q], Some(p));

    let params = scrimp_rs::MotifParams {
        n_motifs: 1,
        ..Default::default()
    };
    let motifs = scrimp_rs::find_motif(&mp, &ts, &params).unwrap();
    assert_eq!(motifs.len(), 1);
    // Every window overlapping a bump matches its shifted twin exactly,
    // so the reported pair is one of those twins.
    let (a, b) = motifs.motifs[0].pair;
    assert_eq!(b - a, q - p);
    assert!(a + w > p && a < p + w);
}

#[test]
fn test_bumps_on_noisy_background_report_their_starts() {
    let n = 200;
    let w = 30;
    let (p, q) = (40, 130);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut ts: Vec<f64> = (0..n).map(|_| 1.0 + 0.2 * rng.gen_range(-1.0..1.0)).collect();
    for t in 0..w {
        let bump = 1.0 + (std::f64::consts::PI * t as f64 / w as f64).sin();
        ts[p + t] = bump;
        ts[q + t] = bump;
    }

    let mp = ScrimpEngine::new(config(w, 0.0, 1)).compute(&ts).unwrap();
    assert_eq!(mp.profile_index[p], Some(q));
    assert_eq!(mp.profile_index[q], Some(p));

    let params = scrimp_rs::MotifParams {
        n_motifs: 1,
        ..Default::default()
    };
    let motifs = scrimp_rs::find_motif(&mp, &ts, &params).unwrap();
    assert_eq!(motifs.motifs[0].pair, (p, q));
    assert!(motifs.motifs[0].distance < 1e-5);
}

#[test]
fn test_nan_run_is_isolated() {
    let w = 16;
    let mut ts = noisy_sine(300, 30);
    for x in &mut ts[120..140] {
        *x = f64::NAN;
    }

    let mp = ScrimpEngine::new(config(w, 0.25, 2)).compute(&ts).unwrap();
    let touched = (120 + 1 - w)..140;
    for i in touched.clone() {
        assert!(mp.profile[i].is_infinite(), "profile[{i}] = {}", mp.profile[i]);
        assert_eq!(mp.profile_index[i], None);
    }
    for (i, idx) in mp.profile_index.iter().enumerate() {
        if let Some(j) = idx {
            assert!(!touched.contains(j), "{i} points into the invalid run at {j}");
        }
    }
    assert!(mp.profile[..touched.start].iter().all(|d| d.is_finite()));
}

#[test]
fn test_cancelled_and_timed_out_runs_return_partial_profiles() {
    let ts = noisy_sine(300, 40);
    let engine = ScrimpEngine::new(config(16, 0.25, 6));

    let token = CancellationToken::new();
    token.cancel();
    let mp = engine.compute_with(&ts, &token).unwrap();
    assert_eq!(mp.completion, Completion::Cancelled);
    assert!(!mp.is_complete());
    assert_eq!(mp.len(), 285);

    let mut cfg = config(16, 0.0, 6);
    cfg.time_limit = Some(Duration::ZERO);
    let mp = ScrimpEngine::new(cfg).compute(&ts).unwrap();
    assert_eq!(mp.completion, Completion::TimedOut);
    assert_eq!(mp.offsets_processed, 0);
    assert!(mp.offsets_total > 0);
}

#[test]
fn test_cancel_from_another_thread() {
    let ts = noisy_sine(3000, 50);
    let engine = ScrimpEngine::new(config(32, 0.25, 7));
    let token = CancellationToken::new();
    let handle = token.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(5));
        handle.cancel();
    });

    let mp = engine.compute_with(&ts, &token).unwrap();
    canceller.join().unwrap();
    // Either outcome is valid; the profile must be consistent in both
    assert!(matches!(
        mp.completion,
        Completion::Cancelled | Completion::Exhausted
    ));
    assert!(mp.offsets_processed <= mp.offsets_total);
    assert_exclusion_invariant(&mp);
}

#[test]
fn test_join_profile() {
    let reference = noisy_sine(400, 60);
    let query = reference[100..220].to_vec();
    let mp = ScrimpEngine::new(ScrimpConfig::new(20)).join(&reference, &query).unwrap();
    assert_eq!(mp.kind, ProfileKind::Join);
    assert_eq!(mp.exclusion_zone, 0);
    assert!(mp.left.is_none());
    assert_eq!(mp.profile_index[0], Some(100));
    assert!(mp.profile.iter().all(|&d| d < 1e-5));
}

#[test]
fn test_boundary_errors() {
    let engine = ScrimpEngine::new(ScrimpConfig::new(20));
    assert!(matches!(engine.compute(&[]), Err(Error::InputShape(_))));
    assert!(matches!(engine.compute(&noisy_sine(39, 1)), Err(Error::Parameter(_))));
    assert!(matches!(
        engine.join(&noisy_sine(50, 1), &noisy_sine(60, 1)),
        Err(Error::InputShape(_))
    ));
    assert!(matches!(
        ScrimpEngine::new(ScrimpConfig::new(3)).compute(&noisy_sine(100, 1)),
        Err(Error::Parameter(_))
    ));
}

#[cfg(feature = "serde")]
#[test]
fn test_config_from_json_uses_defaults() {
    let cfg: ScrimpConfig = serde_json::from_str(r#"{"window_size": 32, "seed": 5}"#).unwrap();
    assert_eq!(cfg.window_size, 32);
    assert_eq!(cfg.seed, Some(5));
    assert!((cfg.exclusion_zone - 0.5).abs() < 1e-12);
    assert!((cfg.pre_scrimp - 0.25).abs() < 1e-12);
    assert_eq!(cfg.sample_budget, None);
}

use tracing::{debug, instrument};

use crate::algorithms::common::{
    apply_exclusion_zone, argmax_finite, argmin_finite, mark_zone, next_pair,
};
use crate::algorithms::mass::MassKernel;
use crate::core::error::{validate_ratio, Error, Result};
use crate::core::matrix_profile::{exclusion_zone_radius, MatrixProfile, ProfileKind, EPS};
use crate::core::series::CleanSeries;

/// Parameters for motif extraction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotifParams {
    /// Maximum number of motifs to report.
    pub n_motifs: usize,
    /// Maximum number of neighbors per motif.
    pub n_neighbors: usize,
    /// Neighbors must lie within `radius * motif distance` of the first member.
    pub radius: f64,
    /// Exclusion zone ratio override. `None` uses the profile's own zone.
    pub exclusion_zone: Option<f64>,
}

impl Default for MotifParams {
    fn default() -> Self {
        Self {
            n_motifs: 3,
            n_neighbors: 10,
            radius: 3.0,
            exclusion_zone: None,
        }
    }
}

/// A discovered motif (recurring pattern).
///
/// The pair is sorted ascending; `neighbors` are further occurrences within
/// the radius, in ascending distance from `pair.0`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Motif {
    pub pair: (usize, usize),
    /// Distance between the two members of the pair.
    pub distance: f64,
    pub neighbors: Vec<usize>,
}

/// Motifs extracted from one matrix profile.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotifSet {
    pub window_size: usize,
    /// Exclusion zone radius used for suppression.
    pub exclusion_zone: usize,
    /// At most `n_motifs` motifs, best first. Fewer when the profile runs out.
    pub motifs: Vec<Motif>,
}

impl MotifSet {
    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }
}

/// Parameters for discord extraction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiscordParams {
    pub n_discords: usize,
}

impl Default for DiscordParams {
    fn default() -> Self {
        Self { n_discords: 1 }
    }
}

/// A discovered discord (anomaly).
///
/// A discord is a subsequence whose nearest neighbor is unusually far away,
/// indicating it is unlike any other pattern in the time series.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Discord {
    /// Index of the anomalous subsequence.
    pub index: usize,
    /// Distance to its nearest neighbor (high = anomalous).
    pub distance: f64,
    pub neighbor: Option<usize>,
}

/// Extract motifs from a (possibly partial) self-join matrix profile.
///
/// Greedy extraction on a private copy of the profile:
/// 1. take the smallest remaining distance and its recorded neighbor as the
///    motif pair `(a, b)`;
/// 2. compute the exact distance profile of `a`, discard everything farther
///    than `radius * distance` or inside the zones of `a` and `b`; the
///    threshold never drops below `sqrt(2 * w * EPS)`, so copies of an exact
///    repeat are still reported;
/// 3. pop up to `n_neighbors` closest positions, each one suppressing the
///    candidates within its own exclusion zone;
/// 4. suppress the zones around the pair and every neighbor so that no later
///    motif touches them.
///
/// Stops after `n_motifs` motifs or when no finite distance remains; a short
/// result is not an error.
///
/// # Errors
/// `InputShape` if `mp` is not a self-join or does not match `series`;
/// `Parameter` if `radius` or the exclusion zone override is invalid.
#[instrument(skip_all, fields(n = series.len(), w = mp.window_size, n_motifs = params.n_motifs))]
pub fn find_motif(mp: &MatrixProfile, series: &[f64], params: &MotifParams) -> Result<MotifSet> {
    if mp.kind != ProfileKind::SelfJoin {
        return Err(Error::InputShape(
            "motif extraction needs a self-join profile".into(),
        ));
    }
    let w = mp.window_size;
    if w == 0 || series.len() < w || series.len() - w + 1 != mp.len() {
        return Err(Error::InputShape(format!(
            "profile of length {} does not match a series of length {} with window {w}",
            mp.len(),
            series.len()
        )));
    }
    validate_ratio("radius", params.radius)?;
    let exclusion_zone = match params.exclusion_zone {
        Some(ratio) => {
            validate_ratio("exclusion_zone", ratio)?;
            exclusion_zone_radius(w, ratio)
        }
        None => mp.exclusion_zone,
    };

    let clean = CleanSeries::new(series, w);
    let kernel = MassKernel::new(&clean.values, w, EPS)?;

    // Exact repeats have a profile distance clamped to zero while their fresh
    // distances carry rounding noise; anything below this counts as a tie.
    let tie_distance = (2.0 * w as f64 * EPS).sqrt();

    let mut working = mp.profile.clone();
    let mut suppressed = vec![false; mp.len()];
    let mut motifs = Vec::with_capacity(params.n_motifs);

    while motifs.len() < params.n_motifs {
        let Some((idx, nn, distance)) = next_pair(&mut working, &mp.profile_index, &suppressed)
        else {
            break;
        };
        let (a, b) = (idx.min(nn), idx.max(nn));

        let mut candidates = kernel.distance_profile(a)?.distances;
        let threshold = (params.radius * distance).max(tie_distance);
        for (j, d) in candidates.iter_mut().enumerate() {
            if *d > threshold || suppressed[j] || clean.skip[j] {
                *d = f64::INFINITY;
            }
        }
        apply_exclusion_zone(&mut candidates, a, exclusion_zone);
        apply_exclusion_zone(&mut candidates, b, exclusion_zone);

        let mut neighbors = Vec::new();
        while neighbors.len() < params.n_neighbors {
            let Some((j, _)) = argmin_finite(&candidates) else {
                break;
            };
            neighbors.push(j);
            apply_exclusion_zone(&mut candidates, j, exclusion_zone);
        }

        for &pos in [a, b].iter().chain(&neighbors) {
            apply_exclusion_zone(&mut working, pos, exclusion_zone);
            mark_zone(&mut suppressed, pos, exclusion_zone);
        }

        debug!(a, b, distance, neighbors = neighbors.len(), "motif found");
        motifs.push(Motif {
            pair: (a, b),
            distance,
            neighbors,
        });
    }

    if motifs.len() < params.n_motifs {
        debug!(found = motifs.len(), "profile exhausted before n_motifs");
    }

    Ok(MotifSet {
        window_size: w,
        exclusion_zone,
        motifs,
    })
}

/// Find the top discords (most anomalous subsequences) in a matrix profile.
///
/// Greedy: take the largest finite distance, record it, exclude its zone,
/// repeat. Returns fewer than requested when the profile runs out.
pub fn find_discord(mp: &MatrixProfile, params: &DiscordParams) -> Vec<Discord> {
    let mut profile = mp.profile.clone();
    let mut discords = Vec::with_capacity(params.n_discords);

    while discords.len() < params.n_discords {
        let Some((index, distance)) = argmax_finite(&profile) else {
            break;
        };
        discords.push(Discord {
            index,
            distance,
            neighbor: mp.profile_index[index],
        });
        apply_exclusion_zone(&mut profile, index, mp.exclusion_zone);
    }

    discords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::scrimp::scrimp;
    use crate::core::cancel::{CancellationToken, Completion};
    use crate::core::matrix_profile::ScrimpConfig;
    use crate::core::profile_state::ProfileState;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    fn profile_of(ts: &[f64], w: usize) -> MatrixProfile {
        let mut config = ScrimpConfig::new(w);
        config.seed = Some(11);
        scrimp(ts, &config, &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_find_motif_recovers_planted_pair() {
        let w = 16;
        let mut ts = noise(300, 1);
        let pattern: Vec<f64> = (0..w).map(|i| 4.0 * (i as f64 * 0.5).sin()).collect();
        ts[40..40 + w].copy_from_slice(&pattern);
        ts[200..200 + w].copy_from_slice(&pattern);

        let mp = profile_of(&ts, w);
        let params = MotifParams {
            n_motifs: 1,
            ..MotifParams::default()
        };
        let set = find_motif(&mp, &ts, &params).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.motifs[0].pair, (40, 200));
        assert!(set.motifs[0].distance < 1e-5);
    }

    #[test]
    fn test_neighbors_found_within_radius() {
        let w = 16;
        let mut ts = noise(400, 2);
        let pattern: Vec<f64> = (0..w).map(|i| 4.0 * (i as f64 * 0.5).sin()).collect();
        for (k, start) in [30, 140, 250, 350].into_iter().enumerate() {
            for (j, &p) in pattern.iter().enumerate() {
                ts[start + j] = p + 0.01 * ((j * (k + 3)) as f64 * 1.3).sin();
            }
        }

        let mp = profile_of(&ts, w);
        let set = find_motif(&mp, &ts, &MotifParams::default()).unwrap();
        let top = &set.motifs[0];
        let mut members: Vec<usize> = vec![top.pair.0, top.pair.1];
        members.extend(&top.neighbors);
        members.sort_unstable();
        assert_eq!(members, vec![30, 140, 250, 350]);
    }

    #[test]
    fn test_exact_copies_are_neighbors() {
        let w = 20;
        let mut ts = noise(560, 99);
        let chirp: Vec<f64> = (0..w)
            .map(|i| 3.0 * ((i * i) as f64 * 0.05).sin())
            .collect();
        for start in [50, 300, 480] {
            ts[start..start + w].copy_from_slice(&chirp);
        }

        let mp = profile_of(&ts, w);
        let set = find_motif(&mp, &ts, &MotifParams::default()).unwrap();
        let top = &set.motifs[0];
        assert!(top.distance < 1e-5, "distance {}", top.distance);
        let mut members: Vec<usize> = vec![top.pair.0, top.pair.1];
        members.extend(&top.neighbors);
        members.sort_unstable();
        assert_eq!(members, vec![50, 300, 480]);
    }

    #[test]
    fn test_motif_groups_do_not_overlap() {
        let ts: Vec<f64> = (0..400)
            .map(|i| (i as f64 * 0.13).sin() + 0.3 * (i as f64 * 0.71).sin())
            .collect();
        let mp = profile_of(&ts, 20);
        let params = MotifParams {
            n_motifs: 5,
            n_neighbors: 4,
            ..MotifParams::default()
        };
        let set = find_motif(&mp, &ts, &params).unwrap();
        let ez = set.exclusion_zone;

        let groups: Vec<Vec<usize>> = set
            .motifs
            .iter()
            .map(|m| {
                let mut g = vec![m.pair.0, m.pair.1];
                g.extend(&m.neighbors);
                g
            })
            .collect();
        for (gi, g) in groups.iter().enumerate() {
            for h in &groups[gi + 1..] {
                for &x in g {
                    for &y in h {
                        assert!(x.abs_diff(y) > ez, "{x} and {y} overlap (ez {ez})");
                    }
                }
            }
        }
        for pair in set.motifs.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_exhausted_profile_truncates_result() {
        let mut state = ProfileState::new(vec![false; 20], true);
        state.update(2, 0.5, 15);
        state.update(15, 0.5, 2);
        let mp = state.finalize(ProfileKind::SelfJoin, 8, 0.5, 4, Completion::Exhausted, 1, 1);
        let ts: Vec<f64> = (0..27).map(|i| (i as f64 * 0.9).sin()).collect();

        let set = find_motif(&mp, &ts, &MotifParams::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.motifs[0].pair, (2, 15));

        let empty = ProfileState::new(vec![false; 20], true).finalize(
            ProfileKind::SelfJoin,
            8,
            0.5,
            4,
            Completion::Cancelled,
            0,
            10,
        );
        assert!(find_motif(&empty, &ts, &MotifParams::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_motif_validates_inputs() {
        let ts: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        let mp = profile_of(&ts, 10);
        assert!(matches!(
            find_motif(&mp, &ts[..90], &MotifParams::default()),
            Err(Error::InputShape(_))
        ));
        let params = MotifParams {
            radius: -1.0,
            ..MotifParams::default()
        };
        assert!(matches!(find_motif(&mp, &ts, &params), Err(Error::Parameter(_))));
    }

    #[test]
    fn test_find_discord_spike() {
        let mut ts: Vec<f64> = (0..200).map(|i| (i as f64 * 0.2).sin()).collect();
        ts[100] = 6.0;
        let mp = profile_of(&ts, 12);
        let discords = find_discord(&mp, &DiscordParams { n_discords: 3 });
        assert_eq!(discords.len(), 3);
        assert!((89..=100).contains(&discords[0].index), "got {}", discords[0].index);
        assert!(discords[0].neighbor.is_some());
        for pair in discords.windows(2) {
            assert!(pair[0].distance >= pair[1].distance);
            assert!(pair[0].index.abs_diff(pair[1].index) > mp.exclusion_zone);
        }
    }
}

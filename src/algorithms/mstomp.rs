use tracing::{debug, instrument};

use crate::algorithms::mass::MassKernel;
use crate::core::error::{validate_ratio, validate_window, Error, Result};
use crate::core::matrix_profile::{exclusion_zone_radius, EPS};
use crate::core::series::CleanSeries;

/// Multidimensional matrix profile.
///
/// `profile[k][i]` is the smallest average of the `k + 1` best per-dimension
/// distances between window `i` and any window outside its exclusion zone;
/// `profile_index[k][i]` is the window achieving it. For a fixed `i` the
/// rows are non-decreasing in `k`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiMatrixProfile {
    pub profile: Vec<Vec<f64>>,
    pub profile_index: Vec<Vec<Option<usize>>>,
    pub n_dims: usize,
    pub window_size: usize,
    pub exclusion_zone_ratio: f64,
    pub exclusion_zone: usize,
}

impl MultiMatrixProfile {
    /// Number of subsequence positions.
    pub fn n_subs(&self) -> usize {
        self.profile.first().map_or(0, Vec::len)
    }
}

/// Best `(k+1)`-dimensional averages for one query window.
type RowResult = (Vec<f64>, Vec<Option<usize>>);

/// Compute the multidimensional matrix profile (mSTOMP).
///
/// Every dimension gets its own MASS kernel. For each window `i`, the
/// per-dimension distance profiles are combined position by position: the
/// `d` distances are sorted ascending and their running averages update
/// rows `0..d`. A window that holds an invalid sample in any dimension is
/// skipped as a whole.
///
/// # Errors
/// `InputShape` if there are no dimensions or their lengths differ;
/// `Parameter` for an invalid window size or exclusion zone ratio.
#[instrument(skip_all, fields(n_dims = series.len(), w = window_size))]
pub fn mstomp(
    series: &[&[f64]],
    window_size: usize,
    exclusion_zone_ratio: f64,
) -> Result<MultiMatrixProfile> {
    let Some(first) = series.first() else {
        return Err(Error::InputShape("no dimensions given".into()));
    };
    let n = first.len();
    if let Some((dim, other)) = series.iter().enumerate().find(|(_, s)| s.len() != n) {
        return Err(Error::InputShape(format!(
            "dimension {dim} has length {}, expected {n}",
            other.len()
        )));
    }
    validate_window(window_size, n)?;
    validate_ratio("exclusion_zone", exclusion_zone_ratio)?;

    let d = series.len();
    let exclusion_zone = exclusion_zone_radius(window_size, exclusion_zone_ratio);
    let clean: Vec<CleanSeries> = series
        .iter()
        .map(|s| CleanSeries::new(s, window_size))
        .collect();
    let n_subs = n - window_size + 1;
    let skip: Vec<bool> = (0..n_subs)
        .map(|i| clean.iter().any(|c| c.skip[i]))
        .collect();
    let kernels = clean
        .iter()
        .map(|c| MassKernel::new(&c.values, window_size, EPS))
        .collect::<Result<Vec<_>>>()?;

    let rows = MultiRows {
        kernels: &kernels,
        skip: &skip,
        exclusion_zone,
    };
    let results = rows.evaluate(n_subs)?;

    let mut profile = vec![vec![f64::INFINITY; n_subs]; d];
    let mut profile_index = vec![vec![None; n_subs]; d];
    for (i, (dists, idx)) in results.into_iter().enumerate() {
        for k in 0..d {
            profile[k][i] = dists[k];
            profile_index[k][i] = idx[k];
        }
    }
    debug!(n_subs, exclusion_zone, "mstomp finished");

    Ok(MultiMatrixProfile {
        profile,
        profile_index,
        n_dims: d,
        window_size,
        exclusion_zone_ratio,
        exclusion_zone,
    })
}

struct MultiRows<'k, 'a> {
    kernels: &'k [MassKernel<'a>],
    skip: &'k [bool],
    exclusion_zone: usize,
}

impl MultiRows<'_, '_> {
    fn row(&self, i: usize) -> Result<RowResult> {
        let d = self.kernels.len();
        let mut best = vec![f64::INFINITY; d];
        let mut best_idx = vec![None; d];
        if self.skip[i] {
            return Ok((best, best_idx));
        }

        let profiles = self
            .kernels
            .iter()
            .map(|k| k.distance_profile(i).map(|p| p.distances))
            .collect::<Result<Vec<_>>>()?;

        let mut dists = vec![0.0; d];
        for j in 0..self.skip.len() {
            if self.skip[j] || i.abs_diff(j) <= self.exclusion_zone {
                continue;
            }
            for (slot, p) in dists.iter_mut().zip(&profiles) {
                *slot = p[j];
            }
            dists.sort_by(f64::total_cmp);

            let mut cum_sum = 0.0;
            for k in 0..d {
                cum_sum += dists[k];
                let avg = cum_sum / (k + 1) as f64;
                if avg < best[k] {
                    best[k] = avg;
                    best_idx[k] = Some(j);
                }
            }
        }
        Ok((best, best_idx))
    }

    #[cfg(feature = "parallel")]
    fn evaluate(&self, n_subs: usize) -> Result<Vec<RowResult>> {
        use rayon::prelude::*;

        (0..n_subs).into_par_iter().map(|i| self.row(i)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate(&self, n_subs: usize) -> Result<Vec<RowResult>> {
        (0..n_subs).map(|i| self.row(i)).collect()
    }
}

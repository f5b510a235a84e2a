use std::time::Duration;

use crate::core::cancel::Completion;

/// Threshold below which a standard deviation is treated as zero.
///
/// Windows whose standard deviation falls below this value are degenerate:
/// every distance touching them is `+inf`.
pub const EPS: f64 = 1.490_116_119_384_765_6e-8; // sqrt(f64::EPSILON)

/// Exclusion zone radius for a window size and ratio: `round(w * ratio + EPS)`.
pub fn exclusion_zone_radius(window_size: usize, ratio: f64) -> usize {
    (window_size as f64 * ratio + EPS).round() as usize
}

/// Configuration for anytime matrix profile computation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrimpConfig {
    /// Subsequence length (`w`). Must be at least 4 and at most half the series.
    pub window_size: usize,
    /// Exclusion zone as a fraction of the window size.
    #[cfg_attr(feature = "serde", serde(default = "defaults::exclusion_zone"))]
    pub exclusion_zone: f64,
    /// PRE-SCRIMP anchor stride as a fraction of the window size. Zero disables seeding.
    #[cfg_attr(feature = "serde", serde(default = "defaults::pre_scrimp"))]
    pub pre_scrimp: f64,
    /// Maximum number of diagonal offsets to evaluate. `None` evaluates all of them.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sample_budget: Option<usize>,
    /// Seed for the offset permutation. `None` draws one from the OS.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u64>,
    /// Wall-clock limit after which the anytime loop stops.
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_limit: Option<Duration>,
}

#[cfg(feature = "serde")]
mod defaults {
    pub fn exclusion_zone() -> f64 {
        0.5
    }

    pub fn pre_scrimp() -> f64 {
        0.25
    }
}

impl ScrimpConfig {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            exclusion_zone: 0.5,
            pre_scrimp: 0.25,
            sample_budget: None,
            seed: None,
            time_limit: None,
        }
    }

    /// Compute the exclusion zone radius.
    pub fn exclusion_zone_radius(&self) -> usize {
        exclusion_zone_radius(self.window_size, self.exclusion_zone)
    }

    /// PRE-SCRIMP anchor stride, or `None` when seeding is disabled.
    pub fn pre_scrimp_step(&self) -> Option<usize> {
        if self.pre_scrimp <= 0.0 {
            return None;
        }
        let step = (self.window_size as f64 * self.pre_scrimp + EPS).floor() as usize;
        Some(step.max(1))
    }
}

/// Which kind of similarity the profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileKind {
    /// A series compared against itself; left/right profiles are present.
    SelfJoin,
    /// Query windows compared against a reference series; exclusion zone is 0.
    Join,
}

/// Nearest neighbors restricted to one side (`j < i` or `j > i`).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionalProfile {
    pub profile: Vec<f64>,
    pub profile_index: Vec<Option<usize>>,
}

/// The matrix profile result.
///
/// Entries whose window contained invalid samples, or that never met a valid
/// neighbor, hold `+inf` with an unset (`None`) index.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixProfile {
    pub kind: ProfileKind,
    /// Nearest-neighbor distances for each subsequence.
    pub profile: Vec<f64>,
    /// Index of the nearest neighbor for each subsequence.
    pub profile_index: Vec<Option<usize>>,
    /// Left nearest neighbors (self-join only).
    pub left: Option<DirectionalProfile>,
    /// Right nearest neighbors (self-join only).
    pub right: Option<DirectionalProfile>,
    /// Subsequence length used.
    pub window_size: usize,
    /// Exclusion zone ratio the profile was computed with.
    pub exclusion_zone_ratio: f64,
    /// Exclusion zone radius used.
    pub exclusion_zone: usize,
    /// How the anytime loop ended.
    pub completion: Completion,
    /// Diagonal offsets (or query rows, for joins) fully applied.
    pub offsets_processed: usize,
    /// Offsets that would have been applied without interruption.
    pub offsets_total: usize,
}

impl MatrixProfile {
    /// Number of subsequence positions.
    pub fn len(&self) -> usize {
        self.profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }

    /// Whether the loop ran to the end of its offset list.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.completion,
            Completion::Exhausted | Completion::BudgetReached
        )
    }
}

/// Rolling mean and standard deviation for all subsequences of length `w`.
///
/// Computed via a single-pass sliding window over cumulative sums and
/// sums-of-squares. Population statistics.
#[derive(Debug, Clone)]
pub struct RollingStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub window_size: usize,
}

impl RollingStats {
    /// Compute rolling statistics for subsequences of length `window_size`.
    ///
    /// Caller guarantees `ts.len() >= window_size > 0`.
    pub fn compute(ts: &[f64], window_size: usize) -> Self {
        debug_assert!(window_size > 0 && ts.len() >= window_size);
        let n = ts.len();
        let n_subs = n - window_size + 1;

        let mut cumsum = vec![0.0; n + 1];
        let mut cumsum_sq = vec![0.0; n + 1];
        for i in 0..n {
            cumsum[i + 1] = cumsum[i] + ts[i];
            cumsum_sq[i + 1] = cumsum_sq[i] + ts[i] * ts[i];
        }

        let w = window_size as f64;
        let mut mean = Vec::with_capacity(n_subs);
        let mut std = Vec::with_capacity(n_subs);
        for i in 0..n_subs {
            let mu = (cumsum[i + window_size] - cumsum[i]) / w;
            // E[X^2] - E[X]^2, clamped for round-off
            let var = ((cumsum_sq[i + window_size] - cumsum_sq[i]) / w - mu * mu).max(0.0);
            mean.push(mu);
            std.push(var.sqrt());
        }

        Self {
            mean,
            std,
            window_size,
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    #[inline]
    pub fn is_degenerate(&self, i: usize, eps: f64) -> bool {
        self.std[i] < eps
    }

    /// Distance between windows `i` and `j` of this series given their dot product.
    #[inline]
    pub fn distance(&self, dot: f64, i: usize, j: usize, eps: f64) -> f64 {
        dot_to_distance(
            dot,
            self.window_size,
            self.mean[i],
            self.std[i],
            self.mean[j],
            self.std[j],
            eps,
        )
    }
}

/// Convert a dot product between two windows into a z-normalized distance.
///
/// `d^2 = 2w * (1 - (dot - w*mu_a*mu_b) / (w*sd_a*sd_b))`, clamped at zero.
/// Degenerate windows and non-finite round-off map to `+inf`.
#[inline]
pub fn dot_to_distance(
    dot: f64,
    window_size: usize,
    mean_a: f64,
    std_a: f64,
    mean_b: f64,
    std_b: f64,
    eps: f64,
) -> f64 {
    if std_a < eps || std_b < eps {
        return f64::INFINITY;
    }
    let w = window_size as f64;
    let corr = (dot - w * mean_a * mean_b) / (w * std_a * std_b);
    let d2 = 2.0 * w * (1.0 - corr);
    if !d2.is_finite() {
        return f64::INFINITY;
    }
    d2.max(0.0).sqrt()
}

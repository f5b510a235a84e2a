use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::algorithms::common::window_dot;
use crate::algorithms::mass::MassKernel;
use crate::algorithms::prescrimp::PreScrimpSeeder;
use crate::core::cancel::{CancellationToken, Completion, StopCheck};
use crate::core::error::{validate_ratio, validate_window, Result};
use crate::core::matrix_profile::{MatrixProfile, ProfileKind, RollingStats, ScrimpConfig, EPS};
use crate::core::profile_state::ProfileState;
use crate::core::series::CleanSeries;

/// Compute the matrix profile of `ts` with SCRIMP++.
///
/// Phases: validation, optional PRE-SCRIMP seeding, then the anytime SCRIMP
/// sweep over a random permutation of the diagonal lags `ez+1..n_subs`,
/// truncated to `sample_budget`. Each lag is evaluated in one O(n) pass of the
/// dot-product recurrence
///
/// `QT[p+1][q+1] = QT[p][q] + T[p+w]*T[q+w] - T[p]*T[q]`
///
/// and committed as a unit. Between lags the cancellation token and the time
/// limit are polled; whichever way the loop ends, the accumulated profile is
/// returned.
///
/// # Errors
/// `InputShape` for an empty series, `Parameter` for an invalid window size
/// or ratio. Interruption is not an error.
///
/// # References
/// Zhu et al., "Matrix Profile XI: SCRIMP++: Time Series Motif Discovery at
/// Interactive Speeds", ICDM 2018.
#[instrument(skip_all, fields(n = ts.len(), w = config.window_size))]
pub fn scrimp(
    ts: &[f64],
    config: &ScrimpConfig,
    token: &CancellationToken,
) -> Result<MatrixProfile> {
    validate_window(config.window_size, ts.len())?;
    validate_ratio("exclusion_zone", config.exclusion_zone)?;
    validate_ratio("pre_scrimp", config.pre_scrimp)?;

    let w = config.window_size;
    let clean = CleanSeries::new(ts, w);
    let n_subs = clean.n_subs();
    let exclusion_zone = config.exclusion_zone_radius();
    let kernel = MassKernel::new(&clean.values, w, EPS)?;
    let stop = StopCheck::new(token, config.time_limit);

    let offsets = sample_offsets(n_subs, exclusion_zone, config.sample_budget, config.seed);
    let truncated = offsets.len() < n_subs.saturating_sub(exclusion_zone + 1);
    debug!(
        offsets = offsets.len(),
        truncated,
        exclusion_zone,
        spectral = kernel.is_spectral(),
        skips = clean.has_skips(),
        "sampled diagonal offsets"
    );

    let mut state = ProfileState::new(clean.skip.clone(), true);
    let mut stopped = None;

    if let Some(step) = config.pre_scrimp_step() {
        let seeder =
            PreScrimpSeeder::new(&kernel, &clean.values, &clean.skip, exclusion_zone, step, EPS);
        stopped = seeder.seed(&mut state, &stop)?;
    }

    let mut processed = 0;
    if stopped.is_none() {
        let sweep = DiagonalSweep {
            ts: &clean.values,
            skip: &clean.skip,
            stats: kernel.stats(),
            window_size: w,
            eps: EPS,
        };
        let (count, reason) = sweep.run(&offsets, &mut state, &stop);
        processed = count;
        stopped = reason;
    }

    let completion = stopped.unwrap_or(if truncated {
        Completion::BudgetReached
    } else {
        Completion::Exhausted
    });
    info!(?completion, processed, total = offsets.len(), "scrimp finished");

    Ok(state.finalize(
        ProfileKind::SelfJoin,
        w,
        config.exclusion_zone,
        exclusion_zone,
        completion,
        processed,
        offsets.len(),
    ))
}

/// Random permutation of the valid lags, truncated to the sample budget.
///
/// The full list is shuffled before truncation, so for a fixed seed a larger
/// budget always extends a smaller one.
pub(crate) fn sample_offsets(
    n_subs: usize,
    exclusion_zone: usize,
    budget: Option<usize>,
    seed: Option<u64>,
) -> Vec<usize> {
    let mut offsets: Vec<usize> = (exclusion_zone + 1..n_subs).collect();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    offsets.shuffle(&mut rng);
    if let Some(budget) = budget {
        offsets.truncate(budget);
    }
    offsets
}

/// Read-only context for evaluating whole diagonals.
struct DiagonalSweep<'a> {
    ts: &'a [f64],
    skip: &'a [bool],
    stats: &'a RollingStats,
    window_size: usize,
    eps: f64,
}

impl DiagonalSweep<'_> {
    /// Distances along lag `lag`: element `q` is `d(q + lag, q)`.
    fn diagonal(&self, lag: usize) -> Vec<f64> {
        let ts = self.ts;
        let w = self.window_size;
        let len = self.stats.len() - lag;
        let mut out = Vec::with_capacity(len);

        let mut dot = window_dot(ts, lag, ts, 0, w);
        for q in 0..len {
            let p = q + lag;
            if q > 0 {
                dot += ts[p + w - 1] * ts[q + w - 1] - ts[p - 1] * ts[q - 1];
            }
            let d = if self.skip[p] || self.skip[q] {
                f64::INFINITY
            } else {
                self.stats.distance(dot, p, q, self.eps)
            };
            out.push(d);
        }
        out
    }

    /// Apply lags in order until done or stopped. Returns the number applied.
    fn run(
        &self,
        offsets: &[usize],
        state: &mut ProfileState,
        stop: &StopCheck<'_>,
    ) -> (usize, Option<Completion>) {
        #[cfg(feature = "parallel")]
        let batch = rayon::current_num_threads().max(1);
        #[cfg(not(feature = "parallel"))]
        let batch = 1;

        let report_every = (offsets.len() / 10).max(1);
        let mut processed = 0;
        for chunk in offsets.chunks(batch) {
            if let Some(reason) = stop.poll() {
                debug!(?reason, processed, "scrimp interrupted");
                return (processed, Some(reason));
            }
            let dists = self.evaluate(chunk);
            for (&lag, d) in chunk.iter().zip(&dists) {
                state.apply_diagonal(lag, d);
                processed += 1;
                if processed % report_every == 0 {
                    debug!(processed, total = offsets.len(), "scrimp progress");
                }
            }
        }
        (processed, None)
    }

    #[cfg(feature = "parallel")]
    fn evaluate(&self, lags: &[usize]) -> Vec<Vec<f64>> {
        use rayon::prelude::*;

        lags.par_iter().map(|&lag| self.diagonal(lag)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate(&self, lags: &[usize]) -> Vec<Vec<f64>> {
        lags.iter().map(|&lag| self.diagonal(lag)).collect()
    }
}

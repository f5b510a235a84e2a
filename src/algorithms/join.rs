use tracing::{debug, info, instrument};

use crate::algorithms::common::argmin_finite;
use crate::algorithms::mass::MassKernel;
use crate::core::cancel::{CancellationToken, Completion, StopCheck};
use crate::core::error::{validate_window, Error, Result};
use crate::core::matrix_profile::{MatrixProfile, ProfileKind, RollingStats, ScrimpConfig, EPS};
use crate::core::profile_state::ProfileState;
use crate::core::series::CleanSeries;

/// Compute the join profile of `query` against `reference`.
///
/// For every window of the query, the distance to and index of its nearest
/// window in the reference. There are no trivial matches between distinct
/// series, so the exclusion zone is 0 and no left/right profiles are kept.
/// Rows are evaluated with the MASS kernel of the reference and the
/// cancellation token is polled between rows.
///
/// # Errors
/// `InputShape` if either series is empty or the query is longer than the
/// reference; `Parameter` if the window does not fit the query.
#[instrument(skip_all, fields(n = reference.len(), n_query = query.len(), w = config.window_size))]
pub fn join(
    reference: &[f64],
    query: &[f64],
    config: &ScrimpConfig,
    token: &CancellationToken,
) -> Result<MatrixProfile> {
    if reference.is_empty() {
        return Err(Error::InputShape("reference series is empty".into()));
    }
    if query.len() > reference.len() {
        return Err(Error::InputShape(format!(
            "query of length {} is longer than reference of length {}",
            query.len(),
            reference.len()
        )));
    }
    validate_window(config.window_size, query.len())?;

    let w = config.window_size;
    let reference = CleanSeries::new(reference, w);
    let query = CleanSeries::new(query, w);
    let kernel = MassKernel::new(&reference.values, w, EPS)?;
    let query_stats = RollingStats::compute(&query.values, w);
    let stop = StopCheck::new(token, config.time_limit);

    let rows = JoinRows {
        kernel: &kernel,
        reference_skip: &reference.skip,
        query: &query,
        query_stats: &query_stats,
    };
    let n_rows = query.n_subs();
    let mut state = ProfileState::new(query.skip.clone(), false);
    let (processed, stopped) = rows.run(&mut state, &stop)?;

    let completion = stopped.unwrap_or(Completion::Exhausted);
    info!(?completion, processed, total = n_rows, "join finished");

    Ok(state.finalize(
        ProfileKind::Join,
        w,
        0.0,
        0,
        completion,
        processed,
        n_rows,
    ))
}

struct JoinRows<'k, 'a> {
    kernel: &'k MassKernel<'a>,
    reference_skip: &'k [bool],
    query: &'k CleanSeries,
    query_stats: &'k RollingStats,
}

impl JoinRows<'_, '_> {
    /// Nearest reference window for query window `i`.
    fn row(&self, i: usize) -> Result<Option<(usize, f64)>> {
        if self.query.skip[i] || self.query_stats.is_degenerate(i, EPS) {
            return Ok(None);
        }
        let w = self.query.window_size;
        let window = &self.query.values[i..i + w];
        let mut dp = self
            .kernel
            .query_profile(window, self.query_stats.mean[i], self.query_stats.std[i])?
            .distances;
        for (d, &skipped) in dp.iter_mut().zip(self.reference_skip) {
            if skipped {
                *d = f64::INFINITY;
            }
        }
        Ok(argmin_finite(&dp))
    }

    fn run(
        &self,
        state: &mut ProfileState,
        stop: &StopCheck<'_>,
    ) -> Result<(usize, Option<Completion>)> {
        #[cfg(feature = "parallel")]
        let batch = rayon::current_num_threads().max(1);
        #[cfg(not(feature = "parallel"))]
        let batch = 1;

        let rows: Vec<usize> = (0..self.query.n_subs()).collect();
        let mut processed = 0;
        for chunk in rows.chunks(batch) {
            if let Some(reason) = stop.poll() {
                debug!(?reason, processed, "join interrupted");
                return Ok((processed, Some(reason)));
            }
            for (&i, best) in chunk.iter().zip(self.evaluate(chunk)?) {
                if let Some((j, d)) = best {
                    state.update(i, d, j);
                }
                processed += 1;
            }
        }
        Ok((processed, None))
    }

    #[cfg(feature = "parallel")]
    fn evaluate(&self, rows: &[usize]) -> Result<Vec<Option<(usize, f64)>>> {
        use rayon::prelude::*;

        rows.par_iter().map(|&i| self.row(i)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate(&self, rows: &[usize]) -> Result<Vec<Option<(usize, f64)>>> {
        rows.iter().map(|&i| self.row(i)).collect()
    }
}

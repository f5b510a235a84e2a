use tracing::{debug, trace};

use crate::algorithms::common::{apply_exclusion_zone, argmin_finite};
use crate::algorithms::mass::MassKernel;
use crate::core::cancel::{Completion, StopCheck};
use crate::core::error::Result;
use crate::core::profile_state::ProfileState;

/// Updates proposed by one anchor, committed later in anchor order.
struct AnchorProposal {
    anchor: usize,
    /// Masked exact distance profile of the anchor window.
    distances: Vec<f64>,
    /// `(position, partner, distance)` triples from diagonal propagation.
    propagated: Vec<(usize, usize, f64)>,
}

/// Coarse seeding pass of SCRIMP++.
///
/// Visits anchors at a fixed stride, computes their exact distance profiles
/// via MASS, and extrapolates each anchor's nearest-neighbor diagonal up to
/// `step` positions forward and backward with the incremental dot-product
/// recurrence:
///
/// `dot(a+1, b+1) = dot(a, b) + T[a+w]*T[b+w] - T[a]*T[b]`
///
/// Propagation along one diagonal is sequential; different anchors are
/// independent until their updates are committed.
pub(crate) struct PreScrimpSeeder<'k, 'a> {
    kernel: &'k MassKernel<'a>,
    ts: &'a [f64],
    skip: &'a [bool],
    exclusion_zone: usize,
    step: usize,
    eps: f64,
}

impl<'k, 'a> PreScrimpSeeder<'k, 'a> {
    pub fn new(
        kernel: &'k MassKernel<'a>,
        ts: &'a [f64],
        skip: &'a [bool],
        exclusion_zone: usize,
        step: usize,
        eps: f64,
    ) -> Self {
        debug_assert!(step > 0);
        Self {
            kernel,
            ts,
            skip,
            exclusion_zone,
            step,
            eps,
        }
    }

    fn anchors(&self) -> Vec<usize> {
        (0..self.kernel.n_subs()).step_by(self.step).collect()
    }

    /// Run the seeding pass, committing into `state`.
    ///
    /// Returns the stop reason if the pass was interrupted between anchors.
    pub fn seed(
        &self,
        state: &mut ProfileState,
        stop: &StopCheck<'_>,
    ) -> Result<Option<Completion>> {
        let anchors = self.anchors();
        debug!(anchors = anchors.len(), step = self.step, "pre-scrimp started");

        #[cfg(feature = "parallel")]
        let batch = rayon::current_num_threads().max(1);
        #[cfg(not(feature = "parallel"))]
        let batch = 1;

        for chunk in anchors.chunks(batch) {
            if let Some(reason) = stop.poll() {
                debug!(?reason, "pre-scrimp interrupted");
                return Ok(Some(reason));
            }
            for proposal in self.propose_batch(chunk)?.into_iter().flatten() {
                self.commit(state, &proposal);
            }
        }

        debug!("pre-scrimp finished");
        Ok(None)
    }

    #[cfg(feature = "parallel")]
    fn propose_batch(&self, anchors: &[usize]) -> Result<Vec<Option<AnchorProposal>>> {
        use rayon::prelude::*;

        anchors.par_iter().map(|&a| self.propose(a)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn propose_batch(&self, anchors: &[usize]) -> Result<Vec<Option<AnchorProposal>>> {
        anchors.iter().map(|&a| self.propose(a)).collect()
    }

    fn propose(&self, anchor: usize) -> Result<Option<AnchorProposal>> {
        let stats = self.kernel.stats();
        if self.skip[anchor] || stats.is_degenerate(anchor, self.eps) {
            return Ok(None);
        }

        let profile = self.kernel.distance_profile(anchor)?;
        let mut distances = profile.distances;
        for (d, &skipped) in distances.iter_mut().zip(self.skip) {
            if skipped {
                *d = f64::INFINITY;
            }
        }
        apply_exclusion_zone(&mut distances, anchor, self.exclusion_zone);

        let Some((nn, best)) = argmin_finite(&distances) else {
            return Ok(None);
        };
        trace!(anchor, nn, distance = best, "pre-scrimp anchor");

        let propagated = self.propagate(anchor, nn, profile.dots[nn]);
        Ok(Some(AnchorProposal {
            anchor,
            distances,
            propagated,
        }))
    }

    #[inline]
    fn pair_distance(&self, dot: f64, a: usize, b: usize) -> f64 {
        if self.skip[a] || self.skip[b] {
            return f64::INFINITY;
        }
        self.kernel.stats().distance(dot, a, b, self.eps)
    }

    /// Walk the anchor's nearest-neighbor diagonal in both directions.
    fn propagate(&self, anchor: usize, nn: usize, dot0: f64) -> Vec<(usize, usize, f64)> {
        let ts = self.ts;
        let w = self.kernel.window_size();
        let n_subs = self.kernel.n_subs();
        let mut out = Vec::with_capacity(2 * self.step);

        let mut dot = dot0;
        for t in 1..=self.step {
            let (a, b) = (anchor + t, nn + t);
            if a >= n_subs || b >= n_subs {
                break;
            }
            dot += ts[a + w - 1] * ts[b + w - 1] - ts[a - 1] * ts[b - 1];
            out.push((a, b, self.pair_distance(dot, a, b)));
        }

        let mut dot = dot0;
        for t in 1..=self.step.min(anchor).min(nn) {
            let (a, b) = (anchor - t, nn - t);
            dot += ts[a] * ts[b] - ts[a + w] * ts[b + w];
            out.push((a, b, self.pair_distance(dot, a, b)));
        }

        out
    }

    fn commit(&self, state: &mut ProfileState, proposal: &AnchorProposal) {
        let anchor = proposal.anchor;
        for (j, &d) in proposal.distances.iter().enumerate() {
            if d.is_finite() {
                state.update(j, d, anchor);
                state.update(anchor, d, j);
            }
        }
        for &(a, b, d) in &proposal.propagated {
            if d.is_finite() {
                state.update(a, d, b);
                state.update(b, d, a);
            }
        }
    }
}

//! Anytime matrix profile (SCRIMP++) and motif discovery for time series.
//!
//! The matrix profile holds, for every subsequence of length `w`, the
//! z-normalized Euclidean distance to its nearest non-trivial neighbor and
//! that neighbor's index. [`ScrimpEngine`] computes it with an optional
//! PRE-SCRIMP seeding pass followed by a randomized sweep over diagonals that
//! can be stopped at any time through a [`CancellationToken`] or a time
//! limit; the profile computed so far is always returned.
//!
//! Motifs are then extracted with [`find_motif`], discords with
//! [`find_discord`], and multidimensional motifs with [`mstomp`] and
//! [`find_multi_motif`].

pub mod algorithms;
pub mod core;

pub use crate::algorithms::join::join;
pub use crate::algorithms::mass::{mass, MassKernel};
pub use crate::algorithms::mmotifs::{find_multi_motif, MultiMotif, MultiMotifParams, MultiMotifSet};
pub use crate::algorithms::motifs::{
    find_discord, find_motif, Discord, DiscordParams, Motif, MotifParams, MotifSet,
};
pub use crate::algorithms::mstomp::{mstomp, MultiMatrixProfile};
pub use crate::algorithms::scrimp::scrimp;
pub use crate::core::cancel::{CancellationToken, Completion};
pub use crate::core::error::{Error, Result};
pub use crate::core::matrix_profile::{
    DirectionalProfile, MatrixProfile, ProfileKind, RollingStats, ScrimpConfig, EPS,
};

/// High-level facade for anytime matrix profile computation.
///
/// # Examples
///
/// ```
/// use scrimp_rs::{ScrimpConfig, ScrimpEngine};
///
/// let ts: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin()).collect();
/// let mut config = ScrimpConfig::new(16);
/// config.seed = Some(42);
///
/// let engine = ScrimpEngine::new(config);
/// let mp = engine.compute(&ts).unwrap();
/// assert_eq!(mp.profile.len(), ts.len() - 16 + 1);
/// assert!(mp.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct ScrimpEngine {
    config: ScrimpConfig,
}

impl ScrimpEngine {
    pub fn new(config: ScrimpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScrimpConfig {
        &self.config
    }

    /// Compute the self-join matrix profile, running to completion.
    pub fn compute(&self, ts: &[f64]) -> Result<MatrixProfile> {
        self.compute_with(ts, &CancellationToken::new())
    }

    /// Compute the self-join matrix profile, stopping early when `token` is
    /// cancelled or the configured time limit passes.
    ///
    /// Early stops still return the best profile found so far; the reason is
    /// recorded in [`MatrixProfile::completion`].
    pub fn compute_with(&self, ts: &[f64], token: &CancellationToken) -> Result<MatrixProfile> {
        scrimp(ts, &self.config, token)
    }

    /// Compute the join profile of `query` against `reference`.
    ///
    /// The exclusion zone is 0 and no left/right profiles are produced.
    pub fn join(&self, reference: &[f64], query: &[f64]) -> Result<MatrixProfile> {
        self.join_with(reference, query, &CancellationToken::new())
    }

    /// Cancellable variant of [`ScrimpEngine::join`].
    pub fn join_with(
        &self,
        reference: &[f64],
        query: &[f64],
        token: &CancellationToken,
    ) -> Result<MatrixProfile> {
        join(reference, query, &self.config, token)
    }

    /// Compute the profile of `ts` and extract its motifs.
    pub fn motifs(&self, ts: &[f64], params: &MotifParams) -> Result<MotifSet> {
        let mp = self.compute(ts)?;
        find_motif(&mp, ts, params)
    }

    /// Compute the profile of `ts` and extract its discords.
    pub fn discords(&self, ts: &[f64], params: &DiscordParams) -> Result<Vec<Discord>> {
        let mp = self.compute(ts)?;
        Ok(find_discord(&mp, params))
    }
}

use tracing::{debug, instrument};

use crate::algorithms::common::{apply_exclusion_zone, mark_zone, next_pair};
use crate::algorithms::mdl::{baseline_bit_cost, PairCode, Quantizer};
use crate::algorithms::mstomp::MultiMatrixProfile;
use crate::core::error::{validate_ratio, Error, Result};
use crate::core::matrix_profile::exclusion_zone_radius;
use crate::core::series::CleanSeries;

/// Parameters for multidimensional motif extraction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultiMotifParams {
    pub n_motifs: usize,
    /// Quantization depth used by the bit-cost estimate, in `2..=16`.
    pub n_bit: usize,
    /// Exclusion zone ratio override. `None` uses the profile's own zone.
    pub exclusion_zone: Option<f64>,
}

impl Default for MultiMotifParams {
    fn default() -> Self {
        Self {
            n_motifs: 3,
            n_bit: 4,
            exclusion_zone: None,
        }
    }
}

/// A multidimensional motif.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiMotif {
    /// Motif pair, sorted ascending.
    pub pair: (usize, usize),
    /// Average distance over the chosen dimensions.
    pub distance: f64,
    /// Dimensions spanned by the motif, best match first.
    pub dimensions: Vec<usize>,
    /// Estimated bits to store the pair using this subspace.
    pub bit_cost: f64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiMotifSet {
    pub window_size: usize,
    pub exclusion_zone: usize,
    /// Cost of storing a pair without compression; motifs above it are not reported.
    pub base_bit_cost: f64,
    pub motifs: Vec<MultiMotif>,
}

/// Best candidate of one profile row.
struct Candidate {
    idx: usize,
    nn: usize,
    distance: f64,
    n_dims: usize,
    bit_cost: f64,
    code: PairCode,
}

/// Extract multidimensional motifs by minimum bit cost.
///
/// Each round inspects the best remaining pair of every row `k` of the
/// profile (the `k + 1`-dimensional average), prices it with `k + 1`
/// residual-coded dimensions and keeps the cheapest. The search stops when
/// even that candidate costs more than storing the pair verbatim, after
/// `n_motifs` motifs, or when the profile is exhausted. Accepted pairs are
/// suppressed in every row.
///
/// # Errors
/// `Parameter` if `n_bit` is outside `2..=16` or the exclusion zone override
/// is invalid; `InputShape` if `series` does not match the profile.
#[instrument(skip_all, fields(n_dims = series.len(), w = mmp.window_size, n_bit = params.n_bit))]
pub fn find_multi_motif(
    mmp: &MultiMatrixProfile,
    series: &[&[f64]],
    params: &MultiMotifParams,
) -> Result<MultiMotifSet> {
    if !(2..=16).contains(&params.n_bit) {
        return Err(Error::Parameter(format!(
            "n_bit must lie in 2..=16, got {}",
            params.n_bit
        )));
    }
    let w = mmp.window_size;
    let n_subs = mmp.n_subs();
    if series.len() != mmp.n_dims {
        return Err(Error::InputShape(format!(
            "profile has {} dimensions, series has {}",
            mmp.n_dims,
            series.len()
        )));
    }
    if let Some(dim) = series.iter().position(|s| s.len() < w || s.len() - w + 1 != n_subs) {
        return Err(Error::InputShape(format!(
            "dimension {dim} does not match a profile of {n_subs} windows of size {w}"
        )));
    }
    let exclusion_zone = match params.exclusion_zone {
        Some(ratio) => {
            validate_ratio("exclusion_zone", ratio)?;
            exclusion_zone_radius(w, ratio)
        }
        None => mmp.exclusion_zone,
    };

    let clean: Vec<CleanSeries> = series.iter().map(|s| CleanSeries::new(s, w)).collect();
    let values: Vec<&[f64]> = clean.iter().map(|c| c.values.as_slice()).collect();
    let quantizer = Quantizer::new(params.n_bit);
    let base_bit_cost = baseline_bit_cost(params.n_bit, mmp.n_dims, w);

    let mut working = mmp.profile.clone();
    let mut suppressed = vec![false; n_subs];
    let mut motifs = Vec::with_capacity(params.n_motifs);

    while motifs.len() < params.n_motifs {
        let mut best: Option<Candidate> = None;
        for (k, row) in working.iter_mut().enumerate() {
            let Some((idx, nn, distance)) = next_pair(row, &mmp.profile_index[k], &suppressed)
            else {
                continue;
            };
            let code = PairCode::new(&values, w, idx, nn, &quantizer);
            let bit_cost = code.bit_cost(k + 1);
            if best.as_ref().map_or(true, |b| bit_cost < b.bit_cost) {
                best = Some(Candidate {
                    idx,
                    nn,
                    distance,
                    n_dims: k + 1,
                    bit_cost,
                    code,
                });
            }
        }

        let Some(best) = best else {
            debug!(found = motifs.len(), "profile exhausted");
            break;
        };
        if best.bit_cost > base_bit_cost {
            debug!(
                bit_cost = best.bit_cost,
                base_bit_cost, "no remaining pair compresses"
            );
            break;
        }

        for row in working.iter_mut() {
            apply_exclusion_zone(row, best.idx, exclusion_zone);
            apply_exclusion_zone(row, best.nn, exclusion_zone);
        }
        mark_zone(&mut suppressed, best.idx, exclusion_zone);
        mark_zone(&mut suppressed, best.nn, exclusion_zone);

        debug!(
            idx = best.idx,
            nn = best.nn,
            n_dims = best.n_dims,
            bit_cost = best.bit_cost,
            "multidimensional motif found"
        );
        motifs.push(MultiMotif {
            pair: (best.idx.min(best.nn), best.idx.max(best.nn)),
            distance: best.distance,
            dimensions: best.code.dimensions(best.n_dims),
            bit_cost: best.bit_cost,
        });
    }

    Ok(MultiMotifSet {
        window_size: w,
        exclusion_zone,
        base_bit_cost,
        motifs,
    })
}

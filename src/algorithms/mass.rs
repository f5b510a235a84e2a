use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::algorithms::common::sliding_dot_product_naive;
use crate::core::error::{Error, Result};
use crate::core::matrix_profile::{dot_to_distance, RollingStats, EPS};

/// Size threshold (n * w) above which the spectral path is used.
/// Below this, the naive O(n*w) loop wins due to lower constant overhead.
const FFT_THRESHOLD: usize = 256 * 1024;

/// Forward spectrum of the zero-padded series plus the plans to reuse it.
struct Spectrum {
    fft_len: usize,
    series: Vec<Complex<f64>>,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

/// Distances from one query window to every window of the series, with the
/// raw dot products they were derived from.
#[derive(Debug, Clone)]
pub struct DistanceProfile {
    pub distances: Vec<f64>,
    pub dots: Vec<f64>,
}

/// Precomputed state for repeated single-query distance profiles (MASS).
///
/// Holds the rolling statistics of the series and, for large inputs, the
/// forward transform of the series so that each query costs one forward and
/// one inverse transform of the query alone.
pub struct MassKernel<'a> {
    ts: &'a [f64],
    stats: RollingStats,
    eps: f64,
    spectrum: Option<Spectrum>,
}

impl<'a> MassKernel<'a> {
    /// Build a kernel, choosing the spectral path when `n * w` is large.
    pub fn new(ts: &'a [f64], window_size: usize, eps: f64) -> Result<Self> {
        let spectral = ts.len().saturating_mul(window_size) > FFT_THRESHOLD;
        Self::build(ts, window_size, eps, spectral)
    }

    /// Build a kernel that always uses the spectral path.
    pub fn spectral(ts: &'a [f64], window_size: usize, eps: f64) -> Result<Self> {
        Self::build(ts, window_size, eps, true)
    }

    fn build(ts: &'a [f64], window_size: usize, eps: f64, spectral: bool) -> Result<Self> {
        if window_size == 0 || ts.len() < window_size {
            return Err(Error::InputShape(format!(
                "series of length {} cannot hold a window of {window_size}",
                ts.len()
            )));
        }
        let stats = RollingStats::compute(ts, window_size);
        let spectrum = if spectral {
            Some(Self::series_spectrum(ts, window_size)?)
        } else {
            None
        };
        Ok(Self {
            ts,
            stats,
            eps,
            spectrum,
        })
    }

    fn series_spectrum(ts: &[f64], window_size: usize) -> Result<Spectrum> {
        let n = ts.len();
        let fft_len = (n + window_size - 1).next_power_of_two();

        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut padded = vec![0.0; fft_len];
        padded[..n].copy_from_slice(ts);
        let mut series = forward.make_output_vec();
        forward.process(&mut padded, &mut series)?;

        Ok(Spectrum {
            fft_len,
            series,
            forward,
            inverse,
        })
    }

    pub fn stats(&self) -> &RollingStats {
        &self.stats
    }

    pub fn window_size(&self) -> usize {
        self.stats.window_size
    }

    pub fn n_subs(&self) -> usize {
        self.stats.len()
    }

    pub fn is_spectral(&self) -> bool {
        self.spectrum.is_some()
    }

    /// Dot products of `query` against every window of the series.
    pub fn sliding_dot(&self, query: &[f64]) -> Result<Vec<f64>> {
        let w = self.window_size();
        if query.len() != w {
            return Err(Error::InputShape(format!(
                "query has length {}, kernel expects {w}",
                query.len()
            )));
        }
        let Some(spec) = &self.spectrum else {
            return Ok(sliding_dot_product_naive(query, self.ts));
        };

        // Cross-correlation as a convolution with the reversed query
        let mut q_padded = vec![0.0; spec.fft_len];
        for (slot, &x) in q_padded.iter_mut().zip(query.iter().rev()) {
            *slot = x;
        }
        let mut q_spectrum = spec.forward.make_output_vec();
        spec.forward.process(&mut q_padded, &mut q_spectrum)?;

        for (q_val, ts_val) in q_spectrum.iter_mut().zip(spec.series.iter()) {
            *q_val *= ts_val;
        }
        // DC and Nyquist bins of a real signal's spectrum are real
        if let Some(first) = q_spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = q_spectrum.last_mut() {
            last.im = 0.0;
        }

        let mut result = vec![0.0; spec.fft_len];
        spec.inverse.process(&mut q_spectrum, &mut result)?;

        // realfft inverse is unnormalized
        let norm = 1.0 / spec.fft_len as f64;
        let n_subs = self.n_subs();
        Ok(result[w - 1..w - 1 + n_subs]
            .iter()
            .map(|&x| x * norm)
            .collect())
    }

    /// Distance profile of the series' own window at `idx`.
    pub fn distance_profile(&self, idx: usize) -> Result<DistanceProfile> {
        let w = self.window_size();
        if idx >= self.n_subs() {
            return Err(Error::InputShape(format!(
                "window index {idx} out of range for {} windows",
                self.n_subs()
            )));
        }
        let query = &self.ts[idx..idx + w];
        self.query_profile(query, self.stats.mean[idx], self.stats.std[idx])
    }

    /// Distance profile of an external query with known mean and standard deviation.
    pub fn query_profile(&self, query: &[f64], mean: f64, std: f64) -> Result<DistanceProfile> {
        let dots = self.sliding_dot(query)?;
        let w = self.window_size();
        let distances = dots
            .iter()
            .enumerate()
            .map(|(j, &dot)| {
                dot_to_distance(
                    dot,
                    w,
                    mean,
                    std,
                    self.stats.mean[j],
                    self.stats.std[j],
                    self.eps,
                )
            })
            .collect();
        Ok(DistanceProfile { distances, dots })
    }
}

/// Compute the z-normalized distance profile for a query against a time series.
///
/// Mueen's Algorithm for Similarity Search: rolling statistics of the series,
/// sliding dot products, then the dot-to-distance conversion. Windows (or a
/// query) with near-zero standard deviation yield `+inf`.
///
/// # Errors
/// `InputShape` if the query is empty or longer than the series.
pub fn mass(query: &[f64], ts: &[f64]) -> Result<Vec<f64>> {
    let w = query.len();
    if w == 0 || ts.len() < w {
        return Err(Error::InputShape(format!(
            "query of length {w} does not fit a series of length {}",
            ts.len()
        )));
    }
    let kernel = MassKernel::new(ts, w, EPS)?;
    let query_stats = RollingStats::compute(query, w);
    let profile = kernel.query_profile(query, query_stats.mean[0], query_stats.std[0])?;
    Ok(profile.distances)
}

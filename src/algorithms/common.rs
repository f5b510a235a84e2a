/// Naive O(n*w) sliding dot product.
///
/// Returns a vector of length `ts.len() - q.len() + 1` where element `i` is
/// `dot(q, ts[i..i+w])`.
pub fn sliding_dot_product_naive(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let w = q.len();
    debug_assert!(ts.len() >= w, "Time series shorter than query");
    let n_subs = ts.len() - w + 1;

    (0..n_subs)
        .map(|i| q.iter().zip(&ts[i..i + w]).map(|(a, b)| a * b).sum())
        .collect()
}

/// Dot product of two windows of length `w`.
#[inline]
pub(crate) fn window_dot(ts_a: &[f64], a: usize, ts_b: &[f64], b: usize, w: usize) -> f64 {
    ts_a[a..a + w]
        .iter()
        .zip(&ts_b[b..b + w])
        .map(|(x, y)| x * y)
        .sum()
}

/// Apply an exclusion zone around index `idx`, setting entries within the zone to infinity.
///
/// The zone covers indices `[idx - zone, idx + zone]` (clamped to bounds).
#[inline]
pub fn apply_exclusion_zone(profile: &mut [f64], idx: usize, zone: usize) {
    let start = idx.saturating_sub(zone);
    let end = (idx + zone + 1).min(profile.len());
    if start < end {
        for val in &mut profile[start..end] {
            *val = f64::INFINITY;
        }
    }
}

/// Same as [`apply_exclusion_zone`] for a boolean mask.
#[inline]
pub(crate) fn mark_zone(mask: &mut [bool], idx: usize, zone: usize) {
    let start = idx.saturating_sub(zone);
    let end = (idx + zone + 1).min(mask.len());
    if start < end {
        for val in &mut mask[start..end] {
            *val = true;
        }
    }
}

/// Position and value of the smallest finite entry (first one on ties).
pub(crate) fn argmin_finite(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, d)| d.is_finite())
        .fold(None, |best, (i, d)| match best {
            Some((_, b)) if b <= d => best,
            _ => Some((i, d)),
        })
}

/// Position and value of the largest finite entry (first one on ties).
pub(crate) fn argmax_finite(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, d)| d.is_finite())
        .fold(None, |best, (i, d)| match best {
            Some((_, b)) if b >= d => best,
            _ => Some((i, d)),
        })
}

/// Pop the best remaining pair from a working profile.
///
/// Positions whose recorded partner falls in a `suppressed` region are
/// cleared from `working` and skipped. Returns `(position, partner, distance)`.
pub(crate) fn next_pair(
    working: &mut [f64],
    profile_index: &[Option<usize>],
    suppressed: &[bool],
) -> Option<(usize, usize, f64)> {
    loop {
        let (idx, distance) = argmin_finite(working)?;
        match profile_index[idx] {
            Some(nn) if !suppressed[nn] => return Some((idx, nn, distance)),
            _ => working[idx] = f64::INFINITY,
        }
    }
}

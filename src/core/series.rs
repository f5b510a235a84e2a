/// A series with invalid samples replaced by zero, plus the skip mask.
///
/// `skip[i]` is `true` iff the window of length `window_size` starting at `i`
/// contained a `NaN` or infinite sample in the raw input. The arithmetic in
/// every algorithm runs on `values`; `skip` pins the affected profile entries
/// to `+inf`.
#[derive(Debug, Clone)]
pub struct CleanSeries {
    pub values: Vec<f64>,
    pub skip: Vec<bool>,
    pub window_size: usize,
}

impl CleanSeries {
    /// Substitute invalid samples and compute the skip mask in one pass.
    ///
    /// Caller guarantees `raw.len() >= window_size > 0`.
    pub fn new(raw: &[f64], window_size: usize) -> Self {
        debug_assert!(window_size > 0 && raw.len() >= window_size);
        let n = raw.len();
        let n_subs = n - window_size + 1;

        let mut values = Vec::with_capacity(n);
        let mut invalid = vec![false; n];
        for (i, &x) in raw.iter().enumerate() {
            if x.is_finite() {
                values.push(x);
            } else {
                values.push(0.0);
                invalid[i] = true;
            }
        }

        let mut skip = vec![false; n_subs];
        // Invalid samples inside the current window
        let mut in_window = invalid[..window_size].iter().filter(|&&b| b).count();
        skip[0] = in_window > 0;
        for i in 1..n_subs {
            if invalid[i - 1] {
                in_window -= 1;
            }
            if invalid[i + window_size - 1] {
                in_window += 1;
            }
            skip[i] = in_window > 0;
        }

        Self {
            values,
            skip,
            window_size,
        }
    }

    /// Number of subsequence start positions.
    pub fn n_subs(&self) -> usize {
        self.skip.len()
    }

    pub fn has_skips(&self) -> bool {
        self.skip.iter().any(|&s| s)
    }
}

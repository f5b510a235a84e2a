use crate::core::cancel::Completion;
use crate::core::matrix_profile::{DirectionalProfile, MatrixProfile, ProfileKind};

/// Mutable profile arrays shared by PRE-SCRIMP and SCRIMP.
///
/// Owned by one computation. Every write is a pointwise minimization with a
/// strict `<`, so the first candidate to reach a value keeps the index.
/// `skip` positions are never written and stay at `+inf`.
pub(crate) struct ProfileState {
    pub profile: Vec<f64>,
    pub profile_index: Vec<Option<usize>>,
    pub left_profile: Vec<f64>,
    pub left_profile_index: Vec<Option<usize>>,
    pub right_profile: Vec<f64>,
    pub right_profile_index: Vec<Option<usize>>,
    pub skip: Vec<bool>,
    directional: bool,
}

impl ProfileState {
    pub fn new(skip: Vec<bool>, directional: bool) -> Self {
        let n = skip.len();
        // Directional arrays are only allocated when they will be reported
        let side = if directional { n } else { 0 };
        Self {
            profile: vec![f64::INFINITY; n],
            profile_index: vec![None; n],
            left_profile: vec![f64::INFINITY; side],
            left_profile_index: vec![None; side],
            right_profile: vec![f64::INFINITY; side],
            right_profile_index: vec![None; side],
            skip,
            directional,
        }
    }

    pub fn len(&self) -> usize {
        self.profile.len()
    }

    /// Update the profile at `idx` if `distance` is smaller than the current value.
    ///
    /// The left/right variant is chosen from the sign of `neighbor - idx`.
    #[inline]
    pub fn update(&mut self, idx: usize, distance: f64, neighbor: usize) {
        if self.skip[idx] {
            return;
        }
        if distance < self.profile[idx] {
            self.profile[idx] = distance;
            self.profile_index[idx] = Some(neighbor);
        }
        if !self.directional {
            return;
        }
        if neighbor < idx && distance < self.left_profile[idx] {
            self.left_profile[idx] = distance;
            self.left_profile_index[idx] = Some(neighbor);
        }
        if neighbor > idx && distance < self.right_profile[idx] {
            self.right_profile[idx] = distance;
            self.right_profile_index[idx] = Some(neighbor);
        }
    }

    /// Apply both update streams of one diagonal.
    ///
    /// `dists[p - lag]` holds the distance between windows `p` and `p - lag`
    /// for `p` in `lag..len`. The forward stream updates `p` (a left hit), the
    /// reverse stream updates `p - lag` (a right hit).
    pub fn apply_diagonal(&mut self, lag: usize, dists: &[f64]) {
        debug_assert_eq!(dists.len(), self.len() - lag);
        for (q, &d) in dists.iter().enumerate() {
            if !d.is_finite() {
                continue;
            }
            let p = q + lag;
            self.update(p, d, q);
            self.update(q, d, p);
        }
    }

    /// Package the accumulated arrays into an immutable result.
    #[allow(clippy::too_many_arguments)]
    pub fn finalize(
        self,
        kind: ProfileKind,
        window_size: usize,
        exclusion_zone_ratio: f64,
        exclusion_zone: usize,
        completion: Completion,
        offsets_processed: usize,
        offsets_total: usize,
    ) -> MatrixProfile {
        let (left, right) = if self.directional {
            (
                Some(DirectionalProfile {
                    profile: self.left_profile,
                    profile_index: self.left_profile_index,
                }),
                Some(DirectionalProfile {
                    profile: self.right_profile,
                    profile_index: self.right_profile_index,
                }),
            )
        } else {
            (None, None)
        };

        MatrixProfile {
            kind,
            profile: self.profile,
            profile_index: self.profile_index,
            left,
            right,
            window_size,
            exclusion_zone_ratio,
            exclusion_zone,
            completion,
            offsets_processed,
            offsets_total,
        }
    }
}

//! Error type shared by every entry point of the crate.
//!
//! Degenerate (near-constant) windows and short result lists are not errors:
//! the former surface as `+inf` distances, the latter as truncated vectors.

use thiserror::Error;

/// Errors raised at the API boundary, before any computation starts.
#[derive(Error, Debug)]
pub enum Error {
    /// The series (or query, or profile) does not have a usable shape.
    #[error("invalid input shape: {0}")]
    InputShape(String),

    /// A numeric parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// The spectral backend rejected a buffer.
    #[error("spectral transform failed: {0}")]
    Fft(#[from] realfft::FftError),
}

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn too_short(n: usize, window_size: usize) -> Self {
        Self::Parameter(format!(
            "series of length {n} is too short for window size {window_size} (need window <= len/2)"
        ))
    }
}

/// Check the window size against the length of the (shorter) series.
///
/// Shared by the self-join, join and multidimensional entry points.
pub(crate) fn validate_window(window_size: usize, len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::InputShape("series is empty".into()));
    }
    if window_size < 4 {
        return Err(Error::Parameter(format!(
            "window size must be at least 4, got {window_size}"
        )));
    }
    if window_size > len / 2 {
        return Err(Error::too_short(len, window_size));
    }
    Ok(())
}

/// Check that a ratio parameter is finite and non-negative.
pub(crate) fn validate_ratio(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Parameter(format!(
            "{name} must be a finite, non-negative ratio, got {value}"
        )));
    }
    Ok(())
}

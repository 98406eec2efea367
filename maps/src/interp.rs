//! One-dimensional piecewise-linear interpolation.
//!
//! Axis coordinate conversion and containment inversion both reduce to
//! interpolating a monotonic table of nodes. The helpers here validate the
//! node table once and then interpolate with linear extrapolation past the
//! first and last node, which is what pixel/coordinate conversion needs
//! for points slightly outside an axis.

use thiserror::Error;

/// Errors that can occur during interpolation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be sorted in ascending order")]
    UnsortedData,
}

fn validate(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }

    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }

    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpError::UnsortedData);
    }

    Ok(())
}

/// Performs linear interpolation on 1D data, extrapolating linearly outside
/// the node range.
///
/// The interval is located with a binary search (`O(log n)`). Outside
/// `[xs[0], xs[n-1]]` the first or last segment is extended, so the result
/// is defined for every finite `x`. A NaN `x` yields NaN.
///
/// # Arguments
///
/// * `x` - The x-coordinate at which to interpolate
/// * `xs` - Node x-coordinates, strictly ascending
/// * `ys` - Node values, same length as `xs`
///
/// # Examples
///
/// ```rust
/// use gamma_maps::interp::interp_extrapolate;
///
/// let xs = [0.0, 1.0, 2.0];
/// let ys = [0.0, 10.0, 30.0];
/// assert_eq!(interp_extrapolate(1.5, &xs, &ys).unwrap(), 20.0);
/// assert_eq!(interp_extrapolate(3.0, &xs, &ys).unwrap(), 50.0);
/// ```
pub fn interp_extrapolate(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    validate(xs, ys)?;
    Ok(interp_unchecked(x, xs, ys))
}

/// Interpolation without node validation, for tables validated at
/// construction time.
pub(crate) fn interp_unchecked(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    let i = match xs.partition_point(|&v| v <= x) {
        0 => 0,
        p if p >= n => n - 2,
        p => p - 1,
    };

    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}

//! Smoothing of closed contour lines, e.g. likelihood contours of two
//! fitted parameters.

use nalgebra::DMatrix;

use crate::{Result, VizError};

pub const DEFAULT_CONTOUR_SAMPLES: usize = 50;

/// Close the contour by repeating the first point, unless it already ends
/// there.
fn close(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let (mut xf, mut yf) = (x.to_vec(), y.to_vec());
    if let (Some(&x0), Some(&y0)) = (x.first(), y.first()) {
        if !(x0 == x[x.len() - 1] && y0 == y[y.len() - 1]) {
            xf.push(x0);
            yf.push(y0);
        }
    }
    (xf, yf)
}

/// Periodic cubic spline through `(t[i], values[i, ..])`, all columns
/// sharing the knots. The first and last rows of `values` must be equal.
struct PeriodicSpline {
    t: Vec<f64>,
    values: DMatrix<f64>,
    /// Second derivatives at the knots, same layout as `values`
    second: DMatrix<f64>,
}

impl PeriodicSpline {
    fn new(t: Vec<f64>, values: DMatrix<f64>) -> Result<Self> {
        let n = t.len() - 1;
        let h: Vec<f64> = t.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(i) = h.iter().position(|&h| h <= 0.0 || !h.is_finite()) {
            return Err(VizError::InvalidContour(format!(
                "points {i} and {} coincide",
                i + 1
            )));
        }

        // cyclic tridiagonal system for the second derivatives at knots
        // 0..n, knot n being knot 0 again
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DMatrix::<f64>::zeros(n, values.ncols());
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            a[(i, prev)] += h[prev];
            a[(i, i)] += 2.0 * (h[prev] + h[i]);
            a[(i, next)] += h[i];
            for c in 0..values.ncols() {
                let slope_next = (values[(i + 1, c)] - values[(i, c)]) / h[i];
                let slope_prev = (values[(prev + 1, c)] - values[(prev, c)]) / h[prev];
                rhs[(i, c)] = 6.0 * (slope_next - slope_prev);
            }
        }

        let solved = a.lu().solve(&rhs).ok_or_else(|| {
            VizError::InvalidContour("singular spline system".to_string())
        })?;

        let mut second = DMatrix::<f64>::zeros(n + 1, values.ncols());
        for i in 0..=n {
            second.set_row(i, &solved.row(i % n));
        }

        Ok(Self { t, values, second })
    }

    fn evaluate(&self, t: f64, column: usize) -> f64 {
        let n = self.t.len() - 1;
        let i = self.t.partition_point(|&knot| knot <= t).clamp(1, n) - 1;
        let (t0, t1) = (self.t[i], self.t[i + 1]);
        let h = t1 - t0;
        let (a, b) = (t1 - t, t - t0);
        let (y0, y1) = (self.values[(i, column)], self.values[(i + 1, column)]);
        let (m0, m1) = (self.second[(i, column)], self.second[(i + 1, column)]);

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }
}

/// Resample a contour as a smooth closed curve.
///
/// The contour is closed, parametrised by the cumulative distance between
/// consecutive points and interpolated with a periodic cubic spline.
/// Returns `n` points evenly spaced in that parameter, the first and last
/// coinciding with the first input point.
///
/// # Errors
/// * `VizError::InvalidContour` - `x` and `y` differ in length, fewer than
///   two distinct points are given, or consecutive points coincide
pub fn smooth_contour(x: &[f64], y: &[f64], n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(VizError::InvalidContour(format!(
            "x has {} points but y has {}",
            x.len(),
            y.len()
        )));
    }

    let (xf, yf) = close(x, y);
    if xf.len() < 3 {
        return Err(VizError::InvalidContour(format!(
            "need at least two distinct points, got {}",
            x.len()
        )));
    }

    let mut t = Vec::with_capacity(xf.len());
    let mut dist = 0.0;
    t.push(dist);
    for i in 1..xf.len() {
        dist += (xf[i] - xf[i - 1]).hypot(yf[i] - yf[i - 1]);
        t.push(dist);
    }

    let values = DMatrix::from_fn(xf.len(), 2, |i, c| if c == 0 { xf[i] } else { yf[i] });
    let spline = PeriodicSpline::new(t, values)?;

    let samples: Vec<f64> = match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|k| dist * k as f64 / (n - 1) as f64).collect(),
    };

    Ok((
        samples.iter().map(|&s| spline.evaluate(s, 0)).collect(),
        samples.iter().map(|&s| spline.evaluate(s, 1)).collect(),
    ))
}

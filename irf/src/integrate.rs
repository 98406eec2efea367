//! Trapezoidal integration utilities

use thiserror::Error;

/// Errors that can occur during trapezoidal integration
#[derive(Debug, Error)]
pub enum TrapezoidError {
    #[error("Insufficient points for integration, need at least 2 points")]
    InsufficientPoints,

    #[error("Points must be in ascending order")]
    NotAscending,

    #[error("Mismatched lengths: {nodes} nodes and {values} values")]
    MismatchedLengths { nodes: usize, values: usize },
}

fn validate_nodes(nodes: &[f64]) -> Result<(), TrapezoidError> {
    if nodes.len() < 2 {
        return Err(TrapezoidError::InsufficientPoints);
    }
    if nodes.windows(2).any(|w| w[1] <= w[0]) {
        return Err(TrapezoidError::NotAscending);
    }
    Ok(())
}

/// Performs trapezoidal integration of a function over a set of points.
///
/// # Arguments
///
/// * `nodes` - The x coordinates of the trapezoid corners in ascending order
/// * `to_integrate` - The function to integrate
pub fn trap_integrate<F>(nodes: &[f64], to_integrate: F) -> Result<f64, TrapezoidError>
where
    F: Fn(f64) -> f64,
{
    validate_nodes(nodes)?;

    let values: Vec<f64> = nodes.iter().map(|&x| to_integrate(x)).collect();
    Ok(cumulative_unchecked(nodes, &values)[nodes.len() - 1])
}

/// Running trapezoidal integral of tabulated values.
///
/// The result has the same length as `nodes` and starts at zero, so
/// element `i` is the integral from `nodes[0]` to `nodes[i]`.
pub fn cumulative_trapezoid(nodes: &[f64], values: &[f64]) -> Result<Vec<f64>, TrapezoidError> {
    if nodes.len() != values.len() {
        return Err(TrapezoidError::MismatchedLengths {
            nodes: nodes.len(),
            values: values.len(),
        });
    }
    validate_nodes(nodes)?;
    Ok(cumulative_unchecked(nodes, values))
}

fn cumulative_unchecked(nodes: &[f64], values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    let mut cumulative = Vec::with_capacity(nodes.len());
    cumulative.push(0.0);

    // ∫[x₁,x₂] f(x)dx ≈ (x₂-x₁) × (f(x₁)+f(x₂))/2
    for i in 1..nodes.len() {
        total += (nodes[i] - nodes[i - 1]) * (values[i] + values[i - 1]) / 2.0;
        cumulative.push(total);
    }
    cumulative
}

/// Logarithmically spaced nodes between two positive bounds, inclusive.
pub(crate) fn log_nodes(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let n = n.max(2);
    let (a, b) = (lo.ln(), hi.ln());
    (0..n)
        .map(|i| (a + (b - a) * i as f64 / (n - 1) as f64).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trap_integrate() {
        // (1-0)(0+1)/2 + (2-1)(1+4)/2 + (3-2)(4+9)/2 = 9.5
        let result = trap_integrate(&[0.0, 1.0, 2.0, 3.0], |x| x * x).unwrap();
        assert_relative_eq!(result, 9.5, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_points() {
        let result = trap_integrate(&[1.0], |x| x);
        assert!(matches!(result, Err(TrapezoidError::InsufficientPoints)));
    }

    #[test]
    fn test_not_ascending() {
        let result = trap_integrate(&[0.0, 2.0, 1.0, 3.0], |x| x);
        assert!(matches!(result, Err(TrapezoidError::NotAscending)));
    }

    #[test]
    fn test_cumulative_trapezoid() {
        let cumulative = cumulative_trapezoid(&[0.0, 1.0, 3.0], &[2.0, 2.0, 4.0]).unwrap();
        assert_eq!(cumulative, vec![0.0, 2.0, 8.0]);

        assert!(matches!(
            cumulative_trapezoid(&[0.0, 1.0], &[1.0]),
            Err(TrapezoidError::MismatchedLengths { .. })
        ));
    }

    #[test]
    fn test_log_nodes_span_bounds() {
        let nodes = log_nodes(1.0, 100.0, 3);
        assert_relative_eq!(nodes[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(nodes[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(nodes[2], 100.0, epsilon = 1e-9);
    }
}

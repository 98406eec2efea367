//! Two-dimensional symmetric Gaussian PSF.

use gamma_maps::units::{to_rad, Angle};

/// Normalised 2D Gaussian `1 / (2πσ²) exp(-r² / 2σ²)`.
///
/// Works in the small-angle limit: the density is in `sr-1` and
/// integrates to one over the flat plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauss2dPdf {
    sigma: f64,
}

impl Gauss2dPdf {
    pub fn new(sigma: Angle) -> Self {
        Self {
            sigma: to_rad(sigma),
        }
    }

    /// Width in radians
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Density in `sr-1` at offset `rad`
    pub fn evaluate(&self, rad: Angle) -> f64 {
        let r = to_rad(rad);
        let sigma2 = self.sigma * self.sigma;
        (-0.5 * r * r / sigma2).exp() / (2.0 * std::f64::consts::PI * sigma2)
    }

    /// Fraction of the density enclosed within `rad`
    pub fn containment(&self, rad: Angle) -> f64 {
        let r = to_rad(rad);
        1.0 - (-0.5 * r * r / (self.sigma * self.sigma)).exp()
    }

    /// Radius (radians) enclosing `fraction` of the density
    pub fn containment_radius(&self, fraction: f64) -> f64 {
        self.sigma * (-2.0 * (1.0 - fraction).ln()).sqrt()
    }
}

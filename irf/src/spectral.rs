//! Spectral models used to weight responses across energy.

use gamma_maps::units::{tev, to_tev};
use gamma_maps::MapAxis;
use serde::{Deserialize, Serialize};
use uom::si::f64::Energy;

use crate::integrate::{log_nodes, trap_integrate};

/// Number of log-spaced nodes used by the default numerical integral
const INTEGRAL_NODES: usize = 201;

/// Differential photon spectrum `dN/dE`.
///
/// Values are in `cm-2 s-1 TeV-1`. Only ratios of integrals matter for
/// energy weighting, so any consistent unit works.
pub trait SpectralModel {
    fn evaluate(&self, energy: Energy) -> f64;

    /// Integral of the spectrum between two energies.
    ///
    /// The default integrates numerically on a logarithmic grid.
    fn integral(&self, e_min: Energy, e_max: Energy) -> f64 {
        let (lo, hi) = (to_tev(e_min), to_tev(e_max));
        if !(lo > 0.0 && hi > lo) {
            return 0.0;
        }

        let nodes = log_nodes(lo, hi, INTEGRAL_NODES);
        trap_integrate(&nodes, |e| self.evaluate(tev(e))).unwrap_or(f64::NAN)
    }
}

impl<F> SpectralModel for F
where
    F: Fn(Energy) -> f64,
{
    fn evaluate(&self, energy: Energy) -> f64 {
        self(energy)
    }
}

/// Power law `amplitude * (E / reference)^-index`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLawSpectralModel {
    pub index: f64,
    /// Differential flux at the reference energy, `cm-2 s-1 TeV-1`
    pub amplitude: f64,
    /// Reference energy in TeV
    pub reference_tev: f64,
}

impl PowerLawSpectralModel {
    pub fn new(index: f64, amplitude: f64, reference: Energy) -> Self {
        Self {
            index,
            amplitude,
            reference_tev: to_tev(reference),
        }
    }
}

impl Default for PowerLawSpectralModel {
    fn default() -> Self {
        Self {
            index: 2.0,
            amplitude: 1e-12,
            reference_tev: 1.0,
        }
    }
}

impl SpectralModel for PowerLawSpectralModel {
    fn evaluate(&self, energy: Energy) -> f64 {
        self.amplitude * (to_tev(energy) / self.reference_tev).powf(-self.index)
    }

    fn integral(&self, e_min: Energy, e_max: Energy) -> f64 {
        let (lo, hi) = (
            to_tev(e_min) / self.reference_tev,
            to_tev(e_max) / self.reference_tev,
        );
        let prefactor = self.amplitude * self.reference_tev;

        if (self.index - 1.0).abs() < 1e-10 {
            prefactor * (hi / lo).ln()
        } else {
            let exponent = 1.0 - self.index;
            prefactor * (hi.powf(exponent) - lo.powf(exponent)) / exponent
        }
    }
}

/// Integral of `spectrum` over each bin of an energy axis, normalised to
/// sum to one.
pub fn spectral_weights(energy_axis: &MapAxis, spectrum: &dyn SpectralModel) -> Vec<f64> {
    let integrals: Vec<f64> = energy_axis
        .edges()
        .windows(2)
        .map(|w| spectrum.integral(tev(w[0]), tev(w[1])))
        .collect();
    let total: f64 = integrals.iter().sum();
    integrals.iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_power_law_evaluate() {
        let model = PowerLawSpectralModel::default();
        assert_relative_eq!(model.evaluate(tev(1.0)), 1e-12);
        assert_relative_eq!(model.evaluate(tev(10.0)), 1e-14, max_relative = 1e-12);
    }

    #[test]
    fn test_power_law_integral() {
        let model = PowerLawSpectralModel::default();
        // ∫₁^10 E^-2 dE = 1 - 1/10
        assert_relative_eq!(
            model.integral(tev(1.0), tev(10.0)),
            0.9e-12,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_power_law_index_one() {
        let model = PowerLawSpectralModel::new(1.0, 1.0, tev(1.0));
        assert_relative_eq!(
            model.integral(tev(1.0), tev(std::f64::consts::E)),
            1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_numerical_integral_matches_analytic() {
        let analytic = PowerLawSpectralModel::new(2.5, 3.0, tev(1.0));
        let numeric = |energy: Energy| analytic.evaluate(energy);

        assert_relative_eq!(
            numeric.integral(tev(0.5), tev(20.0)),
            analytic.integral(tev(0.5), tev(20.0)),
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_spectral_weights() {
        let axis = MapAxis::from_energy_bounds(tev(1.0), tev(100.0), 2, "energy_true").unwrap();
        let weights = spectral_weights(&axis, &PowerLawSpectralModel::default());
        // E^-2 puts (1 - 1/10) and (1/10 - 1/100) in the two decades
        assert_relative_eq!(weights[0], 0.9 / 0.99, max_relative = 1e-9);
        assert_relative_eq!(weights[0] + weights[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_range() {
        let constant = |_: Energy| 1.0;
        assert_eq!(constant.integral(tev(2.0), tev(1.0)), 0.0);
    }
}

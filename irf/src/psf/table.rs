//! Energy-dependent radial PSF table.

use gamma_maps::interp::interp_extrapolate;
use gamma_maps::units::{to_deg, to_tev, Angle, Energy};
use gamma_maps::MapAxis;
use ndarray::{Array1, Array2};

use crate::{PsfError, Result};

/// Radial PSF profile tabulated on a true-energy × offset grid, with the
/// exposure for each energy.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDependentTablePsf {
    energy_axis: MapAxis,
    rad_axis: MapAxis,
    /// Shape `(n_energy, n_rad)`, `sr-1`
    psf_value: Array2<f64>,
    /// Shape `(n_energy,)`, `cm2 s`
    exposure: Array1<f64>,
}

impl EnergyDependentTablePsf {
    /// Create a table.
    ///
    /// # Arguments
    /// * `energy_axis` - True energy axis, named `energy_true`
    /// * `rad_axis` - Offset axis, named `rad`
    /// * `psf_value` - PSF density, shape `(n_energy, n_rad)`
    /// * `exposure` - Exposure per energy bin, defaults to `1 cm2 s`
    pub fn new(
        energy_axis: MapAxis,
        rad_axis: MapAxis,
        psf_value: Array2<f64>,
        exposure: Option<Array1<f64>>,
    ) -> Result<Self> {
        if energy_axis.name() != "energy_true" || rad_axis.name() != "rad" {
            return Err(PsfError::InvalidGeometry(format!(
                "expected axes 'energy_true' and 'rad', got '{}' and '{}'",
                energy_axis.name(),
                rad_axis.name()
            )));
        }

        let expected = (energy_axis.nbin(), rad_axis.nbin());
        if psf_value.dim() != expected {
            return Err(PsfError::InvalidGeometry(format!(
                "PSF table shape {:?} does not match axes {expected:?}",
                psf_value.dim()
            )));
        }

        let exposure = exposure.unwrap_or_else(|| Array1::ones(energy_axis.nbin()));
        if exposure.len() != energy_axis.nbin() {
            return Err(PsfError::InvalidGeometry(format!(
                "exposure has {} values for {} energy bins",
                exposure.len(),
                energy_axis.nbin()
            )));
        }

        Ok(Self {
            energy_axis,
            rad_axis,
            psf_value,
            exposure,
        })
    }

    pub fn energy_axis(&self) -> &MapAxis {
        &self.energy_axis
    }

    pub fn rad_axis(&self) -> &MapAxis {
        &self.rad_axis
    }

    pub fn psf_value(&self) -> &Array2<f64> {
        &self.psf_value
    }

    pub fn exposure(&self) -> &Array1<f64> {
        &self.exposure
    }

    /// PSF density in `sr-1`.
    ///
    /// Bilinear in pixel space of both axes (log energy, linear offset),
    /// extrapolated beyond the outermost bin centres.
    pub fn evaluate(&self, energy: Energy, rad: Angle) -> f64 {
        let (e0, e1, fe) = bracket(
            self.energy_axis.coord_to_pix(to_tev(energy)),
            self.energy_axis.nbin(),
        );
        let (r0, r1, fr) = bracket(self.rad_axis.coord_to_pix(to_deg(rad)), self.rad_axis.nbin());

        let v = &self.psf_value;
        (1.0 - fe) * ((1.0 - fr) * v[[e0, r0]] + fr * v[[e0, r1]])
            + fe * ((1.0 - fr) * v[[e1, r0]] + fr * v[[e1, r1]])
    }

    /// Exposure at `energy`, interpolated between bin centres.
    pub fn exposure_at(&self, energy: Energy) -> Result<f64> {
        let n = self.energy_axis.nbin();
        if n == 1 {
            return Ok(self.exposure[0]);
        }

        let pix = self.energy_axis.coord_to_pix(to_tev(energy));
        let indices: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let values = self.exposure.to_vec();
        Ok(interp_extrapolate(pix, &indices, &values)?)
    }
}

/// Neighbouring indices and fractional offset for a pixel coordinate
fn bracket(pix: f64, n: usize) -> (usize, usize, f64) {
    if n < 2 {
        return (0, 0, 0.0);
    }
    let i0 = (pix.floor() as isize).clamp(0, n as isize - 2) as usize;
    (i0, i0 + 1, pix - i0 as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gamma_maps::units::{deg, tev, AxisUnit};
    use gamma_maps::Interp;
    use ndarray::array;

    fn table() -> EnergyDependentTablePsf {
        let energy_axis =
            MapAxis::from_edges(vec![1.0, 10.0, 100.0], "energy_true", AxisUnit::TeV, Interp::Log)
                .unwrap();
        let rad_axis =
            MapAxis::from_edges(vec![0.0, 0.1, 0.2, 0.3], "rad", AxisUnit::Degree, Interp::Lin)
                .unwrap();
        EnergyDependentTablePsf::new(
            energy_axis,
            rad_axis,
            array![[30.0, 20.0, 10.0], [60.0, 40.0, 20.0]],
            Some(array![1.0, 3.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_at_nodes() {
        let table = table();
        let centers = table.energy_axis().center();
        assert_relative_eq!(
            table.evaluate(tev(centers[0]), deg(0.05)),
            30.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            table.evaluate(tev(centers[1]), deg(0.15)),
            40.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_evaluate_interpolates_log_energy() {
        let table = table();
        // 10 TeV sits halfway between the centres in log space
        assert_relative_eq!(table.evaluate(tev(10.0), deg(0.05)), 45.0, epsilon = 1e-9);
        assert_relative_eq!(table.evaluate(tev(10.0), deg(0.1)), 37.5, epsilon = 1e-9);
    }

    #[test]
    fn test_exposure_at() {
        let table = table();
        assert_relative_eq!(table.exposure_at(tev(10.0)).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shape_mismatch() {
        let t = table();
        let result = EnergyDependentTablePsf::new(
            t.energy_axis().clone(),
            t.rad_axis().clone(),
            Array2::zeros((3, 3)),
            None,
        );
        assert!(matches!(result, Err(PsfError::InvalidGeometry(_))));
    }

    #[test]
    fn test_default_exposure() {
        let t = table();
        let table = EnergyDependentTablePsf::new(
            t.energy_axis().clone(),
            t.rad_axis().clone(),
            t.psf_value().clone(),
            None,
        )
        .unwrap();
        assert_eq!(table.exposure(), &array![1.0, 1.0]);
    }
}

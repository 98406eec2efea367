//! Point-spread function models.

use gamma_maps::units::AxisUnit;
use gamma_maps::{Interp, MapAxis, MapError};

mod gauss;
mod kernel;
mod map;
mod table;

pub use gauss::Gauss2dPdf;
pub use kernel::PsfKernel;
pub use map::{PsfMap, EXPOSURE_UNIT, PSF_UNIT};
pub use table::EnergyDependentTablePsf;

/// Offset axis from 0 to 0.66 degrees in 66 linear bins
pub fn default_rad_axis() -> Result<MapAxis, MapError> {
    MapAxis::from_bounds(0.0, 0.66, 66, "rad", AxisUnit::Degree, Interp::Lin)
}

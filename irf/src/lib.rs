//! Instrument response functions for gamma-ray analysis.
//!
//! The centre of this crate is [`PsfMap`], a point-spread function stored
//! on a sky map with `rad` and `energy_true` axes. It answers containment
//! questions, produces normalised kernels for convolution, draws
//! reconstructed event positions and collapses itself over regions or
//! energy.
//!
//! # Example
//!
//! ```rust
//! use gamma_irf::{KernelConfig, PsfMap};
//! use gamma_maps::units::{deg, tev};
//! use gamma_maps::{MapAxes, MapAxis, MapCoord, Projection, SkyCoord, WcsGeom};
//!
//! # fn main() -> Result<(), gamma_irf::PsfError> {
//! let energy = MapAxis::from_energy_bounds(tev(1.0), tev(10.0), 3, "energy_true")?;
//! let psf = PsfMap::from_gauss(energy.clone(), None, &[deg(0.1)])?;
//!
//! let coord = MapCoord::new(SkyCoord::new(0.0, 0.0)).with_axis("energy_true", 2.0);
//! let r68 = psf.containment_radius(0.68, &coord)?;
//! assert!(r68 > deg(0.14) && r68 < deg(0.16));
//!
//! let geom = WcsGeom::create(
//!     SkyCoord::new(0.0, 0.0),
//!     0.02,
//!     (41, 41),
//!     Projection::Tan,
//!     MapAxes::new(vec![energy])?,
//! )?;
//! let kernel = psf.get_psf_kernel(&SkyCoord::new(0.0, 0.0), &geom, &KernelConfig::default())?;
//! assert_eq!(kernel.plane_sums().len(), 3);
//! # Ok(())
//! # }
//! ```

use gamma_maps::{InterpError, MapError};
use thiserror::Error;

pub mod config;
pub mod integrate;
pub mod psf;
pub mod spectral;

pub use config::KernelConfig;
pub use integrate::TrapezoidError;
pub use psf::{default_rad_axis, EnergyDependentTablePsf, Gauss2dPdf, PsfKernel, PsfMap};
pub use spectral::{spectral_weights, PowerLawSpectralModel, SpectralModel};

/// Errors raised by response-function operations.
#[derive(Debug, Error)]
pub enum PsfError {
    #[error("Containment fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("Invalid PSF geometry: {0}")]
    InvalidGeometry(String),

    #[error("An exposure map is required for {0}")]
    MissingExposure(&'static str),

    #[error("Oversampling factor must be positive")]
    InvalidFactor,

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Interp(#[from] InterpError),

    #[error(transparent)]
    Integration(#[from] TrapezoidError),
}

pub type Result<T> = std::result::Result<T, PsfError>;

//! Sky maps for gamma-ray analysis.
//!
//! This crate provides the map layer the instrument-response code is built
//! on: binned axes, sky coordinates, WCS pixel geometry, N-dimensional maps
//! with interpolation and resampling, region reduction and reproducible
//! random sampling.
//!
//! # Example
//!
//! ```rust
//! use gamma_maps::{units::tev, Map, MapAxes, MapAxis, MapCoord, Projection, SkyCoord, WcsGeom};
//! use gamma_maps::InterpOptions;
//!
//! # fn main() -> Result<(), gamma_maps::MapError> {
//! let energy = MapAxis::from_energy_bounds(tev(0.1), tev(10.0), 4, "energy_true")?;
//! let geom = WcsGeom::create(
//!     SkyCoord::new(83.63, 22.01),
//!     0.05,
//!     (21, 21),
//!     Projection::Tan,
//!     MapAxes::new(vec![energy])?,
//! )?;
//! let map = Map::filled(geom, 2.0, "cm-2 s-1");
//!
//! let coord = MapCoord::new(SkyCoord::new(83.6, 22.0)).with_axis("energy_true", 1.0);
//! let value = map.interp_by_coord(&coord, &InterpOptions::default())?;
//! assert!((value - 2.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod axis;
pub mod coord;
pub mod geom;
pub mod interp;
pub mod map;
pub mod random;
pub mod region;
pub mod units;

pub use axis::{Interp, MapAxes, MapAxis};
pub use coord::{MapCoord, SkyCoord};
pub use geom::{Projection, WcsGeom};
pub use interp::InterpError;
pub use map::{InterpMethod, InterpOptions, Map};
pub use random::{get_random_state, InverseCdfSampler, RandomState};
pub use region::{Reduce, Region};
pub use units::AxisUnit;

/// Errors raised by map construction and map operations.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid axis '{name}': {reason}")]
    InvalidAxis { name: String, reason: String },

    #[error("Axis '{0}' not found")]
    MissingAxis(String),

    #[error("Duplicate axis name '{0}'")]
    DuplicateAxis(String),

    #[error("Missing required coordinate '{0}'")]
    MissingCoordinate(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Data shape {found:?} does not match geometry shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Cannot downsample {npix:?} pixels by a factor of {factor}")]
    NotDivisible { npix: (usize, usize), factor: usize },

    #[error(transparent)]
    Interp(#[from] InterpError),
}

pub type Result<T> = std::result::Result<T, MapError>;

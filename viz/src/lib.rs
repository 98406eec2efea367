//! Visualization helpers for gamma-ray maps and tables.
//!
//! Nothing here draws axes or figures. Each helper turns analysis products
//! into plain data ready for a plotting or image backend:
//!
//! * [`map_to_rgb`] composes a three-band map into an 8-bit RGB image with
//!   the Lupton asinh stretch.
//! * [`smooth_contour`] resamples a closed contour through a periodic cubic
//!   spline.
//! * [`ThetaSquaredTable::series`] prepares the error-bar series of a
//!   theta-squared distribution.

use thiserror::Error;

pub mod contour;
pub mod rgb;
pub mod theta2;

pub use contour::{smooth_contour, DEFAULT_CONTOUR_SAMPLES};
pub use rgb::{make_lupton_rgb, map_to_rgb, LuptonParams};
pub use theta2::{ThetaSquaredRow, ThetaSquaredSeries, ThetaSquaredTable};

#[derive(Debug, Error)]
pub enum VizError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid contour: {0}")]
    InvalidContour(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Map(#[from] gamma_maps::MapError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;

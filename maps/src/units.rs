//! Unit handling for axis coordinates.
//!
//! Map axes store plain `f64` values in a fixed unit per axis (degrees for
//! angular axes, TeV for energy axes). Public APIs that accept physical
//! quantities take `uom` types and convert at the boundary with the helpers
//! below, so a caller can pass `Energy::new::<gigaelectronvolt>(300.0)` and
//! get the same lookup as `tev(0.3)`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uom::si::angle::{degree, radian};
use uom::si::energy::teraelectronvolt;
pub use uom::si::f64::{Angle, Energy};

/// Unit in which the values of a [`crate::MapAxis`] are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisUnit {
    Dimensionless,
    Degree,
    TeV,
}

impl AxisUnit {
    /// Short unit string, matching the usual astronomy spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            AxisUnit::Dimensionless => "",
            AxisUnit::Degree => "deg",
            AxisUnit::TeV => "TeV",
        }
    }
}

impl fmt::Display for AxisUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Angle from a value in degrees
pub fn deg(value: f64) -> Angle {
    Angle::new::<degree>(value)
}

/// Energy from a value in TeV
pub fn tev(value: f64) -> Energy {
    Energy::new::<teraelectronvolt>(value)
}

/// Angle value in degrees
pub fn to_deg(angle: Angle) -> f64 {
    angle.get::<degree>()
}

/// Angle value in radians
pub fn to_rad(angle: Angle) -> f64 {
    angle.get::<radian>()
}

/// Energy value in TeV
pub fn to_tev(energy: Energy) -> f64 {
    energy.get::<teraelectronvolt>()
}

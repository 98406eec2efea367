//! Sky coordinates and map coordinates.
//!
//! [`SkyCoord`] is a direction on the celestial sphere in degrees with the
//! great-circle helpers the PSF code needs (angular separation, position
//! angle, directional offset). [`MapCoord`] pairs a sky direction with
//! named coordinates along the non-spatial axes of a map.

use std::collections::BTreeMap;

use crate::{MapError, Result};

/// Wrap a longitude into `[0, 360)` degrees
pub(crate) fn wrap_360(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap a longitude difference into `[-180, 180)` degrees
pub(crate) fn wrap_180(dlon: f64) -> f64 {
    wrap_360(dlon + 180.0) - 180.0
}

/// A direction on the sky, longitude and latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    lon: f64,
    lat: f64,
}

impl SkyCoord {
    /// Longitude is wrapped into `[0, 360)`.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon: wrap_360(lon),
            lat,
        }
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Angular separation in degrees.
    ///
    /// Uses the Vincenty formula, which stays accurate for both very small
    /// and antipodal separations.
    pub fn separation(&self, other: &SkyCoord) -> f64 {
        let (lon1, lat1) = (self.lon.to_radians(), self.lat.to_radians());
        let (lon2, lat2) = (other.lon.to_radians(), other.lat.to_radians());
        let dlon = lon2 - lon1;

        let num1 = lat2.cos() * dlon.sin();
        let num2 = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        let denom = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();

        num1.hypot(num2).atan2(denom).to_degrees()
    }

    /// Position angle of `other` relative to `self`, degrees east of north
    /// in `[0, 360)`.
    pub fn position_angle(&self, other: &SkyCoord) -> f64 {
        let (lon1, lat1) = (self.lon.to_radians(), self.lat.to_radians());
        let (lon2, lat2) = (other.lon.to_radians(), other.lat.to_radians());
        let dlon = lon2 - lon1;

        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        let y = dlon.sin() * lat2.cos();
        wrap_360(y.atan2(x).to_degrees())
    }

    /// Point reached by moving `separation` degrees along the great circle
    /// leaving `self` at `position_angle` degrees east of north.
    pub fn directional_offset_by(&self, position_angle: f64, separation: f64) -> SkyCoord {
        let (lon1, lat1) = (self.lon.to_radians(), self.lat.to_radians());
        let pa = position_angle.to_radians();
        let sep = separation.to_radians();

        let lat2 = (lat1.sin() * sep.cos() + lat1.cos() * sep.sin() * pa.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let dlon = (pa.sin() * sep.sin() * lat1.cos()).atan2(sep.cos() - lat1.sin() * lat2.sin());

        SkyCoord::new((lon1 + dlon).to_degrees(), lat2.to_degrees())
    }
}

/// Coordinate of a single point in a map: a sky direction plus one value
/// per non-spatial axis, keyed by axis name.
#[derive(Debug, Clone, PartialEq)]
pub struct MapCoord {
    skycoord: SkyCoord,
    axes: BTreeMap<String, f64>,
}

impl MapCoord {
    pub fn new(skycoord: SkyCoord) -> Self {
        Self {
            skycoord,
            axes: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a non-spatial coordinate
    pub fn with_axis(mut self, name: &str, value: f64) -> Self {
        self.axes.insert(name.to_string(), value);
        self
    }

    pub fn skycoord(&self) -> &SkyCoord {
        &self.skycoord
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.axes.get(name).copied()
    }

    /// Look up a non-spatial coordinate, failing with
    /// `MapError::MissingCoordinate` if absent
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| MapError::MissingCoordinate(name.to_string()))
    }
}

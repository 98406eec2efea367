//! WCS pixel geometry of sky maps.
//!
//! A [`WcsGeom`] is a rectangular grid of square pixels around a reference
//! direction plus an ordered list of non-spatial axes. The reference
//! direction sits at the geometric centre of the pixel grid, which keeps
//! the centre fixed under [`WcsGeom::upsample`] and
//! [`WcsGeom::downsample`].
//!
//! # Conventions
//!
//! - Pixel `(0, 0)` is the centre of the first pixel; pixel edges sit at
//!   half-integer coordinates.
//! - Longitude increases towards smaller `x` (east to the left), latitude
//!   increases with `y`.
//! - Map data is indexed `[axes reversed..., y, x]`.
//!
//! # Projections
//!
//! - [`Projection::Car`]: plate carrée, longitude/latitude offsets from the
//!   reference map linearly onto the grid. Suited to all-sky maps.
//! - [`Projection::Tan`]: gnomonic tangent-plane projection, the usual
//!   choice for small fields such as PSF kernels.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::axis::MapAxes;
use crate::coord::{wrap_180, SkyCoord};
use crate::{MapError, Result};

/// Sky projection of a [`WcsGeom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    Car,
    Tan,
}

/// Pixel grid on the sky with non-spatial axes.
#[derive(Debug, Clone, PartialEq)]
pub struct WcsGeom {
    npix: (usize, usize),
    binsz: f64,
    center: SkyCoord,
    projection: Projection,
    axes: MapAxes,
}

impl WcsGeom {
    /// Create a geometry from its pixel count.
    ///
    /// # Arguments
    /// * `center` - Reference direction at the centre of the grid
    /// * `binsz` - Pixel size in degrees
    /// * `npix` - Number of pixels `(nx, ny)`
    /// * `projection` - Sky projection
    /// * `axes` - Non-spatial axes
    pub fn create(
        center: SkyCoord,
        binsz: f64,
        npix: (usize, usize),
        projection: Projection,
        axes: MapAxes,
    ) -> Result<Self> {
        if npix.0 == 0 || npix.1 == 0 {
            return Err(MapError::InvalidGeometry(format!(
                "pixel counts must be positive, got {npix:?}"
            )));
        }
        if !(binsz.is_finite() && binsz > 0.0) {
            return Err(MapError::InvalidGeometry(format!(
                "pixel size must be positive, got {binsz}"
            )));
        }

        Ok(Self {
            npix,
            binsz,
            center,
            projection,
            axes,
        })
    }

    /// Create a geometry covering `width` degrees `(lon, lat)`, rounding the
    /// pixel count to the nearest integer.
    pub fn from_width(
        center: SkyCoord,
        binsz: f64,
        width: (f64, f64),
        projection: Projection,
        axes: MapAxes,
    ) -> Result<Self> {
        let nx = (width.0 / binsz).round().max(1.0) as usize;
        let ny = (width.1 / binsz).round().max(1.0) as usize;
        Self::create(center, binsz, (nx, ny), projection, axes)
    }

    pub fn npix(&self) -> (usize, usize) {
        self.npix
    }

    /// Pixel size in degrees
    pub fn binsz(&self) -> f64 {
        self.binsz
    }

    pub fn center_skydir(&self) -> SkyCoord {
        self.center
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn axes(&self) -> &MapAxes {
        &self.axes
    }

    /// Angular width `(lon, lat)` in degrees
    pub fn width(&self) -> (f64, f64) {
        (
            self.npix.0 as f64 * self.binsz,
            self.npix.1 as f64 * self.binsz,
        )
    }

    pub fn is_allsky(&self) -> bool {
        let (w_lon, w_lat) = self.width();
        self.projection == Projection::Car && w_lon >= 360.0 - 1e-9 && w_lat >= 180.0 - 1e-9
    }

    /// Data shape: non-spatial axes in reverse order followed by `(ny, nx)`
    pub fn data_shape(&self) -> Vec<usize> {
        let mut shape = self.axes.shape();
        shape.push(self.npix.1);
        shape.push(self.npix.0);
        shape
    }

    fn crpix(&self) -> (f64, f64) {
        (
            (self.npix.0 as f64 - 1.0) / 2.0,
            (self.npix.1 as f64 - 1.0) / 2.0,
        )
    }

    /// Intermediate world coordinates (degrees) of a sky direction
    fn project(&self, coord: &SkyCoord) -> (f64, f64) {
        match self.projection {
            Projection::Car => (
                wrap_180(coord.lon() - self.center.lon()),
                coord.lat() - self.center.lat(),
            ),
            Projection::Tan => {
                let (a, d) = (coord.lon().to_radians(), coord.lat().to_radians());
                let (a0, d0) = (self.center.lon().to_radians(), self.center.lat().to_radians());
                let cos_c = d0.sin() * d.sin() + d0.cos() * d.cos() * (a - a0).cos();
                if cos_c <= 0.0 {
                    // behind the tangent plane
                    return (f64::NAN, f64::NAN);
                }
                let xi = d.cos() * (a - a0).sin() / cos_c;
                let eta = (d0.cos() * d.sin() - d0.sin() * d.cos() * (a - a0).cos()) / cos_c;
                (xi.to_degrees(), eta.to_degrees())
            }
        }
    }

    fn deproject(&self, xi: f64, eta: f64) -> SkyCoord {
        match self.projection {
            Projection::Car => SkyCoord::new(self.center.lon() + xi, self.center.lat() + eta),
            Projection::Tan => {
                let (x, y) = (xi.to_radians(), eta.to_radians());
                let rho = x.hypot(y);
                if rho == 0.0 {
                    return self.center;
                }
                let (a0, d0) = (self.center.lon().to_radians(), self.center.lat().to_radians());
                let c = rho.atan();
                let (sin_c, cos_c) = c.sin_cos();
                let dec = (cos_c * d0.sin() + y * sin_c * d0.cos() / rho)
                    .clamp(-1.0, 1.0)
                    .asin();
                let ra = a0 + (x * sin_c).atan2(rho * d0.cos() * cos_c - y * d0.sin() * sin_c);
                SkyCoord::new(ra.to_degrees(), dec.to_degrees())
            }
        }
    }

    /// Fractional pixel coordinates `(x, y)` of a sky direction
    pub fn coord_to_pix(&self, coord: &SkyCoord) -> (f64, f64) {
        let (xi, eta) = self.project(coord);
        let (cx, cy) = self.crpix();
        (cx - xi / self.binsz, cy + eta / self.binsz)
    }

    /// Sky direction of fractional pixel coordinates `(x, y)`
    pub fn pix_to_coord(&self, x: f64, y: f64) -> SkyCoord {
        let (cx, cy) = self.crpix();
        self.deproject(-(x - cx) * self.binsz, (y - cy) * self.binsz)
    }

    /// Whether pixel coordinates fall inside the grid, both edges
    /// inclusive
    pub fn contains_pix(&self, x: f64, y: f64) -> bool {
        let inside = |p: f64, n: usize| p >= -0.5 && p <= n as f64 - 0.5;
        inside(x, self.npix.0) && inside(y, self.npix.1)
    }

    /// Sky directions of all pixel centres, shape `(ny, nx)`
    pub fn get_coord(&self) -> Array2<SkyCoord> {
        Array2::from_shape_fn((self.npix.1, self.npix.0), |(y, x)| {
            self.pix_to_coord(x as f64, y as f64)
        })
    }

    /// Angular separation (degrees) of every pixel centre from `center`,
    /// shape `(ny, nx)`
    pub fn separation(&self, center: &SkyCoord) -> Array2<f64> {
        self.get_coord().mapv(|coord| coord.separation(center))
    }

    /// Same pixel grid without non-spatial axes
    pub fn to_image(&self) -> Self {
        self.with_axes(MapAxes::default())
    }

    pub fn with_axes(&self, axes: MapAxes) -> Self {
        Self {
            axes,
            ..self.clone()
        }
    }

    /// Split every pixel into `factor × factor` pixels
    pub fn upsample(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        Self {
            npix: (self.npix.0 * factor, self.npix.1 * factor),
            binsz: self.binsz / factor as f64,
            ..self.clone()
        }
    }

    /// Merge blocks of `factor × factor` pixels.
    ///
    /// # Errors
    /// * `MapError::NotDivisible` - the pixel counts are not multiples of
    ///   `factor`
    pub fn downsample(&self, factor: usize) -> Result<Self> {
        if factor == 0 || self.npix.0 % factor != 0 || self.npix.1 % factor != 0 {
            return Err(MapError::NotDivisible {
                npix: self.npix,
                factor,
            });
        }

        Ok(Self {
            npix: (self.npix.0 / factor, self.npix.1 / factor),
            binsz: self.binsz * factor as f64,
            ..self.clone()
        })
    }

    /// Replace the named axis by a single bin spanning its full range
    pub fn squash(&self, axis_name: &str) -> Result<Self> {
        let squashed = self.axes.require(axis_name)?.squash();
        Ok(self.with_axes(self.axes.replace(squashed)?))
    }

    /// Remove the named axis
    pub fn drop(&self, axis_name: &str) -> Result<Self> {
        Ok(self.with_axes(self.axes.drop(axis_name)?))
    }

    /// Square geometry with an odd number of pixels per side, centred on
    /// the same direction.
    ///
    /// The side covers `2 * max_radius` degrees, or the largest width of
    /// this geometry when no radius is given, rounded up to the next odd
    /// pixel count so that the centre direction falls on a pixel centre.
    pub fn to_odd_npix(&self, max_radius: Option<f64>) -> Self {
        let width = match max_radius {
            Some(radius) => 2.0 * radius,
            None => {
                let (w_lon, w_lat) = self.width();
                w_lon.max(w_lat)
            }
        };

        let mut npix = ((width / self.binsz) - 1e-9).ceil().max(1.0) as usize;
        if npix % 2 == 0 {
            npix += 1;
        }

        log::debug!(
            "odd geometry for width {width:.4} deg: {npix}x{npix} pixels of {:.4} deg",
            self.binsz
        );

        Self {
            npix: (npix, npix),
            ..self.clone()
        }
    }
}

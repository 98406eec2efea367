//! Binned non-spatial map axes.
//!
//! A [`MapAxis`] is an ordered set of bin edges with a name, a unit and an
//! interpolation mode. Bin centers are derived from the edges and never
//! stored independently, so the two can not drift apart.
//!
//! # Pixel convention
//!
//! Pixel coordinate `i` is the center of bin `i`; edge `i` sits at pixel
//! `i - 0.5`. Conversion between coordinate and pixel is piecewise linear
//! in the interpolation space of the axis (the logarithm for
//! [`Interp::Log`]) and extrapolates linearly outside the edges.

use serde::{Deserialize, Serialize};
use uom::si::f64::Energy;

use crate::interp::interp_unchecked;
use crate::units::{to_tev, AxisUnit};
use crate::{MapError, Result};

/// Interpolation space of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interp {
    Lin,
    Log,
}

impl Interp {
    fn forward(&self, value: f64) -> f64 {
        match self {
            Interp::Lin => value,
            Interp::Log => value.ln(),
        }
    }

    fn inverse(&self, value: f64) -> f64 {
        match self {
            Interp::Lin => value,
            Interp::Log => value.exp(),
        }
    }
}

/// A named, binned axis.
#[derive(Debug, Clone, PartialEq)]
pub struct MapAxis {
    name: String,
    edges: Vec<f64>,
    unit: AxisUnit,
    interp: Interp,
}

impl MapAxis {
    /// Create an axis from explicit bin edges.
    ///
    /// # Errors
    /// * `MapError::InvalidAxis` - fewer than two edges, edges not strictly
    ///   increasing, or non-positive edges on a logarithmic axis
    pub fn from_edges(edges: Vec<f64>, name: &str, unit: AxisUnit, interp: Interp) -> Result<Self> {
        let invalid = |reason: &str| MapError::InvalidAxis {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if edges.len() < 2 {
            return Err(invalid("at least two bin edges are required"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid("bin edges must be finite"));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("bin edges must be strictly increasing"));
        }
        if interp == Interp::Log && edges[0] <= 0.0 {
            return Err(invalid("logarithmic axis requires positive edges"));
        }

        Ok(Self {
            name: name.to_string(),
            edges,
            unit,
            interp,
        })
    }

    /// Create an axis of `nbin` bins equally spaced in interpolation space.
    pub fn from_bounds(
        lo: f64,
        hi: f64,
        nbin: usize,
        name: &str,
        unit: AxisUnit,
        interp: Interp,
    ) -> Result<Self> {
        if nbin == 0 {
            return Err(MapError::InvalidAxis {
                name: name.to_string(),
                reason: "number of bins must be positive".to_string(),
            });
        }

        let (a, b) = (interp.forward(lo), interp.forward(hi));
        let edges = (0..=nbin)
            .map(|i| interp.inverse(a + (b - a) * i as f64 / nbin as f64))
            .collect();
        Self::from_edges(edges, name, unit, interp)
    }

    /// Logarithmic energy axis in TeV.
    ///
    /// ```rust
    /// use gamma_maps::{units::tev, MapAxis};
    ///
    /// let axis = MapAxis::from_energy_bounds(tev(0.1), tev(10.0), 2, "energy_true").unwrap();
    /// assert_eq!(axis.nbin(), 2);
    /// assert!((axis.center()[0] - 0.316227766).abs() < 1e-6);
    /// ```
    pub fn from_energy_bounds(
        e_min: Energy,
        e_max: Energy,
        nbin: usize,
        name: &str,
    ) -> Result<Self> {
        Self::from_bounds(
            to_tev(e_min),
            to_tev(e_max),
            nbin,
            name,
            AxisUnit::TeV,
            Interp::Log,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn unit(&self) -> AxisUnit {
        self.unit
    }

    pub fn interp(&self) -> Interp {
        self.interp
    }

    pub fn nbin(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin centers (arithmetic mean for linear axes, geometric mean for
    /// logarithmic axes)
    pub fn center(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|w| {
                let mid = (self.interp.forward(w[0]) + self.interp.forward(w[1])) / 2.0;
                self.interp.inverse(mid)
            })
            .collect()
    }

    pub fn bin_width(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn pix_nodes(&self) -> (Vec<f64>, Vec<f64>) {
        let coords = self.edges.iter().map(|&e| self.interp.forward(e)).collect();
        let pix = (0..self.edges.len()).map(|i| i as f64 - 0.5).collect();
        (coords, pix)
    }

    /// Convert an axis coordinate to a fractional pixel coordinate
    pub fn coord_to_pix(&self, coord: f64) -> f64 {
        let (coords, pix) = self.pix_nodes();
        interp_unchecked(self.interp.forward(coord), &coords, &pix)
    }

    /// Convert a fractional pixel coordinate to an axis coordinate
    pub fn pix_to_coord(&self, pix: f64) -> f64 {
        let (coords, pixels) = self.pix_nodes();
        self.interp
            .inverse(interp_unchecked(pix, &pixels, &coords))
    }

    /// Split every bin into `factor` bins, equally spaced in interpolation
    /// space.
    pub fn upsample(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        let mut edges = Vec::with_capacity(self.nbin() * factor + 1);
        for w in self.edges.windows(2) {
            let (a, b) = (self.interp.forward(w[0]), self.interp.forward(w[1]));
            for k in 0..factor {
                edges.push(self.interp.inverse(a + (b - a) * k as f64 / factor as f64));
            }
        }
        edges.push(self.edges[self.edges.len() - 1]);

        Self {
            edges,
            ..self.clone()
        }
    }

    /// A single bin spanning the whole axis.
    pub fn squash(&self) -> Self {
        Self {
            edges: vec![self.edges[0], self.edges[self.edges.len() - 1]],
            ..self.clone()
        }
    }
}

/// Ordered list of uniquely named non-spatial axes.
///
/// The first axis varies fastest in map data, i.e. the data shape lists
/// the axes in reverse order followed by the spatial `(ny, nx)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapAxes(Vec<MapAxis>);

impl MapAxes {
    pub fn new(axes: Vec<MapAxis>) -> Result<Self> {
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|other| other.name() == axis.name()) {
                return Err(MapError::DuplicateAxis(axis.name().to_string()));
            }
        }
        Ok(Self(axes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapAxis> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&MapAxis> {
        self.0.iter().find(|axis| axis.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|axis| axis.name() == name)
    }

    /// Look up an axis, failing with `MapError::MissingAxis` if absent
    pub fn require(&self, name: &str) -> Result<&MapAxis> {
        self.get(name)
            .ok_or_else(|| MapError::MissingAxis(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|axis| axis.name()).collect()
    }

    /// Replace the axis carrying the same name as `axis`.
    pub fn replace(&self, axis: MapAxis) -> Result<Self> {
        let idx = self
            .index_of(axis.name())
            .ok_or_else(|| MapError::MissingAxis(axis.name().to_string()))?;
        let mut axes = self.0.clone();
        axes[idx] = axis;
        Ok(Self(axes))
    }

    pub fn drop(&self, name: &str) -> Result<Self> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| MapError::MissingAxis(name.to_string()))?;
        let mut axes = self.0.clone();
        axes.remove(idx);
        Ok(Self(axes))
    }

    /// Data shape of the non-spatial part (axes in reverse order)
    pub fn shape(&self) -> Vec<usize> {
        self.0.iter().rev().map(|axis| axis.nbin()).collect()
    }
}

impl std::ops::Index<usize> for MapAxes {
    type Output = MapAxis;

    fn index(&self, index: usize) -> &MapAxis {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a MapAxes {
    type Item = &'a MapAxis;
    type IntoIter = std::slice::Iter<'a, MapAxis>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

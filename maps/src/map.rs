//! N-dimensional sky maps.
//!
//! A [`Map`] couples a [`WcsGeom`] with an `ndarray` data cube whose shape
//! is the geometry's data shape, and a unit label. Maps are never resized
//! in place: resampling, summation and region reduction return new maps.

use ndarray::{ArrayD, ArrayViewMutD, Axis, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

use crate::coord::MapCoord;
use crate::geom::WcsGeom;
use crate::region::{Reduce, Region};
use crate::{MapError, Result};

/// Interpolation scheme used by [`Map::interp_by_coord`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpMethod {
    #[default]
    Linear,
    Nearest,
}

/// Interpolation settings.
///
/// `fill_value` decides what happens outside the data: `Some(v)` returns
/// `v` for any coordinate more than half a pixel beyond the first or last
/// pixel centre of any dimension, `None` extrapolates linearly from the
/// outermost pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpOptions {
    pub method: InterpMethod,
    pub fill_value: Option<f64>,
}

impl InterpOptions {
    /// Linear interpolation with a fixed out-of-bounds value
    pub fn with_fill_value(fill_value: f64) -> Self {
        Self {
            method: InterpMethod::Linear,
            fill_value: Some(fill_value),
        }
    }
}

/// Data cube on a sky geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    geom: WcsGeom,
    data: ArrayD<f64>,
    unit: String,
}

impl Map {
    /// Zero-filled map on `geom`
    pub fn from_geom(geom: WcsGeom, unit: &str) -> Self {
        Self::filled(geom, 0.0, unit)
    }

    pub fn filled(geom: WcsGeom, value: f64, unit: &str) -> Self {
        let data = ArrayD::from_elem(IxDyn(&geom.data_shape()), value);
        Self {
            geom,
            data,
            unit: unit.to_string(),
        }
    }

    /// Map from existing data.
    ///
    /// # Errors
    /// * `MapError::ShapeMismatch` - `data` does not have the geometry's
    ///   data shape
    pub fn from_geom_data(geom: WcsGeom, data: ArrayD<f64>, unit: &str) -> Result<Self> {
        let expected = geom.data_shape();
        if data.shape() != expected.as_slice() {
            return Err(MapError::ShapeMismatch {
                expected,
                found: data.shape().to_vec(),
            });
        }

        Ok(Self {
            geom,
            data,
            unit: unit.to_string(),
        })
    }

    /// New map on the same geometry and unit with different data
    pub fn with_data(&self, data: ArrayD<f64>) -> Result<Self> {
        Self::from_geom_data(self.geom.clone(), data, &self.unit)
    }

    pub fn geom(&self) -> &WcsGeom {
        &self.geom
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Mutable view of the data; the shape cannot change through it
    pub fn data_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.data.view_mut()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Fractional pixel coordinates of `coord` in data order
    /// (`[axes reversed..., y, x]`).
    ///
    /// # Errors
    /// * `MapError::MissingCoordinate` - `coord` lacks a value for one of
    ///   the geometry's axes
    pub fn coord_to_pix(&self, coord: &MapCoord) -> Result<Vec<f64>> {
        let mut pix = Vec::with_capacity(self.data.ndim());
        for axis in self.geom.axes().iter().rev() {
            pix.push(axis.coord_to_pix(coord.require(axis.name())?));
        }

        let (x, y) = self.geom.coord_to_pix(coord.skycoord());
        pix.push(y);
        pix.push(x);
        Ok(pix)
    }

    /// Interpolate the map at a coordinate.
    ///
    /// Linear interpolation is multilinear over every dimension of the
    /// data, spatial and non-spatial alike, in pixel space (so logarithmic
    /// axes interpolate in log coordinate).
    pub fn interp_by_coord(&self, coord: &MapCoord, options: &InterpOptions) -> Result<f64> {
        let pix = self.coord_to_pix(coord)?;
        Ok(self.interp_by_pix(&pix, options))
    }

    /// Nearest-pixel value, NaN outside the map
    pub fn get_by_coord(&self, coord: &MapCoord) -> Result<f64> {
        let options = InterpOptions {
            method: InterpMethod::Nearest,
            fill_value: Some(f64::NAN),
        };
        self.interp_by_coord(coord, &options)
    }

    /// Interpolate at fractional pixel coordinates given in data order
    pub fn interp_by_pix(&self, pix: &[f64], options: &InterpOptions) -> f64 {
        let shape = self.data.shape();

        if let Some(fill) = options.fill_value {
            let outside = pix
                .iter()
                .zip(shape)
                .any(|(&p, &n)| !(p >= -0.5 && p <= n as f64 - 0.5));
            if outside {
                return fill;
            }
        }

        match options.method {
            InterpMethod::Nearest => {
                let idx: Vec<usize> = pix
                    .iter()
                    .zip(shape)
                    .map(|(&p, &n)| p.round().clamp(0.0, (n - 1) as f64) as usize)
                    .collect();
                self.data[IxDyn(&idx)]
            }
            InterpMethod::Linear => self.interp_linear(pix),
        }
    }

    fn interp_linear(&self, pix: &[f64]) -> f64 {
        let shape = self.data.shape();
        let ndim = shape.len();

        // lower corner and fractional offset per dimension; single-bin
        // dimensions are constant
        let mut lower = vec![0usize; ndim];
        let mut frac = vec![0.0; ndim];
        for d in 0..ndim {
            if shape[d] > 1 {
                let i0 = (pix[d].floor() as isize).clamp(0, shape[d] as isize - 2) as usize;
                lower[d] = i0;
                frac[d] = pix[d] - i0 as f64;
            }
        }

        let mut value = 0.0;
        let mut idx = vec![0usize; ndim];
        'corners: for corner in 0..(1usize << ndim) {
            let mut weight = 1.0;
            for d in 0..ndim {
                let upper = (corner >> d) & 1 == 1;
                if shape[d] == 1 {
                    if upper {
                        continue 'corners;
                    }
                    idx[d] = 0;
                    continue;
                }
                idx[d] = lower[d] + upper as usize;
                weight *= if upper { frac[d] } else { 1.0 - frac[d] };
            }
            if weight != 0.0 {
                value += weight * self.data[IxDyn(&idx)];
            }
        }
        value
    }

    /// Merge blocks of `factor × factor` spatial pixels.
    ///
    /// With `preserve_counts` the block values are summed, so the total of
    /// the map is unchanged; otherwise they are averaged.
    pub fn downsample(&self, factor: usize, preserve_counts: bool) -> Result<Map> {
        let geom = self.geom.downsample(factor)?;
        let ndim = self.data.ndim();

        let mut data = ArrayD::<f64>::zeros(IxDyn(&geom.data_shape()));
        for (idx, &value) in self.data.indexed_iter() {
            let mut target = idx.slice().to_vec();
            target[ndim - 2] /= factor;
            target[ndim - 1] /= factor;
            data[IxDyn(&target)] += value;
        }

        if !preserve_counts {
            let norm = (factor * factor) as f64;
            data.mapv_inplace(|v| v / norm);
        }

        Map::from_geom_data(geom, data, &self.unit)
    }

    /// Sum over a non-spatial axis.
    ///
    /// With `keepdims` the axis is kept with a single bin spanning its full
    /// range, otherwise it is removed from the geometry.
    pub fn sum_over_axis(&self, axis_name: &str, keepdims: bool) -> Result<Map> {
        let axes = self.geom.axes();
        let idx = axes
            .index_of(axis_name)
            .ok_or_else(|| MapError::MissingAxis(axis_name.to_string()))?;
        let data_axis = Axis(axes.len() - 1 - idx);

        let summed = self.data.sum_axis(data_axis);
        let (geom, data) = if keepdims {
            (self.geom.squash(axis_name)?, summed.insert_axis(data_axis))
        } else {
            (self.geom.drop(axis_name)?, summed)
        };

        Map::from_geom_data(geom, data, &self.unit)
    }

    /// Reduce the spatial dimensions to a single position.
    ///
    /// A point region takes the nearest pixel (NaN when the point is
    /// outside the map). A circle region applies `reduce` to all pixels
    /// whose centres lie inside the circle. The result lives on a 1×1
    /// geometry centred on the region.
    pub fn to_region_nd_map(&self, region: &Region, reduce: Reduce) -> Result<Map> {
        let center = region.center();
        let binsz = match region {
            Region::Circle { radius, .. } if 2.0 * radius > 0.0 => 2.0 * radius,
            _ => self.geom.binsz(),
        };
        let geom = WcsGeom::create(
            center,
            binsz,
            (1, 1),
            self.geom.projection(),
            self.geom.axes().clone(),
        )?;

        let pixels: Vec<(usize, usize)> = match region {
            Region::Point(point) => {
                let (x, y) = self.geom.coord_to_pix(point);
                if self.geom.contains_pix(x, y) {
                    let (nx, ny) = self.geom.npix();
                    let nearest = |p: f64, n: usize| (p.round().max(0.0) as usize).min(n - 1);
                    vec![(nearest(y, ny), nearest(x, nx))]
                } else {
                    Vec::new()
                }
            }
            Region::Circle { .. } => self
                .geom
                .get_coord()
                .indexed_iter()
                .filter(|(_, coord)| region.contains(coord))
                .map(|(yx, _)| yx)
                .collect(),
        };
        log::debug!("reducing {} pixels to region {region:?}", pixels.len());

        let ndim = self.data.ndim();
        let data = ArrayD::from_shape_fn(IxDyn(&geom.data_shape()), |idx| {
            let mut full = idx.slice().to_vec();
            reduce.apply(pixels.iter().map(|&(y, x)| {
                full[ndim - 2] = y;
                full[ndim - 1] = x;
                self.data[IxDyn(&full)]
            }))
        });

        Map::from_geom_data(geom, data, &self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{MapAxes, MapAxis};
    use crate::coord::SkyCoord;
    use crate::geom::Projection;
    use crate::units::AxisUnit;
    use crate::Interp;
    use approx::assert_relative_eq;

    fn energy_axis() -> MapAxis {
        MapAxis::from_edges(vec![1.0, 10.0, 100.0], "energy_true", AxisUnit::TeV, Interp::Log)
            .unwrap()
    }

    fn ramp_map() -> Map {
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            1.0,
            (4, 3),
            Projection::Car,
            MapAxes::new(vec![energy_axis()]).unwrap(),
        )
        .unwrap();
        let data = ArrayD::from_shape_fn(IxDyn(&geom.data_shape()), |idx| {
            (idx[0] * 100 + idx[1] * 10 + idx[2]) as f64
        });
        Map::from_geom_data(geom, data, "").unwrap()
    }

    fn coord_at(map: &Map, x: f64, y: f64, energy: f64) -> MapCoord {
        MapCoord::new(map.geom().pix_to_coord(x, y)).with_axis("energy_true", energy)
    }

    #[test]
    fn test_shape_mismatch() {
        let map = ramp_map();
        let bad = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(matches!(
            Map::from_geom_data(map.geom().clone(), bad, ""),
            Err(MapError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_interp_at_pixel_centres() {
        let map = ramp_map();
        let centers = energy_axis().center();
        let value = map
            .interp_by_coord(&coord_at(&map, 2.0, 1.0, centers[1]), &InterpOptions::default())
            .unwrap();
        assert_relative_eq!(value, 112.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interp_between_pixels() {
        let map = ramp_map();
        let centers = energy_axis().center();
        let value = map
            .interp_by_coord(&coord_at(&map, 1.5, 0.25, centers[0]), &InterpOptions::default())
            .unwrap();
        // y contributes 10 per pixel, x 1 per pixel
        assert_relative_eq!(value, 2.5 + 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_fill_value_and_extrapolation() {
        let map = ramp_map();
        let centers = energy_axis().center();
        let outside = coord_at(&map, 4.0, 1.0, centers[0]);

        let filled = map
            .interp_by_coord(&outside, &InterpOptions::with_fill_value(-1.0))
            .unwrap();
        assert_eq!(filled, -1.0);

        let extrapolated = map
            .interp_by_coord(&outside, &InterpOptions::default())
            .unwrap();
        assert_relative_eq!(extrapolated, 14.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_coordinate() {
        let map = ramp_map();
        let coord = MapCoord::new(SkyCoord::new(0.0, 0.0));
        assert!(matches!(
            map.interp_by_coord(&coord, &InterpOptions::default()),
            Err(MapError::MissingCoordinate(name)) if name == "energy_true"
        ));
    }

    #[test]
    fn test_nearest_lookup() {
        let map = ramp_map();
        let centers = energy_axis().center();
        let value = map.get_by_coord(&coord_at(&map, 2.4, 0.6, centers[1])).unwrap();
        assert_eq!(value, 112.0);
        assert!(map
            .get_by_coord(&coord_at(&map, 7.0, 0.0, centers[1]))
            .unwrap()
            .is_nan());
    }

    #[test]
    fn test_downsample_preserves_counts() {
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            0.1,
            (6, 4),
            Projection::Tan,
            MapAxes::default(),
        )
        .unwrap();
        let data = ArrayD::from_shape_fn(IxDyn(&geom.data_shape()), |idx| (idx[0] + idx[1]) as f64);
        let map = Map::from_geom_data(geom, data, "").unwrap();

        let summed = map.downsample(2, true).unwrap();
        assert_eq!(summed.geom().npix(), (3, 2));
        assert_relative_eq!(summed.sum(), map.sum(), epsilon = 1e-9);
        assert_relative_eq!(summed.data()[[0, 0]], 0.0 + 1.0 + 1.0 + 2.0);

        let averaged = map.downsample(2, false).unwrap();
        assert_relative_eq!(averaged.data()[[0, 0]], 1.0);

        assert!(map.downsample(4, true).is_err());
    }

    #[test]
    fn test_sum_over_axis() {
        let map = ramp_map();
        let kept = map.sum_over_axis("energy_true", true).unwrap();
        assert_eq!(kept.data().shape(), &[1, 3, 4]);
        assert_eq!(kept.geom().axes()[0].nbin(), 1);
        assert_relative_eq!(kept.data()[[0, 1, 2]], 12.0 + 112.0);

        let dropped = map.sum_over_axis("energy_true", false).unwrap();
        assert_eq!(dropped.data().shape(), &[3, 4]);
        assert!(map.sum_over_axis("rad", false).is_err());
    }

    #[test]
    fn test_region_point_matches_lookup() {
        let map = ramp_map();
        let position = map.geom().pix_to_coord(3.0, 2.0);
        let reduced = map
            .to_region_nd_map(&Region::Point(position), Reduce::NanMean)
            .unwrap();
        assert_eq!(reduced.data().shape(), &[2, 1, 1]);
        assert_eq!(reduced.data()[[0, 0, 0]], 23.0);
        assert_eq!(reduced.data()[[1, 0, 0]], 123.0);
        assert_eq!(reduced.geom().center_skydir(), position);
    }

    #[test]
    fn test_region_circle_mean() {
        let map = ramp_map();
        let center = map.geom().pix_to_coord(1.0, 1.0);
        let region = Region::Circle {
            center,
            radius: 1.01,
        };
        let reduced = map.to_region_nd_map(&region, Reduce::NanMean).unwrap();
        // the centre pixel and its four neighbours
        let expected = (11.0 + 10.0 + 12.0 + 1.0 + 21.0) / 5.0;
        assert_relative_eq!(reduced.data()[[0, 0, 0]], expected, epsilon = 1e-9);
    }

    #[test]
    fn test_region_point_on_allsky_seam() {
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            180.0,
            (2, 1),
            Projection::Car,
            MapAxes::default(),
        )
        .unwrap();
        let map = Map::from_geom_data(geom, ndarray::array![[3.0, 7.0]].into_dyn(), "").unwrap();

        for lon in [179.999, 180.0, 180.001] {
            let position = SkyCoord::new(lon, 10.0);
            let reduced = map
                .to_region_nd_map(&Region::Point(position), Reduce::NanMean)
                .unwrap();
            let direct = map.get_by_coord(&MapCoord::new(position)).unwrap();
            assert_eq!(reduced.data()[[0, 0]], direct, "lon = {lon}");
        }
        let seam = map
            .to_region_nd_map(&Region::Point(SkyCoord::new(180.0, 10.0)), Reduce::NanMean)
            .unwrap();
        assert_eq!(seam.data()[[0, 0]], 7.0);
    }

    #[test]
    fn test_region_zero_radius_circle() {
        let map = ramp_map();
        let center = map.geom().pix_to_coord(2.0, 1.0);
        let region = Region::Circle {
            center,
            radius: 0.0,
        };
        let reduced = map.to_region_nd_map(&region, Reduce::NanMean).unwrap();
        assert_eq!(reduced.geom().binsz(), map.geom().binsz());
        assert_eq!(reduced.data()[[0, 0, 0]], 12.0);
    }
}

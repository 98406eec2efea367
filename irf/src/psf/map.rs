//! PSF map: a point-spread function that varies across the sky.
//!
//! The PSF is stored as a [`Map`] with a `rad` (offset, degrees) axis and a
//! `energy_true` (TeV) axis on top of a spatial grid, so every pixel carries
//! its own radial profile per energy. An optional exposure map with the
//! `rad` axis squashed to a single bin weights the PSF when maps are
//! combined across energy or stacked.
//!
//! All operations return new values; a `PsfMap` is never modified after
//! construction.

use std::f64::consts::PI;

use gamma_maps::interp::interp_extrapolate;
use gamma_maps::units::{deg, tev, to_deg, to_tev, Angle, Energy};
use gamma_maps::{
    get_random_state, InterpMethod, InterpOptions, InverseCdfSampler, Map, MapAxes, MapAxis,
    MapCoord, MapError, Projection, RandomState, Reduce, Region, SkyCoord, WcsGeom,
};
use ndarray::{Array2, ArrayD, Axis, IxDyn};
use rand::Rng;

use super::{default_rad_axis, EnergyDependentTablePsf, Gauss2dPdf, PsfKernel};
use crate::config::KernelConfig;
use crate::integrate::cumulative_trapezoid;
use crate::spectral::{spectral_weights, PowerLawSpectralModel, SpectralModel};
use crate::{PsfError, Result};

/// Unit of the PSF density
pub const PSF_UNIT: &str = "sr-1";

/// Unit of maps created empty by [`PsfMap::from_geom`]
pub const EXPOSURE_UNIT: &str = "m2 s";

/// Unit of exposure carried over from a PSF table
const TABLE_EXPOSURE_UNIT: &str = "cm2 s";

/// Sub-bins per offset bin when integrating containment
const CONTAINMENT_UPSAMPLE: usize = 10;

/// PSF varying with sky position and true energy.
#[derive(Debug, Clone, PartialEq)]
pub struct PsfMap {
    psf_map: Map,
    exposure_map: Option<Map>,
    interp_options: InterpOptions,
    rad_axis: MapAxis,
    rad_dim: usize,
}

fn clip_negative(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Position of an axis in map data order
fn data_dim(axes: &MapAxes, name: &str) -> Result<usize> {
    let idx = axes
        .index_of(name)
        .ok_or_else(|| MapError::MissingAxis(name.to_string()))?;
    Ok(axes.len() - 1 - idx)
}

impl PsfMap {
    /// Create a PSF map.
    ///
    /// # Arguments
    /// * `psf_map` - PSF density with a `rad` axis and optionally an
    ///   `energy_true` axis
    /// * `exposure_map` - Exposure on the same geometry with `rad` squashed
    ///
    /// # Errors
    /// * `PsfError::Map(MapError::MissingAxis)` - no `rad` axis
    /// * `PsfError::InvalidGeometry` - unexpected axes or mismatched exposure
    pub fn new(psf_map: Map, exposure_map: Option<Map>) -> Result<Self> {
        let axes = psf_map.geom().axes();
        let rad_axis = axes.require("rad")?.clone();
        let rad_dim = data_dim(axes, "rad")?;

        if let Some(name) = axes
            .names()
            .into_iter()
            .find(|name| *name != "rad" && *name != "energy_true")
        {
            return Err(PsfError::InvalidGeometry(format!(
                "unexpected axis '{name}', PSF maps only carry 'rad' and 'energy_true'"
            )));
        }

        if let Some(exposure) = &exposure_map {
            let expected = psf_map.geom().squash("rad")?.data_shape();
            if exposure.data().shape() != expected.as_slice() {
                return Err(PsfError::InvalidGeometry(format!(
                    "exposure shape {:?} does not match {expected:?}",
                    exposure.data().shape()
                )));
            }
        }

        Ok(Self {
            psf_map,
            exposure_map,
            interp_options: InterpOptions::default(),
            rad_axis,
            rad_dim,
        })
    }

    /// Empty PSF and exposure maps on `geom`, which must have a `rad` axis
    pub fn from_geom(geom: WcsGeom) -> Result<Self> {
        let exposure_geom = geom.squash("rad")?;
        Self::new(
            Map::from_geom(geom, PSF_UNIT),
            Some(Map::from_geom(exposure_geom, EXPOSURE_UNIT)),
        )
    }

    /// Spatially constant PSF map from a radial table.
    ///
    /// Without a geometry the table is placed on an all-sky plate-carrée
    /// grid of 2×1 pixels of 180° with the table's own axes.
    pub fn from_energy_dependent_table_psf(
        table: &EnergyDependentTablePsf,
        geom: Option<WcsGeom>,
    ) -> Result<Self> {
        let geom = match geom {
            Some(geom) => geom,
            None => WcsGeom::create(
                SkyCoord::new(0.0, 0.0),
                180.0,
                (2, 1),
                Projection::Car,
                MapAxes::new(vec![table.rad_axis().clone(), table.energy_axis().clone()])?,
            )?,
        };

        let axes = geom.axes();
        let rad_centers = axes.require("rad")?.center();
        let energy_centers = axes.require("energy_true")?.center();
        let rad_dim = data_dim(axes, "rad")?;
        let energy_dim = data_dim(axes, "energy_true")?;

        let psf_data = ArrayD::from_shape_fn(IxDyn(&geom.data_shape()), |idx| {
            table.evaluate(
                tev(energy_centers[idx[energy_dim]]),
                deg(rad_centers[idx[rad_dim]]),
            )
        });

        let exposure_values = energy_centers
            .iter()
            .map(|&energy| table.exposure_at(tev(energy)))
            .collect::<Result<Vec<f64>>>()?;
        let exposure_geom = geom.squash("rad")?;
        let exposure_data = ArrayD::from_shape_fn(IxDyn(&exposure_geom.data_shape()), |idx| {
            exposure_values[idx[energy_dim]]
        });

        Self::new(
            Map::from_geom_data(geom, psf_data, PSF_UNIT)?,
            Some(Map::from_geom_data(
                exposure_geom,
                exposure_data,
                TABLE_EXPOSURE_UNIT,
            )?),
        )
    }

    /// Gaussian PSF map.
    ///
    /// # Arguments
    /// * `energy_axis` - True energy axis
    /// * `rad_axis` - Offset axis, defaults to 0 to 0.66° in 66 bins
    /// * `sigma` - Width, either one value or one per energy bin
    pub fn from_gauss(
        energy_axis: MapAxis,
        rad_axis: Option<MapAxis>,
        sigma: &[Angle],
    ) -> Result<Self> {
        let rad_axis = match rad_axis {
            Some(axis) => axis,
            None => default_rad_axis()?,
        };

        if sigma.len() != 1 && sigma.len() != energy_axis.nbin() {
            return Err(PsfError::InvalidGeometry(format!(
                "got {} sigma values for {} energy bins",
                sigma.len(),
                energy_axis.nbin()
            )));
        }

        let rad_centers = rad_axis.center();
        let psf_value = Array2::from_shape_fn((energy_axis.nbin(), rad_axis.nbin()), |(i, j)| {
            let width = if sigma.len() == 1 { sigma[0] } else { sigma[i] };
            Gauss2dPdf::new(width).evaluate(deg(rad_centers[j]))
        });

        let table = EnergyDependentTablePsf::new(energy_axis, rad_axis, psf_value, None)?;
        Self::from_energy_dependent_table_psf(&table, None)
    }

    pub fn with_interp_options(self, interp_options: InterpOptions) -> Self {
        Self {
            interp_options,
            ..self
        }
    }

    pub fn psf_map(&self) -> &Map {
        &self.psf_map
    }

    pub fn exposure_map(&self) -> Option<&Map> {
        self.exposure_map.as_ref()
    }

    pub fn interp_options(&self) -> &InterpOptions {
        &self.interp_options
    }

    pub fn rad_axis(&self) -> &MapAxis {
        &self.rad_axis
    }

    pub fn energy_axis(&self) -> Option<&MapAxis> {
        self.psf_map.geom().axes().get("energy_true")
    }

    /// Pixel coordinates of a position and energy, with the offset entry
    /// at zero
    fn pix_at(&self, position: &SkyCoord, energy: Option<f64>) -> Result<Vec<f64>> {
        let mut coord = MapCoord::new(*position).with_axis("rad", 0.0);
        if let Some(energy) = energy {
            coord = coord.with_axis("energy_true", energy);
        }
        Ok(self.psf_map.coord_to_pix(&coord)?)
    }

    /// PSF values along the offset axis at fixed position and energy
    fn radial_profile(&self, pix: &mut [f64], rads: &[f64], options: &InterpOptions) -> Vec<f64> {
        rads.iter()
            .map(|&rad| {
                pix[self.rad_dim] = self.rad_axis.coord_to_pix(rad);
                self.psf_map.interp_by_pix(pix, options)
            })
            .collect()
    }

    /// Offsets (degrees) and the containment enclosed within each of them
    fn containment_curve(
        &self,
        position: &SkyCoord,
        energy: Option<f64>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut rads = self.rad_axis.upsample(CONTAINMENT_UPSAMPLE).edges().to_vec();
        if rads[0] > 0.0 {
            rads.insert(0, 0.0);
        }

        let mut pix = self.pix_at(position, energy)?;
        let profile = self.radial_profile(&mut pix, &rads, &self.interp_options);

        let rads_radian: Vec<f64> = rads.iter().map(|r| r.to_radians()).collect();
        let integrand: Vec<f64> = profile
            .into_iter()
            .zip(&rads_radian)
            .map(|(psf, &r)| 2.0 * PI * r * clip_negative(psf))
            .collect();

        let containment = cumulative_trapezoid(&rads_radian, &integrand)?;
        Ok((rads, containment))
    }

    /// Fraction of the PSF enclosed within the `rad` offset of `coord`.
    ///
    /// `coord` needs a sky position, an `energy_true` value (TeV) when the
    /// map has an energy axis, and `rad` (degrees). Offsets beyond the
    /// tabulated range return the containment at the largest offset.
    pub fn containment(&self, coord: &MapCoord) -> Result<f64> {
        let rad = coord.require("rad")?;
        let (rads, containment) =
            self.containment_curve(coord.skycoord(), coord.get("energy_true"))?;

        let rad = rad.clamp(rads[0], rads[rads.len() - 1]);
        Ok(interp_extrapolate(rad, &rads, &containment)?)
    }

    /// Offset enclosing `fraction` of the PSF at the position and energy of
    /// `coord`.
    ///
    /// Fractions above the containment reached at the largest tabulated
    /// offset return that offset.
    ///
    /// # Errors
    /// * `PsfError::InvalidFraction` - `fraction` is outside `[0, 1]`
    pub fn containment_radius(&self, fraction: f64, coord: &MapCoord) -> Result<Angle> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PsfError::InvalidFraction(fraction));
        }

        let (rads, containment) =
            self.containment_curve(coord.skycoord(), coord.get("energy_true"))?;
        Ok(deg(invert_containment(fraction, &rads, &containment)))
    }

    /// Containment radius (degrees) at every pixel of the PSF geometry
    pub fn containment_radius_map(&self, energy: Energy, fraction: f64) -> Result<Map> {
        let geom = self.psf_map.geom().to_image();
        let coords = geom.get_coord();

        let mut data = Array2::<f64>::zeros(coords.dim());
        for (yx, position) in coords.indexed_iter() {
            let coord = MapCoord::new(*position).with_axis("energy_true", to_tev(energy));
            data[yx] = to_deg(self.containment_radius(fraction, &coord)?);
        }

        Ok(Map::from_geom_data(geom, data.into_dyn(), "deg")?)
    }

    /// PSF kernel at `position` on an odd-sized version of `geom`.
    ///
    /// The PSF is evaluated on a grid oversampled by `config.factor`,
    /// clipped at zero and summed back to the pixel size of `geom`, so each
    /// kernel pixel holds the PSF integrated over its area. Every energy
    /// plane is normalised to one. Offsets beyond the tabulated range are
    /// extrapolated.
    ///
    /// # Arguments
    /// * `position` - Sky position at which the PSF is evaluated
    /// * `geom` - Target geometry with a single `energy_true` axis; its
    ///   pixel size, projection and centre define the kernel grid
    /// * `config` - Kernel radius and oversampling factor
    pub fn get_psf_kernel(
        &self,
        position: &SkyCoord,
        geom: &WcsGeom,
        config: &KernelConfig,
    ) -> Result<PsfKernel> {
        let oversampled = self.oversampled_kernel_map(position, geom, config)?;
        let kernel_map = oversampled.downsample(config.factor, true)?;
        log::debug!(
            "PSF kernel at {position:?}: {:?} pixels, factor {}",
            kernel_map.geom().npix(),
            config.factor
        );

        Ok(PsfKernel::new(kernel_map, true))
    }

    /// Unnormalised PSF on the kernel grid upsampled by `config.factor`,
    /// negative values clipped. [`PsfMap::get_psf_kernel`] block-sums this
    /// map back to the target pixel size.
    pub fn oversampled_kernel_map(
        &self,
        position: &SkyCoord,
        geom: &WcsGeom,
        config: &KernelConfig,
    ) -> Result<Map> {
        if config.factor == 0 {
            return Err(PsfError::InvalidFactor);
        }
        if geom.axes().len() != 1 {
            return Err(PsfError::InvalidGeometry(format!(
                "kernel geometry needs exactly one 'energy_true' axis, got {:?}",
                geom.axes().names()
            )));
        }
        let energy_axis = geom.axes().require("energy_true")?;

        let max_radius = match config.max_radius_deg {
            Some(radius) => radius,
            None => {
                let rad_max = self
                    .rad_axis
                    .center()
                    .into_iter()
                    .fold(f64::NEG_INFINITY, f64::max);
                let (w_lon, w_lat) = geom.width();
                rad_max.min(w_lon.min(w_lat) / 2.0)
            }
        };

        let kernel_geom = geom.to_odd_npix(Some(max_radius));
        let upsampled = kernel_geom.upsample(config.factor);
        let rad = upsampled.separation(&upsampled.center_skydir());

        let templates = energy_axis
            .center()
            .into_iter()
            .map(|energy| self.pix_at(position, Some(energy)))
            .collect::<Result<Vec<_>>>()?;

        let extrapolate = InterpOptions {
            method: InterpMethod::Linear,
            fill_value: None,
        };
        let mut pix = vec![0.0; self.psf_map.data().ndim()];
        let data = ArrayD::from_shape_fn(IxDyn(&upsampled.data_shape()), |idx| {
            pix.copy_from_slice(&templates[idx[0]]);
            pix[self.rad_dim] = self.rad_axis.coord_to_pix(rad[[idx[1], idx[2]]]);
            clip_negative(self.psf_map.interp_by_pix(&pix, &extrapolate))
        });

        log::debug!(
            "oversampled PSF kernel grid: {:?} pixels, radius {max_radius:.4} deg",
            upsampled.npix()
        );
        Ok(Map::from_geom_data(upsampled, data, "")?)
    }

    /// Draw reconstructed positions for events at the given true positions.
    ///
    /// For every coordinate the offset distribution `PSF(r) · r · Δr` over
    /// the offset bins is inverted with one uniform draw per event, then a
    /// position angle is drawn uniformly in `[0, 360)` degrees and the event
    /// is displaced along the great circle. The result keeps the
    /// `energy_true` values. Identical seeds and inputs give identical
    /// output.
    pub fn sample_coord(
        &self,
        coords: &[MapCoord],
        random_state: RandomState,
    ) -> Result<Vec<MapCoord>> {
        let mut rng = get_random_state(random_state);
        self.sample_coord_with_rng(coords, &mut rng)
    }

    /// Same as [`PsfMap::sample_coord`], drawing from an existing generator
    /// so that one stream can be shared by several sampling steps.
    pub fn sample_coord_with_rng<R: Rng>(
        &self,
        coords: &[MapCoord],
        rng: &mut R,
    ) -> Result<Vec<MapCoord>> {
        let rad_centers = self.rad_axis.center();
        let bin_widths = self.rad_axis.bin_width();

        let mut pdf = Array2::<f64>::zeros((coords.len(), rad_centers.len()));
        for (i, coord) in coords.iter().enumerate() {
            let mut pix = self.pix_at(coord.skycoord(), coord.get("energy_true"))?;
            let profile = self.radial_profile(&mut pix, &rad_centers, &self.interp_options);
            for (j, psf) in profile.into_iter().enumerate() {
                pdf[[i, j]] = clip_negative(psf) * rad_centers[j] * bin_widths[j];
            }
        }

        let sampler = InverseCdfSampler::new(&pdf);
        let rad_pix = sampler.sample_axis(rng);
        let position_angles: Vec<f64> = (0..coords.len())
            .map(|_| rng.random_range(0.0..360.0))
            .collect();
        log::debug!("sampled PSF offsets for {} events", coords.len());

        Ok(coords
            .iter()
            .zip(rad_pix)
            .zip(position_angles)
            .map(|((coord, pix), position_angle)| {
                let separation = self.rad_axis.pix_to_coord(pix);
                let position = coord
                    .skycoord()
                    .directional_offset_by(position_angle, separation);
                match coord.get("energy_true") {
                    Some(energy) => MapCoord::new(position).with_axis("energy_true", energy),
                    None => MapCoord::new(position),
                }
            })
            .collect())
    }

    /// Reduce the PSF and exposure to a single position.
    ///
    /// Both maps are averaged over the region with a plain NaN-ignoring
    /// mean; the PSF average is not exposure weighted. Without a region the
    /// map centre is used.
    pub fn to_region_nd_map(&self, region: Option<Region>) -> Result<Self> {
        let region = region.unwrap_or(Region::Point(self.psf_map.geom().center_skydir()));
        log::debug!("averaging PSF over {region:?} without exposure weighting");

        let psf = self.psf_map.to_region_nd_map(&region, Reduce::NanMean)?;
        let exposure = self
            .exposure_map
            .as_ref()
            .map(|exposure| exposure.to_region_nd_map(&region, Reduce::NanMean))
            .transpose()?;

        Ok(Self::new(psf, exposure)?.with_interp_options(self.interp_options))
    }

    /// Exposure-weighted average of the PSF over true energy.
    ///
    /// The exposure of each energy bin is weighted by the integral of
    /// `spectrum` over the bin (normalised to sum to one, default a power
    /// law of index 2). The PSF is the sum over energy of weighted exposure
    /// times PSF, divided by the summed weighted exposure; pixels without
    /// exposure become NaN. With `keepdims` the energy axis is kept as a
    /// single bin, otherwise it is removed.
    pub fn to_image(&self, spectrum: Option<&dyn SpectralModel>, keepdims: bool) -> Result<Self> {
        let exposure = self
            .exposure_map
            .as_ref()
            .ok_or(PsfError::MissingExposure("energy marginalisation"))?;
        let axes = self.psf_map.geom().axes();
        let energy_axis = axes.require("energy_true")?;
        let energy_dim = data_dim(axes, "energy_true")?;

        let default_spectrum = PowerLawSpectralModel::default();
        let spectrum = spectrum.unwrap_or(&default_spectrum);
        let weights = spectral_weights(energy_axis, spectrum);

        let mut shape = vec![1; exposure.data().ndim()];
        shape[energy_dim] = weights.len();
        let weights = ArrayD::from_shape_vec(IxDyn(&shape), weights)
            .map_err(|e| PsfError::InvalidGeometry(e.to_string()))?;

        let exposure_weighted = exposure.data() * &weights;
        let exposure_sum = exposure_weighted
            .sum_axis(Axis(energy_dim))
            .insert_axis(Axis(energy_dim));
        let psf_weighted = &(&exposure_weighted * self.psf_map.data()) / &exposure_sum;

        let psf = self
            .psf_map
            .with_data(psf_weighted)?
            .sum_over_axis("energy_true", keepdims)?;
        let exposure = exposure
            .with_data(exposure_weighted)?
            .sum_over_axis("energy_true", keepdims)?;

        Ok(Self::new(psf, Some(exposure))?.with_interp_options(self.interp_options))
    }

    /// Exposure-weighted combination with another PSF map on the same
    /// geometry. The exposures add.
    pub fn stack(&self, other: &PsfMap) -> Result<Self> {
        let (exposure, other_exposure) = match (&self.exposure_map, &other.exposure_map) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(PsfError::MissingExposure("stacking")),
        };
        if self.psf_map.geom() != other.psf_map.geom() {
            return Err(PsfError::InvalidGeometry(
                "cannot stack PSF maps on different geometries".to_string(),
            ));
        }

        let exposure_total = exposure.data() + other_exposure.data();
        let weighted = &(self.psf_map.data() * exposure.data())
            + &(other.psf_map.data() * other_exposure.data());
        let psf = &weighted / &exposure_total;

        Ok(Self::new(
            self.psf_map.with_data(psf)?,
            Some(exposure.with_data(exposure_total)?),
        )?
        .with_interp_options(self.interp_options))
    }
}

/// Smallest offset whose containment reaches `fraction`, linear between
/// tabulated offsets
fn invert_containment(fraction: f64, rads: &[f64], containment: &[f64]) -> f64 {
    if containment.iter().any(|c| c.is_nan()) {
        return f64::NAN;
    }

    match containment.iter().position(|&c| c >= fraction) {
        Some(0) => rads[0],
        Some(i) => {
            let (c0, c1) = (containment[i - 1], containment[i]);
            rads[i - 1] + (rads[i] - rads[i - 1]) * (fraction - c0) / (c1 - c0)
        }
        None => {
            let last = rads.len() - 1;
            log::warn!(
                "containment fraction {fraction} exceeds tabulated maximum {:.4}, \
                 clamping to {} deg",
                containment[last],
                rads[last]
            );
            rads[last]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gamma_maps::units::AxisUnit;
    use gamma_maps::Interp;

    fn energy_axis() -> MapAxis {
        MapAxis::from_energy_bounds(tev(1.0), tev(100.0), 2, "energy_true").unwrap()
    }

    fn gauss_psf() -> PsfMap {
        PsfMap::from_gauss(energy_axis(), None, &[deg(0.1), deg(0.05)]).unwrap()
    }

    fn coord(energy: f64) -> MapCoord {
        MapCoord::new(SkyCoord::new(0.0, 0.0)).with_axis("energy_true", energy)
    }

    #[test]
    fn test_from_gauss_geometry() {
        let psf = gauss_psf();
        assert_eq!(psf.psf_map().data().shape(), &[2, 66, 1, 2]);
        assert_eq!(psf.psf_map().unit(), "sr-1");
        let exposure = psf.exposure_map().unwrap();
        assert_eq!(exposure.data().shape(), &[2, 1, 1, 2]);
        assert_eq!(exposure.unit(), "cm2 s");
        assert!(exposure.data().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_from_gauss_sigma_count() {
        let result = PsfMap::from_gauss(energy_axis(), None, &[deg(0.1), deg(0.1), deg(0.1)]);
        assert!(matches!(result, Err(PsfError::InvalidGeometry(_))));
    }

    #[test]
    fn test_new_rejects_foreign_axis() {
        let rad = default_rad_axis().unwrap();
        let other =
            MapAxis::from_edges(vec![0.0, 1.0], "time", AxisUnit::Dimensionless, Interp::Lin)
                .unwrap();
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            1.0,
            (3, 3),
            Projection::Car,
            MapAxes::new(vec![rad, other]).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            PsfMap::new(Map::from_geom(geom, PSF_UNIT), None),
            Err(PsfError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_new_requires_rad_axis() {
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            1.0,
            (3, 3),
            Projection::Car,
            MapAxes::new(vec![energy_axis()]).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            PsfMap::new(Map::from_geom(geom, PSF_UNIT), None),
            Err(PsfError::Map(MapError::MissingAxis(_)))
        ));
    }

    #[test]
    fn test_from_geom() {
        let geom = WcsGeom::create(
            SkyCoord::new(10.0, 5.0),
            0.5,
            (4, 3),
            Projection::Tan,
            MapAxes::new(vec![default_rad_axis().unwrap(), energy_axis()]).unwrap(),
        )
        .unwrap();
        let psf = PsfMap::from_geom(geom).unwrap();
        assert_eq!(psf.psf_map().data().shape(), &[2, 66, 3, 4]);
        let exposure = psf.exposure_map().unwrap();
        assert_eq!(exposure.data().shape(), &[2, 1, 3, 4]);
        assert_eq!(exposure.unit(), "m2 s");
    }

    #[test]
    fn test_containment_matches_gaussian() {
        let psf = gauss_psf();
        let gauss = Gauss2dPdf::new(deg(0.1));
        let centers = energy_axis().center();

        for rad in [0.05, 0.1, 0.2] {
            let value = psf
                .containment(&coord(centers[0]).with_axis("rad", rad))
                .unwrap();
            assert_relative_eq!(value, gauss.containment(deg(rad)), epsilon = 5e-3);
        }
    }

    #[test]
    fn test_containment_requires_rad() {
        let psf = gauss_psf();
        assert!(matches!(
            psf.containment(&coord(3.0)),
            Err(PsfError::Map(MapError::MissingCoordinate(name))) if name == "rad"
        ));
    }

    #[test]
    fn test_containment_radius_matches_gaussian() {
        let psf = gauss_psf();
        let centers = energy_axis().center();

        let radius = psf.containment_radius(0.68, &coord(centers[1])).unwrap();
        let expected = Gauss2dPdf::new(deg(0.05)).containment_radius(0.68).to_degrees();
        assert_relative_eq!(to_deg(radius), expected, max_relative = 2e-2);
    }

    #[test]
    fn test_containment_radius_invalid_fraction() {
        let psf = gauss_psf();
        for fraction in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                psf.containment_radius(fraction, &coord(3.0)),
                Err(PsfError::InvalidFraction(_))
            ));
        }
    }

    #[test]
    fn test_containment_radius_edges() {
        let psf = gauss_psf();
        let zero = psf.containment_radius(0.0, &coord(3.0)).unwrap();
        assert_eq!(to_deg(zero), 0.0);

        let full = psf.containment_radius(1.0, &coord(3.0)).unwrap();
        assert!(to_deg(full) <= 0.66 + 1e-9);
    }

    #[test]
    fn test_containment_radius_map() {
        let psf = gauss_psf();
        let map = psf.containment_radius_map(tev(3.0), 0.5).unwrap();
        assert_eq!(map.data().shape(), &[1, 2]);
        assert_eq!(map.unit(), "deg");
        assert_relative_eq!(map.data()[[0, 0]], map.data()[[0, 1]], epsilon = 1e-9);
    }

    #[test]
    fn test_kernel_normalised_and_centred() {
        let psf = gauss_psf();
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            0.02,
            (51, 51),
            Projection::Tan,
            MapAxes::new(vec![energy_axis()]).unwrap(),
        )
        .unwrap();

        let kernel = psf
            .get_psf_kernel(
                &SkyCoord::new(0.0, 0.0),
                &geom,
                &KernelConfig::with_max_radius(deg(0.3)),
            )
            .unwrap();
        // 0.6 deg across at 0.02 deg per pixel, made odd
        assert_eq!(kernel.geom().npix(), (31, 31));
        for sum in kernel.plane_sums() {
            assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
        }

        let data = kernel.data();
        let peak = data[[0, 15, 15]];
        assert!(data.iter().take(31 * 31).all(|&v| v <= peak && v >= 0.0));
    }

    #[test]
    fn test_kernel_default_radius() {
        let psf = gauss_psf();
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            0.05,
            (10, 10),
            Projection::Tan,
            MapAxes::new(vec![energy_axis()]).unwrap(),
        )
        .unwrap();

        // half the width, 0.25 deg, is below the largest offset
        let kernel = psf
            .get_psf_kernel(&SkyCoord::new(0.0, 0.0), &geom, &KernelConfig::default())
            .unwrap();
        assert_eq!(kernel.geom().npix(), (11, 11));
    }

    #[test]
    fn test_kernel_rejects_bad_input() {
        let psf = gauss_psf();
        let geom = WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            0.05,
            (10, 10),
            Projection::Tan,
            MapAxes::new(vec![energy_axis()]).unwrap(),
        )
        .unwrap();
        let config = KernelConfig {
            max_radius_deg: None,
            factor: 0,
        };
        assert!(matches!(
            psf.get_psf_kernel(&SkyCoord::new(0.0, 0.0), &geom, &config),
            Err(PsfError::InvalidFactor)
        ));

        assert!(matches!(
            psf.get_psf_kernel(
                &SkyCoord::new(0.0, 0.0),
                &geom.to_image(),
                &KernelConfig::default()
            ),
            Err(PsfError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_sample_coord_reproducible() {
        let psf = gauss_psf();
        let coords: Vec<MapCoord> = (0..20)
            .map(|i| coord(if i % 2 == 0 { 3.0 } else { 30.0 }))
            .collect();

        let a = psf.sample_coord(&coords, RandomState::Seed(42)).unwrap();
        let b = psf.sample_coord(&coords, RandomState::Seed(42)).unwrap();
        assert_eq!(a, b);

        let c = psf.sample_coord(&coords, RandomState::Seed(43)).unwrap();
        assert_ne!(a, c);

        for (sampled, original) in a.iter().zip(&coords) {
            assert_eq!(sampled.get("energy_true"), original.get("energy_true"));
            let separation = sampled.skycoord().separation(original.skycoord());
            assert!(separation <= 0.66 + 1e-9);
        }
    }

    #[test]
    fn test_sample_coord_spread_tracks_sigma() {
        let psf = gauss_psf();
        let n = 2000;
        let energy = energy_axis().center()[0];
        let coords: Vec<MapCoord> = (0..n).map(|_| coord(energy)).collect();

        let sampled = psf.sample_coord(&coords, RandomState::Seed(0)).unwrap();
        let mean_sep = sampled
            .iter()
            .zip(&coords)
            .map(|(s, c)| s.skycoord().separation(c.skycoord()))
            .sum::<f64>()
            / n as f64;

        // Rayleigh mean is σ √(π/2)
        assert_relative_eq!(mean_sep, 0.1 * (PI / 2.0).sqrt(), max_relative = 0.05);
    }

    #[test]
    fn test_to_region_nd_map_default_center() {
        let psf = gauss_psf();
        let reduced = psf.to_region_nd_map(None).unwrap();
        assert_eq!(reduced.psf_map().data().shape(), &[2, 66, 1, 1]);
        assert_eq!(reduced.exposure_map().unwrap().data().shape(), &[2, 1, 1, 1]);
    }

    #[test]
    fn test_to_image_gaussian_mix() {
        let psf = gauss_psf();
        let image = psf.to_image(None, false).unwrap();
        assert!(image.energy_axis().is_none());
        assert_eq!(image.psf_map().data().shape(), &[66, 1, 2]);
        assert_eq!(image.exposure_map().unwrap().data().shape(), &[1, 1, 2]);

        // equal exposure, E^-2 weights over two decades
        let w0 = 0.9 / 0.99;
        let data = psf.psf_map().data();
        let expected = w0 * data[[0, 3, 0, 0]] + (1.0 - w0) * data[[1, 3, 0, 0]];
        assert_relative_eq!(image.psf_map().data()[[3, 0, 0]], expected, max_relative = 1e-9);

        let kept = psf.to_image(None, true).unwrap();
        assert_eq!(kept.psf_map().data().shape(), &[1, 66, 1, 2]);
    }

    #[test]
    fn test_to_image_requires_exposure() {
        let psf = PsfMap::new(gauss_psf().psf_map().clone(), None).unwrap();
        assert!(matches!(
            psf.to_image(None, false),
            Err(PsfError::MissingExposure(_))
        ));
    }

    #[test]
    fn test_stack() {
        let narrow = gauss_psf();
        let wide = PsfMap::from_gauss(energy_axis(), None, &[deg(0.2)]).unwrap();
        let stacked = narrow.stack(&wide).unwrap();

        let expected =
            0.5 * (narrow.psf_map().data()[[0, 0, 0, 0]] + wide.psf_map().data()[[0, 0, 0, 0]]);
        assert_relative_eq!(
            stacked.psf_map().data()[[0, 0, 0, 0]],
            expected,
            max_relative = 1e-12
        );
        assert!(stacked.exposure_map().unwrap().data().iter().all(|&v| v == 2.0));
    }
}

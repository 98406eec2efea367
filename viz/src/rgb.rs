//! Three-band RGB composition with the Lupton et al. (2004) asinh stretch.

use image::{Rgb, RgbImage};
use ndarray::{s, Array2, ArrayView2, Axis, Ix3};
use serde::{Deserialize, Serialize};

use gamma_maps::Map;

use crate::{Result, VizError};

const PIXMAX: f64 = u8::MAX as f64;

/// Gradient of the stretch is estimated at `SLOPE_FRACTION * stretch`
const SLOPE_FRACTION: f64 = 0.1;

/// Parameters of the asinh stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuptonParams {
    /// Intensity mapped to black, subtracted from every band
    pub minimum: f64,
    /// Linear range of the stretch
    pub stretch: f64,
    /// Asinh softening parameter
    pub q: f64,
}

impl Default for LuptonParams {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            stretch: 5.0,
            q: 8.0,
        }
    }
}

impl LuptonParams {
    fn slope_and_soften(&self) -> (f64, f64) {
        let q = if self.q.abs() < f64::from(f32::EPSILON) {
            0.1
        } else {
            self.q.min(1e10)
        };
        let slope = SLOPE_FRACTION * PIXMAX / (SLOPE_FRACTION * q).asinh();
        (slope, q / self.stretch)
    }
}

/// Scale one pixel to 8-bit colour, keeping the hue of saturated pixels.
fn stretch_pixel(rgb: [f64; 3], params: &LuptonParams, slope: f64, soften: f64) -> [u8; 3] {
    let rgb = rgb.map(|c| c - params.minimum);
    let intensity = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
    let fac = if intensity <= 0.0 {
        0.0
    } else {
        (intensity * soften).asinh() * slope / intensity
    };

    let scaled = rgb.map(|c| {
        let c = c * fac;
        if c < 0.0 {
            0.0
        } else {
            c
        }
    });

    let [r0, g0, b0] = scaled;
    let brightest = if r0 > g0 {
        if r0 > b0 {
            r0
        } else {
            b0
        }
    } else if g0 > b0 {
        g0
    } else {
        b0
    };

    // NaN casts to 0, values above the range saturate
    scaled.map(|c| {
        let c = if brightest >= PIXMAX {
            c * PIXMAX / brightest
        } else {
            c
        };
        c as u8
    })
}

/// Combine three equally shaped images into an 8-bit RGB image.
///
/// Array index `[row, col]` becomes pixel `(col, row)`.
///
/// # Errors
/// * `VizError::InvalidGeometry` - the bands differ in shape
pub fn make_lupton_rgb(
    r: ArrayView2<f64>,
    g: ArrayView2<f64>,
    b: ArrayView2<f64>,
    params: &LuptonParams,
) -> Result<RgbImage> {
    if r.dim() != g.dim() || r.dim() != b.dim() {
        return Err(VizError::InvalidGeometry(format!(
            "band shapes differ: {:?}, {:?}, {:?}",
            r.dim(),
            g.dim(),
            b.dim()
        )));
    }

    let (height, width) = r.dim();
    let (slope, soften) = params.slope_and_soften();

    let mut img = RgbImage::new(width as u32, height as u32);
    for ((row, col), &red) in r.indexed_iter() {
        let pixel = stretch_pixel([red, g[[row, col]], b[[row, col]]], params, slope, soften);
        img.put_pixel(col as u32, row as u32, Rgb(pixel));
    }

    Ok(img)
}

fn nanmax(values: ArrayView2<f64>) -> f64 {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .copied()
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// Compose a map with a single three-bin non-spatial axis into an RGB
/// image.
///
/// Bin 0 is red, bin 2 blue. Each band is divided by its maximum before
/// the stretch. Image row 0 is the top of the map (highest latitude).
///
/// # Errors
/// * `VizError::InvalidGeometry` - the map does not have exactly one
///   non-spatial axis with three bins
pub fn map_to_rgb(map: &Map, params: &LuptonParams) -> Result<RgbImage> {
    let axes = map.geom().axes();
    if axes.len() != 1 || axes.iter().any(|axis| axis.nbin() != 3) {
        return Err(VizError::InvalidGeometry(
            "One non-spatial axis with exactly 3 bins is needed to create an RGB image"
                .to_string(),
        ));
    }

    let data = map
        .data()
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|e| VizError::InvalidGeometry(e.to_string()))?;

    let bands: Vec<Array2<f64>> = data
        .axis_iter(Axis(0))
        .map(|band| {
            let max = nanmax(band);
            band.slice(s![..;-1, ..]).mapv(|v| v / max)
        })
        .collect();

    log::debug!(
        "composing {}x{} RGB image from '{}' bands",
        map.geom().npix().0,
        map.geom().npix().1,
        axes.names().join(", ")
    );

    make_lupton_rgb(bands[0].view(), bands[1].view(), bands[2].view(), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_maps::units::tev;
    use gamma_maps::{MapAxes, MapAxis, Projection, SkyCoord, WcsGeom};
    use ndarray::{array, ArrayD, IxDyn};

    fn geom(nbin: usize) -> WcsGeom {
        let energy = MapAxis::from_energy_bounds(tev(0.1), tev(10.0), nbin, "energy").unwrap();
        WcsGeom::create(
            SkyCoord::new(0.0, 0.0),
            0.1,
            (3, 2),
            Projection::Car,
            MapAxes::new(vec![energy]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_black_and_grey() {
        let zeros = Array2::<f64>::zeros((2, 2));
        let img =
            make_lupton_rgb(zeros.view(), zeros.view(), zeros.view(), &LuptonParams::default())
                .unwrap();
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));

        let ones = Array2::<f64>::ones((1, 1));
        let img = make_lupton_rgb(ones.view(), ones.view(), ones.view(), &LuptonParams::default())
            .unwrap();
        let [r, g, b] = img.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r > 0);
    }

    #[test]
    fn test_asinh_value() {
        let params = LuptonParams {
            minimum: 0.0,
            stretch: 1.0,
            q: 1.0,
        };
        let v = array![[0.5]];
        let img = make_lupton_rgb(v.view(), v.view(), v.view(), &params).unwrap();

        let slope = 0.1 * 255.0 / 0.1f64.asinh();
        let expected = 0.5f64.asinh() * slope;
        assert_eq!(img.get_pixel(0, 0).0[0], expected.min(255.0) as u8);
    }

    #[test]
    fn test_saturation_keeps_hue() {
        let params = LuptonParams {
            minimum: 0.0,
            stretch: 0.01,
            q: 8.0,
        };
        let r = array![[100.0]];
        let g = array![[50.0]];
        let b = array![[0.0]];
        let img = make_lupton_rgb(r.view(), g.view(), b.view(), &params).unwrap();
        let [r, g, b] = img.get_pixel(0, 0).0;
        assert_eq!(r, 255);
        assert!((i32::from(g) - 127).abs() <= 1);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_minimum_and_nan() {
        let params = LuptonParams {
            minimum: 1.0,
            ..Default::default()
        };
        let v = array![[0.5, f64::NAN]];
        let img = make_lupton_rgb(v.view(), v.view(), v.view(), &params).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 2));
        let b = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            make_lupton_rgb(a.view(), a.view(), b.view(), &LuptonParams::default()),
            Err(VizError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_map_to_rgb_orientation() {
        let geom = geom(3);
        // only the top-left pixel (row y = 1, x = 0) of the red band is lit
        let mut data = ArrayD::<f64>::zeros(IxDyn(&geom.data_shape()));
        data[[0, 1, 0]] = 4.0;
        data[[1, 0, 2]] = 2.0;
        data[[2, 0, 0]] = 1.0;
        let map = Map::from_geom_data(geom, data, "").unwrap();

        let img = map_to_rgb(&map, &LuptonParams::default()).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        let top_left = img.get_pixel(0, 0).0;
        assert!(top_left[0] > 0);
        assert_eq!(top_left[1], 0);
        let bottom_right = img.get_pixel(2, 1).0;
        assert!(bottom_right[1] > 0);
        assert_eq!(bottom_right[0], 0);
        // bands are normalised to their own maximum
        assert_eq!(top_left[0], bottom_right[1]);
    }

    #[test]
    fn test_map_to_rgb_needs_three_bins() {
        let map = Map::filled(geom(4), 1.0, "");
        assert!(matches!(
            map_to_rgb(&map, &LuptonParams::default()),
            Err(VizError::InvalidGeometry(_))
        ));

        let image = Map::filled(geom(3).to_image(), 1.0, "");
        assert!(matches!(
            map_to_rgb(&image, &LuptonParams::default()),
            Err(VizError::InvalidGeometry(_))
        ));
    }
}

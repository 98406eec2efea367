//! PSF kernel images for convolution.

use gamma_maps::{Map, WcsGeom};
use ndarray::{ArrayD, ArrayViewMutD};

/// Discretised PSF image on a small geometry centred on the source.
///
/// The map has an odd number of pixels per side so the PSF peak falls on
/// the central pixel. When the geometry carries an energy axis there is one
/// image per energy bin.
#[derive(Debug, Clone, PartialEq)]
pub struct PsfKernel {
    psf_kernel_map: Map,
}

impl PsfKernel {
    /// Wrap a kernel map, optionally normalising every image plane to a
    /// total of one.
    pub fn new(mut psf_kernel_map: Map, normalize: bool) -> Self {
        if normalize {
            normalize_planes(psf_kernel_map.data_mut());
        }
        Self { psf_kernel_map }
    }

    pub fn psf_kernel_map(&self) -> &Map {
        &self.psf_kernel_map
    }

    pub fn geom(&self) -> &WcsGeom {
        self.psf_kernel_map.geom()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        self.psf_kernel_map.data()
    }

    /// Sum of each image plane, outermost axes first
    pub fn plane_sums(&self) -> Vec<f64> {
        let data = self.data();
        let plane = plane_len(data.shape());
        let mut sums = vec![0.0; data.len() / plane];
        for (i, v) in data.iter().enumerate() {
            sums[i / plane] += v;
        }
        sums
    }
}

fn plane_len(shape: &[usize]) -> usize {
    shape[shape.len().saturating_sub(2)..]
        .iter()
        .product::<usize>()
        .max(1)
}

fn normalize_planes(mut data: ArrayViewMutD<'_, f64>) {
    let plane = plane_len(data.shape());
    let mut sums = vec![0.0; data.len() / plane];
    for (i, v) in data.iter().enumerate() {
        sums[i / plane] += v;
    }
    for (i, v) in data.iter_mut().enumerate() {
        *v /= sums[i / plane];
    }
}

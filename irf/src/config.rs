//! Settings for PSF kernel construction.

use gamma_maps::units::{deg, to_deg, Angle};
use serde::{Deserialize, Serialize};

/// Parameters of [`crate::PsfMap::get_psf_kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Kernel radius in degrees. When unset the smaller of the largest
    /// tabulated offset and half the target geometry width is used.
    pub max_radius_deg: Option<f64>,
    /// Oversampling factor applied before integrating over pixels
    pub factor: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_radius_deg: None,
            factor: 4,
        }
    }
}

impl KernelConfig {
    pub fn with_max_radius(max_radius: Angle) -> Self {
        Self {
            max_radius_deg: Some(to_deg(max_radius)),
            ..Self::default()
        }
    }

    pub fn max_radius(&self) -> Option<Angle> {
        self.max_radius_deg.map(deg)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

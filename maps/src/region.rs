//! Sky regions used to reduce maps to a single position.

use crate::coord::SkyCoord;

/// Region on the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    /// A single direction
    Point(SkyCoord),
    /// All directions within `radius` degrees of `center`
    Circle { center: SkyCoord, radius: f64 },
}

impl Region {
    pub fn center(&self) -> SkyCoord {
        match self {
            Region::Point(center) => *center,
            Region::Circle { center, .. } => *center,
        }
    }

    /// Whether `coord` lies inside the region. A point region contains
    /// nothing.
    pub fn contains(&self, coord: &SkyCoord) -> bool {
        match self {
            Region::Point(_) => false,
            Region::Circle { center, radius } => center.separation(coord) <= *radius,
        }
    }
}

/// Reduction applied to the pixels inside a region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reduce {
    #[default]
    NanMean,
    NanSum,
}

impl Reduce {
    pub(crate) fn apply(&self, values: impl Iterator<Item = f64>) -> f64 {
        let (sum, count) = values
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

        match self {
            Reduce::NanSum => sum,
            Reduce::NanMean if count == 0 => f64::NAN,
            Reduce::NanMean => sum / count as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_contains() {
        let region = Region::Circle {
            center: SkyCoord::new(0.0, 0.0),
            radius: 1.0,
        };
        assert!(region.contains(&SkyCoord::new(0.5, 0.5)));
        assert!(!region.contains(&SkyCoord::new(2.0, 0.0)));
        assert!(!Region::Point(SkyCoord::new(0.0, 0.0)).contains(&SkyCoord::new(0.0, 0.0)));
    }

    #[test]
    fn test_reduce_ignores_nan() {
        let values = [1.0, f64::NAN, 3.0];
        assert_eq!(Reduce::NanMean.apply(values.iter().copied()), 2.0);
        assert_eq!(Reduce::NanSum.apply(values.iter().copied()), 4.0);
        assert!(Reduce::NanMean.apply(std::iter::empty()).is_nan());
    }
}

//! Theta-squared distributions: on and off counts, excess and significance
//! per bin of squared angular distance to the source.

use std::path::Path;

use serde::{Deserialize, Serialize};

use gamma_maps::{AxisUnit, Interp, MapAxis};

use crate::{Result, VizError};

/// One theta-squared bin, as produced by a theta-squared table builder.
/// Bin edges are in deg².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThetaSquaredRow {
    pub theta2_min: f64,
    pub theta2_max: f64,
    pub counts: f64,
    pub counts_off: f64,
    pub excess: f64,
    pub excess_errn: f64,
    pub excess_errp: f64,
    pub sqrt_ts: f64,
}

/// Error-bar series of a theta-squared distribution.
///
/// All vectors are indexed by bin. Count errors are Poisson (`sqrt(n)`);
/// excess errors are taken from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThetaSquaredSeries {
    /// Bin centres in deg²
    pub x: Vec<f64>,
    /// Distance from the centre to the lower and upper bin edge
    pub x_err: (Vec<f64>, Vec<f64>),
    pub counts: Vec<f64>,
    pub counts_err: Vec<f64>,
    pub counts_off: Vec<f64>,
    pub counts_off_err: Vec<f64>,
    pub excess: Vec<f64>,
    pub excess_err: (Vec<f64>, Vec<f64>),
    pub sqrt_ts: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThetaSquaredTable {
    rows: Vec<ThetaSquaredRow>,
}

impl ThetaSquaredTable {
    pub fn new(rows: Vec<ThetaSquaredRow>) -> Self {
        Self { rows }
    }

    /// Read a table from a CSV file with one column per
    /// [`ThetaSquaredRow`] field; extra columns are ignored.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<ThetaSquaredRow>, csv::Error>>()?;
        log::debug!("read {} theta-squared bins from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ThetaSquaredRow] {
        &self.rows
    }

    /// Bin axis from the lower edges and the last upper edge.
    ///
    /// # Errors
    /// * `VizError::InvalidTable` - the table is empty
    /// * `VizError::Map` - the edges are not strictly increasing
    pub fn theta2_axis(&self) -> Result<MapAxis> {
        let last = self
            .rows
            .last()
            .ok_or_else(|| VizError::InvalidTable("no theta-squared bins".to_string()))?;

        let edges = self
            .rows
            .iter()
            .map(|row| row.theta2_min)
            .chain(std::iter::once(last.theta2_max))
            .collect();
        Ok(MapAxis::from_edges(
            edges,
            "theta_squared",
            AxisUnit::Dimensionless,
            Interp::Lin,
        )?)
    }

    pub fn series(&self) -> Result<ThetaSquaredSeries> {
        let axis = self.theta2_axis()?;
        let x = axis.center();
        let edges = axis.edges();
        let x_err = (
            x.iter().zip(edges).map(|(c, lo)| c - lo).collect(),
            x.iter().zip(&edges[1..]).map(|(c, hi)| hi - c).collect(),
        );

        let column = |f: fn(&ThetaSquaredRow) -> f64| -> Vec<f64> {
            self.rows.iter().map(f).collect()
        };
        let counts = column(|r| r.counts);
        let counts_off = column(|r| r.counts_off);

        Ok(ThetaSquaredSeries {
            x,
            x_err,
            counts_err: counts.iter().map(|c| c.sqrt()).collect(),
            counts_off_err: counts_off.iter().map(|c| c.sqrt()).collect(),
            counts,
            counts_off,
            excess: column(|r| r.excess),
            excess_err: (column(|r| r.excess_errn), column(|r| r.excess_errp)),
            sqrt_ts: column(|r| r.sqrt_ts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn row(lo: f64, hi: f64, counts: f64, counts_off: f64) -> ThetaSquaredRow {
        ThetaSquaredRow {
            theta2_min: lo,
            theta2_max: hi,
            counts,
            counts_off,
            excess: counts - 0.5 * counts_off,
            excess_errn: 2.0,
            excess_errp: 2.5,
            sqrt_ts: 3.0,
        }
    }

    #[test]
    fn test_series() {
        let table = ThetaSquaredTable::new(vec![
            row(0.0, 0.02, 16.0, 4.0),
            row(0.02, 0.06, 9.0, 16.0),
        ]);
        let series = table.series().unwrap();

        assert_relative_eq!(series.x[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(series.x[1], 0.04, epsilon = 1e-12);
        assert_relative_eq!(series.x_err.0[1], 0.02, epsilon = 1e-12);
        assert_relative_eq!(series.x_err.1[1], 0.02, epsilon = 1e-12);
        assert_eq!(series.counts_err, vec![4.0, 3.0]);
        assert_eq!(series.counts_off_err, vec![2.0, 4.0]);
        assert_eq!(series.excess, vec![14.0, 1.0]);
        assert_eq!(series.excess_err, (vec![2.0, 2.0], vec![2.5, 2.5]));
        assert_eq!(series.sqrt_ts, vec![3.0, 3.0]);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(matches!(
            ThetaSquaredTable::default().series(),
            Err(VizError::InvalidTable(_))
        ));

        let unordered =
            ThetaSquaredTable::new(vec![row(0.1, 0.2, 1.0, 1.0), row(0.0, 0.1, 1.0, 1.0)]);
        assert!(matches!(unordered.series(), Err(VizError::Map(_))));
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("theta2.csv");
        std::fs::write(
            &path,
            "theta2_min,theta2_max,counts,counts_off,alpha,excess,excess_errn,excess_errp,sqrt_ts\n\
             0.0,0.1,25,10,0.5,20,4.8,5.2,5.1\n\
             0.1,0.2,12,12,0.5,6,3.6,4.0,1.9\n",
        )
        .unwrap();

        let table = ThetaSquaredTable::read_csv(&path).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[1].counts_off, 12.0);

        let series = table.series().unwrap();
        assert_eq!(series.counts_err[0], 5.0);
        assert_relative_eq!(series.x[1], 0.15, epsilon = 1e-12);
    }
}

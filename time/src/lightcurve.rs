//! Light curves: flux measurements over time bins.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::io::{read_table, write_table, TableFormat};
use crate::table::Table;
use crate::time::{days_to_duration, Time, TimeDelta, TimeFormat, TimeScale, MJD_TO_JD};
use crate::{Result, TableError};

/// Unit assumed for flux columns without one
const DEFAULT_FLUX_UNIT: &str = "cm-2 s-1";

/// Factor converting a flux in `unit` to `cm-2 s-1`
fn flux_unit_scale(unit: &str) -> Result<f64> {
    match unit.trim() {
        "cm-2 s-1" | "1 / (cm2 s)" => Ok(1.0),
        "m-2 s-1" | "1 / (m2 s)" => Ok(1e-4),
        other => Err(TableError::UnsupportedUnit(other.to_string())),
    }
}

/// Time values of the bins with lower and upper errors, ready for plotting
#[derive(Debug, Clone, PartialEq)]
pub enum TimesAndErrors {
    /// MJD or JD values, errors in days
    Numeric {
        times: Vec<f64>,
        errors: (Vec<f64>, Vec<f64>),
    },
    /// Calendar dates
    Iso {
        times: Vec<NaiveDateTime>,
        errors: (Vec<chrono::Duration>, Vec<chrono::Duration>),
    },
}

/// Flux light curve backed by a table.
///
/// The table needs `time_min` and `time_max` columns holding the bin edges
/// as MJD in the scale given by the `TIMESYS` metadata entry (UTC when
/// absent). Flux columns are optional until a flux accessor asks for them.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurve {
    table: Table,
}

impl LightCurve {
    /// # Errors
    /// * `TableError::MissingColumn` - `time_min` or `time_max` is absent
    pub fn new(table: Table) -> Result<Self> {
        table.float_column("time_min")?;
        table.float_column("time_max")?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn time_scale(&self) -> Result<TimeScale> {
        match self.table.meta().get("TIMESYS") {
            Some(scale) => scale.parse(),
            None => Ok(TimeScale::Utc),
        }
    }

    pub fn time_format(&self) -> TimeFormat {
        TimeFormat::Mjd
    }

    fn time_column(&self, name: &str) -> Result<Time> {
        Ok(Time::from_mjd(
            self.table.float_column(name)?.to_vec(),
            self.time_scale()?,
        ))
    }

    pub fn time_min(&self) -> Result<Time> {
        self.time_column("time_min")
    }

    pub fn time_max(&self) -> Result<Time> {
        self.time_column("time_max")
    }

    /// Bin centres
    pub fn time(&self) -> Result<Time> {
        let (min, max) = self.time_edges()?;
        let mid = min.iter().zip(max).map(|(lo, hi)| 0.5 * (lo + hi)).collect();
        Ok(Time::from_mjd(mid, self.time_scale()?))
    }

    /// Bin widths
    pub fn time_delta(&self) -> Result<TimeDelta> {
        let (min, max) = self.time_edges()?;
        Ok(TimeDelta::from_days(
            min.iter().zip(max).map(|(lo, hi)| hi - lo).collect(),
        ))
    }

    fn time_edges(&self) -> Result<(&[f64], &[f64])> {
        Ok((
            self.table.float_column("time_min")?,
            self.table.float_column("time_max")?,
        ))
    }

    /// Bin centres with the distances to the bin edges as lower and upper
    /// errors.
    pub fn times_and_errors(&self, format: TimeFormat) -> Result<TimesAndErrors> {
        let time = self.time()?;
        let (min, max) = self.time_edges()?;
        let lower: Vec<f64> = time.mjd().iter().zip(min).map(|(t, lo)| t - lo).collect();
        let upper: Vec<f64> = max.iter().zip(time.mjd()).map(|(hi, t)| hi - t).collect();

        Ok(match format {
            TimeFormat::Mjd => TimesAndErrors::Numeric {
                times: time.mjd().to_vec(),
                errors: (lower, upper),
            },
            TimeFormat::Jd => TimesAndErrors::Numeric {
                times: time.mjd().iter().map(|t| t + MJD_TO_JD).collect(),
                errors: (lower, upper),
            },
            TimeFormat::Iso => TimesAndErrors::Iso {
                times: time.to_datetime()?,
                errors: (
                    lower.into_iter().map(days_to_duration).collect(),
                    upper.into_iter().map(days_to_duration).collect(),
                ),
            },
        })
    }

    fn flux_column(&self, name: &str, unit: &str) -> Result<Vec<f64>> {
        let column = self.table.column(name)?;
        let from = column.unit().unwrap_or(DEFAULT_FLUX_UNIT);
        let scale = flux_unit_scale(from)? / flux_unit_scale(unit)?;
        Ok(self
            .table
            .float_column(name)?
            .iter()
            .map(|v| v * scale)
            .collect())
    }

    /// Fluxes in `unit` with lower and upper errors.
    ///
    /// Asymmetric errors come from `flux_errn`/`flux_errp` when both are
    /// present, otherwise `flux_err` is used for both sides.
    pub fn fluxes_and_errors(&self, unit: &str) -> Result<(Vec<f64>, (Vec<f64>, Vec<f64>))> {
        let flux = self.flux_column("flux", unit)?;

        let errors = if self.table.has_column("flux_errn") && self.table.has_column("flux_errp") {
            (
                self.flux_column("flux_errn", unit)?,
                self.flux_column("flux_errp", unit)?,
            )
        } else {
            let err = self.flux_column("flux_err", unit)?;
            (err.clone(), err)
        };

        Ok((flux, errors))
    }

    /// Upper-limit flags and upper-limit fluxes in `unit`
    pub fn flux_uls(&self, unit: &str) -> Result<(Vec<bool>, Vec<f64>)> {
        let is_ul = self.table.bool_column("is_ul")?.to_vec();
        Ok((is_ul, self.flux_column("flux_ul", unit)?))
    }

    pub fn read(path: &Path, format: TableFormat) -> Result<Self> {
        let table = read_table(path, format)?;
        log::debug!(
            "read light curve with {} rows from {}",
            table.len(),
            path.display()
        );
        Self::new(table)
    }

    pub fn write(&self, path: &Path, format: TableFormat) -> Result<()> {
        if format == TableFormat::Csv && self.time_scale()? != TimeScale::Utc {
            log::warn!(
                "CSV does not store the time scale, {} will read back as utc",
                self.time_scale()?
            );
        }
        write_table(&self.table, path, format)
    }
}

impl fmt::Display for LightCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightCurve(len={})", self.len())
    }
}

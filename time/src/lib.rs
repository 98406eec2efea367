//! Light curves and time handling for gamma-ray analysis.
//!
//! A [`LightCurve`] wraps a [`Table`] whose rows are time bins (`time_min`,
//! `time_max` in MJD) with flux measurements. The time scale travels in the
//! table metadata under `TIMESYS`. Tables persist as CSV or ECSV; only ECSV
//! keeps units and metadata.
//!
//! # Example
//!
//! ```rust
//! use gamma_time::{Column, LightCurve, Table, TimeFormat, TimesAndErrors};
//!
//! # fn main() -> Result<(), gamma_time::TableError> {
//! let table = Table::new(vec![
//!     Column::float("time_min", vec![55197.0, 55199.0]),
//!     Column::float("time_max", vec![55199.0, 55206.0]),
//! ])?
//! .with_meta("TIMESYS", "utc");
//! let lc = LightCurve::new(table)?;
//!
//! assert_eq!(lc.to_string(), "LightCurve(len=2)");
//! if let TimesAndErrors::Numeric { times, .. } = lc.times_and_errors(TimeFormat::Mjd)? {
//!     assert_eq!(times, vec![55198.0, 55202.5]);
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod io;
pub mod lightcurve;
pub mod table;
pub mod time;

pub use io::{read_table, write_table, TableFormat};
pub use lightcurve::{LightCurve, TimesAndErrors};
pub use table::{Column, ColumnData, Table};
pub use time::{Time, TimeDelta, TimeFormat, TimeScale};

/// Errors raised by tables, light curves and their I/O.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {found} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Column '{name}' is not of type {expected}")]
    ColumnType { name: String, expected: &'static str },

    #[error("Cannot parse '{value}' in column '{column}', row {row}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid ECSV header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported flux unit '{0}'")]
    UnsupportedUnit(String),

    #[error("Unknown time scale '{0}'")]
    UnknownTimeScale(String),

    #[error("Unknown table format '{0}'")]
    UnknownFormat(String),

    #[error("Invalid time '{0}'")]
    InvalidTime(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;

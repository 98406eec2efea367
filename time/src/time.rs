//! Time scales, formats and conversions between MJD and calendar dates.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{Result, TableError};

/// Offset between Julian date and modified Julian date
pub const MJD_TO_JD: f64 = 2_400_000.5;

const MICROSECONDS_PER_DAY: f64 = 86_400e6;

/// Time scale in which time values are expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeScale {
    #[default]
    Utc,
    Tai,
    Tt,
    Tdb,
}

impl TimeScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeScale::Utc => "utc",
            TimeScale::Tai => "tai",
            TimeScale::Tt => "tt",
            TimeScale::Tdb => "tdb",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(TimeScale::Utc),
            "tai" => Ok(TimeScale::Tai),
            "tt" => Ok(TimeScale::Tt),
            "tdb" => Ok(TimeScale::Tdb),
            _ => Err(TableError::UnknownTimeScale(s.to_string())),
        }
    }
}

/// Representation used when presenting time values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    #[default]
    Mjd,
    Jd,
    Iso,
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeFormat::Mjd => "mjd",
            TimeFormat::Jd => "jd",
            TimeFormat::Iso => "iso",
        };
        write!(f, "{name}")
    }
}

fn mjd_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1858, 11, 17)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Calendar date of a modified Julian date, to the microsecond
pub fn mjd_to_datetime(mjd: f64) -> Option<NaiveDateTime> {
    if !mjd.is_finite() {
        return None;
    }
    mjd_epoch().checked_add_signed(days_to_duration(mjd))
}

/// Modified Julian date of a calendar date
pub fn datetime_to_mjd(datetime: NaiveDateTime) -> f64 {
    let elapsed = datetime - mjd_epoch();
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / MICROSECONDS_PER_DAY,
        None => elapsed.num_milliseconds() as f64 / 86_400e3,
    }
}

/// Duration of a number of days, to the microsecond
pub fn days_to_duration(days: f64) -> chrono::Duration {
    chrono::Duration::microseconds((days * MICROSECONDS_PER_DAY).round() as i64)
}

/// Parse an ISO 8601 date or date-time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` and the same with a
/// space instead of `T`.
pub fn parse_iso(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    let invalid = || TableError::InvalidTime(value.to_string());

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).ok_or_else(invalid);
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| invalid())
}

/// Array of time instants, stored as MJD in a given scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Time {
    mjd: Vec<f64>,
    scale: TimeScale,
    format: TimeFormat,
}

impl Time {
    pub fn from_mjd(mjd: Vec<f64>, scale: TimeScale) -> Self {
        Self {
            mjd,
            scale,
            format: TimeFormat::Mjd,
        }
    }

    /// Times from ISO 8601 strings, see [`parse_iso`]
    pub fn from_iso<S: AsRef<str>>(values: &[S], scale: TimeScale) -> Result<Self> {
        let mjd = values
            .iter()
            .map(|value| parse_iso(value.as_ref()).map(datetime_to_mjd))
            .collect::<Result<Vec<f64>>>()?;
        Ok(Self {
            mjd,
            scale,
            format: TimeFormat::Iso,
        })
    }

    pub fn with_format(self, format: TimeFormat) -> Self {
        Self { format, ..self }
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn format(&self) -> TimeFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.mjd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mjd.is_empty()
    }

    pub fn mjd(&self) -> &[f64] {
        &self.mjd
    }

    pub fn jd(&self) -> Vec<f64> {
        self.mjd.iter().map(|mjd| mjd + MJD_TO_JD).collect()
    }

    /// Calendar dates.
    ///
    /// # Errors
    /// * `TableError::InvalidTime` - a value is not finite or out of the
    ///   representable date range
    pub fn to_datetime(&self) -> Result<Vec<NaiveDateTime>> {
        self.mjd
            .iter()
            .map(|&mjd| {
                mjd_to_datetime(mjd).ok_or_else(|| TableError::InvalidTime(mjd.to_string()))
            })
            .collect()
    }

    /// ISO 8601 strings with millisecond precision
    pub fn iso(&self) -> Result<Vec<String>> {
        Ok(self
            .to_datetime()?
            .into_iter()
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            .collect())
    }
}

/// Array of time intervals in days.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDelta {
    days: Vec<f64>,
    scale: TimeScale,
    format: TimeFormat,
}

impl TimeDelta {
    /// Intervals in days, expressed in TAI as Julian days
    pub fn from_days(days: Vec<f64>) -> Self {
        Self {
            days,
            scale: TimeScale::Tai,
            format: TimeFormat::Jd,
        }
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Interval lengths in days
    pub fn jd(&self) -> &[f64] {
        &self.days
    }

    pub fn to_durations(&self) -> Vec<chrono::Duration> {
        self.days.iter().map(|&days| days_to_duration(days)).collect()
    }
}

//! Reading and writing tables as CSV and ECSV.
//!
//! CSV files hold a header row of column names followed by the values;
//! units and metadata are lost and column types are inferred on read.
//! ECSV files prefix the same body (space separated) with a `#` comment
//! header declaring every column's name, unit and datatype plus the table
//! metadata, so a round-trip restores the table exactly. Header entries
//! are written as JSON flow mappings, which are valid YAML.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::{Column, ColumnData, Table};
use crate::{Result, TableError};

const ECSV_SIGNATURE: &str = "%ECSV 1.0";

/// Supported on-disk table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Ecsv,
}

impl FromStr for TableFormat {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "ascii.csv" => Ok(TableFormat::Csv),
            "ecsv" | "ascii.ecsv" => Ok(TableFormat::Ecsv),
            _ => Err(TableError::UnknownFormat(s.to_string())),
        }
    }
}

/// Column declaration in an ECSV header
#[derive(Debug, Serialize, Deserialize)]
struct ColumnSpec {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    datatype: String,
}

pub fn write_table(table: &Table, path: &Path, format: TableFormat) -> Result<()> {
    match format {
        TableFormat::Csv => {
            let writer = csv::Writer::from_path(path)?;
            write_body(table, writer)
        }
        TableFormat::Ecsv => {
            let mut file = BufWriter::new(File::create(path)?);
            writeln!(file, "# {ECSV_SIGNATURE}")?;
            writeln!(file, "# ---")?;
            writeln!(file, "# datatype:")?;
            for column in table.columns() {
                let spec = ColumnSpec {
                    name: column.name().to_string(),
                    unit: column.unit().map(str::to_string),
                    datatype: column.data().datatype().to_string(),
                };
                writeln!(file, "# - {}", serde_json::to_string(&spec)?)?;
            }
            if !table.meta().is_empty() {
                writeln!(file, "# meta: {}", serde_json::to_string(table.meta())?)?;
            }
            writeln!(file, "# schema: astropy-2.0")?;

            let writer = csv::WriterBuilder::new()
                .delimiter(b' ')
                .from_writer(file);
            write_body(table, writer)
        }
    }
}

fn write_body<W: Write>(table: &Table, mut writer: csv::Writer<W>) -> Result<()> {
    writer.write_record(table.column_names())?;
    for row in 0..table.len() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| match column.data() {
                ColumnData::Float(values) => format_float(values[row]),
                ColumnData::Bool(values) => format_bool(values[row]).to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        value.to_string()
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(f64::NAN);
    }
    value.parse().ok()
}

pub fn read_table(path: &Path, format: TableFormat) -> Result<Table> {
    match format {
        TableFormat::Csv => {
            let reader = csv::Reader::from_path(path)?;
            let (names, cells) = read_body(reader)?;

            let columns = names
                .iter()
                .zip(cells)
                .map(|(name, values)| infer_column(name, &values))
                .collect::<Result<Vec<Column>>>()?;
            Table::new(columns)
        }
        TableFormat::Ecsv => {
            let content = std::fs::read_to_string(path)?;
            let (specs, meta) = parse_ecsv_header(&content)?;

            let reader = csv::ReaderBuilder::new()
                .delimiter(b' ')
                .comment(Some(b'#'))
                .from_reader(content.as_bytes());
            let (names, cells) = read_body(reader)?;

            let declared: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
            if names != declared {
                return Err(TableError::InvalidHeader(format!(
                    "columns {names:?} do not match declared {declared:?}"
                )));
            }

            let columns = specs
                .iter()
                .zip(cells)
                .map(|(spec, values)| {
                    let column = typed_column(spec, &values)?;
                    Ok(match &spec.unit {
                        Some(unit) => column.with_unit(unit),
                        None => column,
                    })
                })
                .collect::<Result<Vec<Column>>>()?;
            Ok(Table::new(columns)?.with_meta_map(meta))
        }
    }
}

/// Column names and the raw cells of each column
fn read_body<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let names: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut cells = vec![Vec::new(); names.len()];

    for result in reader.records() {
        let record = result?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }
    Ok((names, cells))
}

fn parse_error(column: &str, row: usize, value: &str) -> TableError {
    TableError::Parse {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

fn parse_floats(name: &str, values: &[String]) -> Result<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| parse_float(v).ok_or_else(|| parse_error(name, row, v)))
        .collect()
}

fn parse_bools(name: &str, values: &[String]) -> Result<Vec<bool>> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| parse_bool(v).ok_or_else(|| parse_error(name, row, v)))
        .collect()
}

/// Bool column when every cell is a boolean literal, float otherwise
fn infer_column(name: &str, values: &[String]) -> Result<Column> {
    if !values.is_empty() && values.iter().all(|v| parse_bool(v).is_some()) {
        return Ok(Column::bool(name, parse_bools(name, values)?));
    }
    Ok(Column::float(name, parse_floats(name, values)?))
}

fn typed_column(spec: &ColumnSpec, values: &[String]) -> Result<Column> {
    match spec.datatype.as_str() {
        "bool" => Ok(Column::bool(&spec.name, parse_bools(&spec.name, values)?)),
        "float64" | "float32" | "int64" | "int32" | "int16" | "int8" => {
            Ok(Column::float(&spec.name, parse_floats(&spec.name, values)?))
        }
        other => {
            log::warn!(
                "column '{}' has datatype '{other}', reading it as float64",
                spec.name
            );
            Ok(Column::float(&spec.name, parse_floats(&spec.name, values)?))
        }
    }
}

fn parse_ecsv_header(content: &str) -> Result<(Vec<ColumnSpec>, BTreeMap<String, String>)> {
    let mut lines = content.lines().map_while(|line| line.strip_prefix('#'));

    match lines.next() {
        Some(first) if first.trim() == ECSV_SIGNATURE => {}
        _ => {
            return Err(TableError::InvalidHeader(format!(
                "missing '{ECSV_SIGNATURE}' signature"
            )))
        }
    }

    let mut specs = Vec::new();
    let mut meta = BTreeMap::new();
    for line in lines {
        let line = line.trim();
        if let Some(entry) = line.strip_prefix("- ") {
            specs.push(serde_json::from_str::<ColumnSpec>(entry)?);
        } else if let Some(entry) = line.strip_prefix("meta:") {
            let map: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(entry.trim())?;
            for (key, value) in map {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                meta.insert(key, value);
            }
        }
    }

    if specs.is_empty() {
        return Err(TableError::InvalidHeader(
            "no column declarations found".to_string(),
        ));
    }
    Ok((specs, meta))
}

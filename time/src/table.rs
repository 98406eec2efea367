//! Column-oriented tables with units and string metadata.

use std::collections::BTreeMap;

use crate::{Result, TableError};

/// Values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Bool(Vec<bool>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(values) => values.len(),
            ColumnData::Bool(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Datatype name as written to ECSV headers
    pub fn datatype(&self) -> &'static str {
        match self {
            ColumnData::Float(_) => "float64",
            ColumnData::Bool(_) => "bool",
        }
    }
}

/// Named column with an optional unit string
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    unit: Option<String>,
}

impl Column {
    pub fn float(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            data: ColumnData::Float(values),
            unit: None,
        }
    }

    pub fn bool(name: &str, values: Vec<bool>) -> Self {
        Self {
            name: name.to_string(),
            data: ColumnData::Bool(values),
            unit: None,
        }
    }

    pub fn with_unit(self, unit: &str) -> Self {
        Self {
            unit: Some(unit.to_string()),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Table of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    meta: BTreeMap<String, String>,
}

impl Table {
    /// # Errors
    /// * `TableError::DuplicateColumn` - two columns share a name
    /// * `TableError::LengthMismatch` - columns differ in length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(TableError::LengthMismatch {
                    name: bad.name.clone(),
                    expected: first.len(),
                    found: bad.len(),
                });
            }
        }

        Ok(Self {
            columns,
            meta: BTreeMap::new(),
        })
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn with_meta_map(self, meta: BTreeMap<String, String>) -> Self {
        Self { meta, ..self }
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn float_column(&self, name: &str) -> Result<&[f64]> {
        match &self.column(name)?.data {
            ColumnData::Float(values) => Ok(values),
            ColumnData::Bool(_) => Err(TableError::ColumnType {
                name: name.to_string(),
                expected: "float64",
            }),
        }
    }

    pub fn bool_column(&self, name: &str) -> Result<&[bool]> {
        match &self.column(name)?.data {
            ColumnData::Bool(values) => Ok(values),
            ColumnData::Float(_) => Err(TableError::ColumnType {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }
}

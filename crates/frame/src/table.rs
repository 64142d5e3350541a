use std::fmt;

use serde::Serialize;

use crate::value::{ColumnType, TypeClass, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self { name: name.into(), dtype }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }
}

#[derive(Debug)]
pub enum TableError {
    /// Row width does not match the schema.
    RowWidth { row: usize, expected: usize, found: usize },
    /// Two columns share a name.
    DuplicateColumn(String),
    /// Column lookup failed.
    UnknownColumn(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowWidth { row, expected, found } => {
                write!(f, "row {row}: expected {expected} values, found {found}")
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
            Self::UnknownColumn(name) => write!(f, "unknown column '{name}'"),
        }
    }
}

impl std::error::Error for TableError {}

/// Row-major table with a typed schema.
///
/// Row order carries no meaning for validation; it is preserved so that
/// results are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|o| o.name == c.name) {
                return Err(TableError::DuplicateColumn(c.name.clone()));
            }
        }
        Ok(Self { columns, rows: Vec::new() })
    }

    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Coarse type class of a column, if it exists.
    pub fn type_class(&self, name: &str) -> Option<TypeClass> {
        self.column(name).map(|c| c.dtype.class())
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn values(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Key tuple of a row for the given column positions.
    pub fn key_of(&self, row: usize, positions: &[usize]) -> Vec<&Value> {
        positions.iter().map(|&p| &self.rows[row][p]).collect()
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Append a column. The value count must match the row count.
    pub fn with_column(mut self, column: Column, values: Vec<Value>) -> Result<Table, TableError> {
        if self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::RowWidth {
                row: values.len().min(self.rows.len()),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(column);
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(self)
    }

    pub fn drop_column(mut self, name: &str) -> Result<Table, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(self)
    }
}

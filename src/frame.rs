//! Column-indexed in-memory table.
//!
//! Uploads arrive with whatever columns the export happened to carry, so the
//! table keeps its schema as runtime data: an ordered list of named columns,
//! each holding one [`Cell`] per row. [`RawTable`] wraps what the loader
//! produced; [`CleanTable`] can only be built by the cleaner and is what the
//! session, aggregator, chart builder and sink read.

use std::ops::Deref;

use crate::{
    data::{Cell, CellKey},
    error::{InsightsError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.values
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table from row-major data. Short rows are padded with
    /// [`Cell::Empty`]; cells beyond the header width are ignored.
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: Vec<Vec<Cell>>) -> Self {
        let mut columns = headers
            .iter()
            .map(|name| Column::new(name.as_ref(), Vec::with_capacity(rows.len())))
            .collect::<Vec<_>>();
        let row_count = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(Cell::Empty));
            }
        }
        Self { columns, row_count }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|column| column.len() != row_count) {
            return Err(InsightsError::Parse(format!(
                "column '{}' has {} value(s), expected {}",
                bad.name,
                bad.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Table::column`] but reports an absent column as
    /// [`InsightsError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| InsightsError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|c| c.values.get(row))
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.columns.iter().filter_map(move |c| c.values.get(row))
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count).map(move |idx| self.row(idx).collect())
    }

    pub fn row_key(&self, row: usize) -> Vec<CellKey> {
        self.row(row).map(Cell::key).collect()
    }

    pub(crate) fn column_at_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    /// Keeps the rows whose flag is `true`, preserving their order.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column
                .values
                .retain(|_| flags.next().copied().unwrap_or(false));
        }
        self.row_count = keep.iter().filter(|flag| **flag).count();
    }

    /// Replaces the named column in place, or appends it when absent.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.row_count);
        match self.column_index(name) {
            Some(idx) => self.columns[idx].values = values,
            None => self.columns.push(Column::new(name, values)),
        }
    }
}

/// Table as parsed from an upload, before any cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable(Table);

impl RawTable {
    pub fn new(table: Table) -> Self {
        Self(table)
    }

    pub fn table(&self) -> &Table {
        &self.0
    }
}

impl Deref for RawTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}

impl From<Table> for RawTable {
    fn from(table: Table) -> Self {
        Self(table)
    }
}

impl From<CleanTable> for RawTable {
    fn from(clean: CleanTable) -> Self {
        Self(clean.0)
    }
}

/// Table that went through [`crate::clean::Cleaner`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable(Table);

impl CleanTable {
    pub(crate) fn from_table(table: Table) -> Self {
        Self(table)
    }

    pub fn table(&self) -> &Table {
        &self.0
    }
}

impl Deref for CleanTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}

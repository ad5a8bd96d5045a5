//! Forward-only result sets.

use std::sync::Arc;

use sqlhelpers::{Column, Cursor, Row, SqlValue};

/// The rows of a query, read one at a time like a data reader.
///
/// Before the first [`read`](Self::read) and after the last row the cursor
/// is not positioned, and field lookups return nothing.
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Arc<[Column]>,
    rows: Vec<Row>,
    position: Option<usize>,
}

impl ResultSet {
    /// Build a result set. Every row must be as wide as `columns`.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<SqlValue>>) -> sqlhelpers::Result<Self> {
        let columns: Arc<[Column]> = columns.into();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect::<sqlhelpers::Result<Vec<_>>>()?;
        Ok(Self {
            columns,
            rows,
            position: None,
        })
    }

    /// Advance to the next row. Returns `false` once the rows run out.
    pub fn read(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    /// The row the cursor is on.
    #[must_use]
    pub fn current(&self) -> Option<&Row> {
        self.position.and_then(|p| self.rows.get(p))
    }

    /// Read every remaining row through `f`.
    pub fn read_all<T, F>(&mut self, mut f: F) -> sqlhelpers::Result<Vec<T>>
    where
        F: FnMut(&Self) -> sqlhelpers::Result<T>,
    {
        let mut out = Vec::new();
        while self.read() {
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Cursor for ResultSet {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    fn value(&self, field_name: &str) -> Option<&SqlValue> {
        self.current()?.value(field_name)
    }
}

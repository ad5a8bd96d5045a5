//! Result-set cursors and an owned row.

use std::sync::Arc;

use sqlhelpers_types::{SqlDbType, SqlValue};

use crate::error::{Error, Result};

/// Whether two field names are equal ignoring case.
///
/// ASCII names compare without allocating; anything else compares by its
/// Unicode lowercase form.
#[must_use]
pub fn field_names_match(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.to_lowercase() == b.to_lowercase()
}

/// A positioned result-set cursor.
///
/// Implemented by database client adapters. Field names are matched
/// case-insensitively (see [`field_names_match`]), as SQL Server does.
pub trait Cursor {
    /// Number of fields in the current row.
    fn field_count(&self) -> usize;

    /// Name of the field at `index`.
    fn field_name(&self, index: usize) -> Option<&str>;

    /// Raw cell of the named field in the current row.
    fn value(&self, field_name: &str) -> Option<&SqlValue>;

    /// Whether the result set has a field with this name.
    fn has_field(&self, field_name: &str) -> bool {
        (0..self.field_count())
            .filter_map(|i| self.field_name(i))
            .any(|name| field_names_match(name, field_name))
    }
}

impl<C: Cursor + ?Sized> Cursor for &C {
    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        (**self).field_name(index)
    }

    fn value(&self, field_name: &str) -> Option<&SqlValue> {
        (**self).value(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        (**self).has_field(field_name)
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column index.
    pub index: usize,
    /// Declared column kind.
    pub db_type: SqlDbType,
    /// Whether the column is nullable.
    pub nullable: bool,
}

impl Column {
    /// Create column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize, db_type: SqlDbType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            index,
            db_type,
            nullable,
        }
    }
}

/// A row from a query result.
///
/// Rows of one result set share their column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create a new row from columns and values.
    pub fn new(columns: Arc<[Column]>, values: Vec<SqlValue>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::ArgumentOutOfRange {
                argument: "values",
                message: format!("{} values for {} columns", values.len(), columns.len()),
            });
        }
        Ok(Self { columns, values })
    }

    /// Build a row from `(name, value)` pairs. Column kinds are taken from
    /// each value; NULL cells are declared `sql_variant`.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SqlValue)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (name, value))| {
                let db_type = value.natural_type().unwrap_or(SqlDbType::Variant);
                (Column::new(name, index, db_type, true), value)
            })
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Get the raw SQL value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Get the raw SQL value by column name.
    #[must_use]
    pub fn get_raw_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| field_names_match(&c.name, name))
            .and_then(|i| self.values.get(i))
    }

    /// Get the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Iterate over (column, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Column, &SqlValue)> {
        self.columns.iter().zip(self.values.iter())
    }
}

impl Cursor for Row {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    fn value(&self, field_name: &str) -> Option<&SqlValue> {
        self.get_raw_by_name(field_name)
    }
}

impl IntoIterator for Row {
    type Item = SqlValue;
    type IntoIter = std::vec::IntoIter<SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a SqlValue;
    type IntoIter = std::slice::Iter<'a, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let row = Row::from_pairs([("Id", SqlValue::Int(7)), ("Name", SqlValue::Null)]);

        assert_eq!(row.value("id"), Some(&SqlValue::Int(7)));
        assert_eq!(row.value("NAME"), Some(&SqlValue::Null));
        assert_eq!(row.value("missing"), None);
        assert!(row.has_field("iD"));
        assert!(!row.has_field("other"));
        assert_eq!(row.columns()[1].db_type, SqlDbType::Variant);
    }

    #[test]
    fn test_lookup_folds_non_ascii_case() {
        let row = Row::from_pairs([("Größe", SqlValue::Int(3)), ("ÉTAT", SqlValue::Int(1))]);

        assert_eq!(row.value("GRÖSSE"), None);
        assert_eq!(row.value("GRÖßE"), Some(&SqlValue::Int(3)));
        assert_eq!(row.value("état"), Some(&SqlValue::Int(1)));
        assert!(row.has_field("größe"));
        assert!(field_names_match("Ωmega", "ωMEGA"));
        assert!(!field_names_match("a", "b"));
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let columns: Arc<[Column]> = vec![Column::new("v", 0, SqlDbType::Int, false)].into();
        assert!(Row::new(Arc::clone(&columns), vec![SqlValue::Int(1)]).is_ok());
        assert!(matches!(
            Row::new(columns, Vec::new()),
            Err(Error::ArgumentOutOfRange { .. })
        ));
    }

    #[test]
    fn test_iteration() {
        let row = Row::from_pairs([("a", SqlValue::Int(1)), ("b", SqlValue::Int(2))]);
        let names: Vec<_> = row.iter().map(|(c, _)| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.into_iter().collect::<Vec<_>>(), [SqlValue::Int(1), SqlValue::Int(2)]);
    }
}

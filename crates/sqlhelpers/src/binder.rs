//! Command parameter binding.
//!
//! [`ParameterBinder`] turns Rust values into [`BoundParameter`]s: plain
//! scalars, or table-valued parameters built from rows and a column
//! description. Date-times are converted to their stored form under the
//! [`Policy`] on the way in.
//!
//! Single-column tables are common enough (`WHERE id IN (SELECT v FROM @ids)`)
//! to get their own helpers. They bind against generic table types that
//! follow a naming convention:
//!
//! ```text
//! {schema}.TableType_Generic_{Kind}[_Nullable]
//! ```
//!
//! with a single column named `v`. For example, a non-nullable list of
//! `INT`s binds as `dbo.TableType_Generic_Int`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlhelpers_types::{ColumnEncoding, SqlDbType, SqlValue, TableValue, ToSql, TypeSize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::time;

/// Field name of the single column in generic table types.
pub const DEFAULT_FIELD_NAME: &str = "v";

/// One column of a table-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Field name in the table type.
    pub name: String,
    /// Declared kind and length.
    pub type_size: TypeSize,
}

impl TableColumn {
    /// Create a column description.
    #[must_use]
    pub fn new(name: impl Into<String>, type_size: impl Into<TypeSize>) -> Self {
        Self {
            name: name.into(),
            type_size: type_size.into(),
        }
    }
}

/// Value of a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// A single value. NULL is an explicit database null.
    Scalar {
        /// Declared kind and length.
        type_size: TypeSize,
        /// The value.
        value: SqlValue,
    },
    /// A table-valued parameter.
    Structured(TableValue),
}

/// A named parameter ready to be appended to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Parameter name, as given.
    pub name: String,
    /// Parameter value.
    pub value: ParameterValue,
}

impl BoundParameter {
    /// The scalar value, if this is a scalar parameter.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&SqlValue> {
        match &self.value {
            ParameterValue::Scalar { value, .. } => Some(value),
            ParameterValue::Structured(_) => None,
        }
    }

    /// The table, if this is a table-valued parameter.
    #[must_use]
    pub fn as_table(&self) -> Option<&TableValue> {
        match &self.value {
            ParameterValue::Structured(table) => Some(table),
            ParameterValue::Scalar { .. } => None,
        }
    }
}

/// Builds [`BoundParameter`]s under a [`Policy`].
#[derive(Debug, Clone, Copy)]
pub struct ParameterBinder<'p> {
    policy: &'p Policy,
}

impl<'p> ParameterBinder<'p> {
    /// Create a binder using `policy`.
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    #[must_use]
    pub fn policy(&self) -> &'p Policy {
        self.policy
    }

    /// Bind a single value.
    ///
    /// With UTC storage a date-time value is converted from local time to
    /// UTC, unless the descriptor is a calendar `DATE`.
    pub fn bind_scalar<T: ToSql + ?Sized>(
        &self,
        name: &str,
        value: &T,
        type_size: TypeSize,
    ) -> Result<BoundParameter> {
        validate_parameter_name(name)?;

        let mut value = value.to_sql();
        if !type_size.db_type().is_date_only() {
            self.to_storage(&mut value);
        }
        tracing::debug!(name = name, kind = %type_size.db_type(), "bound scalar parameter");

        Ok(BoundParameter {
            name: name.to_string(),
            value: ParameterValue::Scalar { type_size, value },
        })
    }

    /// Bind a table-valued parameter.
    ///
    /// `rows` is consumed once; every row must have exactly one value per
    /// column. Zero rows bind as the explicit no-rows marker. Columns whose
    /// kind cannot be described take their type from the first non-null
    /// value, after a diagnostic.
    pub fn bind_table<R, C>(
        &self,
        name: &str,
        type_name: &str,
        rows: R,
        columns: &[TableColumn],
    ) -> Result<BoundParameter>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = SqlValue>,
    {
        validate_parameter_name(name)?;
        validate_type_name(type_name)?;
        validate_columns(columns)?;

        let encodings = columns
            .iter()
            .map(|c| Ok(c.type_size.to_column_encoding(&c.name)?))
            .collect::<Result<Vec<_>>>()?;
        for (column, _) in columns.iter().zip(&encodings).filter(|(_, e)| e.is_none()) {
            self.policy.diagnostics.emit(format!(
                "no table-valued parameter metadata for {} column '{}'; inferring its type from data",
                column.type_size.db_type(),
                column.name
            ));
        }

        let mut records = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let mut cells: Vec<SqlValue> = row.into_iter().collect();
            if cells.len() != columns.len() {
                return Err(Error::ArgumentOutOfRange {
                    argument: "rows",
                    message: format!(
                        "row {index} has {} values, expected {}",
                        cells.len(),
                        columns.len()
                    ),
                });
            }
            for (cell, column) in cells.iter_mut().zip(columns) {
                if !column.type_size.db_type().is_date_only() {
                    self.to_storage(cell);
                }
            }
            records.push(cells);
        }

        if records.is_empty() {
            tracing::debug!(name = name, type_name = type_name, "bound table parameter with no rows");
            return Ok(Self::structured(name, TableValue::no_rows(type_name)));
        }

        let mut metadata = Vec::with_capacity(columns.len());
        for (index, (column, encoding)) in columns.iter().zip(encodings).enumerate() {
            let encoding = match encoding {
                Some(encoding) => encoding,
                None => self.infer_column(index, column, &records)?,
            };
            if let Some(format) = encoding.text_format {
                for cell in records.iter_mut().filter_map(|row| row.get_mut(index)) {
                    *cell = format.encode(cell)?;
                }
            }
            metadata.push(encoding.metadata);
        }

        let table = TableValue::from_records(type_name, metadata, records)?;
        tracing::debug!(
            name = name,
            type_name = type_name,
            rows = table.len(),
            columns = table.column_count(),
            "bound table parameter"
        );
        Ok(Self::structured(name, table))
    }

    /// Bind a sequence as a single-column table of a user-defined type.
    pub fn bind_column<I>(
        &self,
        name: &str,
        values: I,
        type_size: TypeSize,
        type_name: &str,
        field_name: &str,
    ) -> Result<BoundParameter>
    where
        I: IntoIterator,
        I::Item: ToSql,
    {
        let columns = [TableColumn::new(field_name, type_size)];
        let rows = values.into_iter().map(|v| [v.to_sql()]);
        self.bind_table(name, type_name, rows, &columns)
    }

    /// Bind a sequence as a generic single-column table.
    ///
    /// `CHAR` and `NCHAR` bind as `VARCHAR` and `NVARCHAR`, since generic
    /// table types are declared at maximum length.
    pub fn bind_values<I>(
        &self,
        name: &str,
        values: I,
        type_size: TypeSize,
        nullable: bool,
    ) -> Result<BoundParameter>
    where
        I: IntoIterator,
        I::Item: ToSql,
    {
        let type_size = match type_size.db_type() {
            SqlDbType::Char => TypeSize::with_size(SqlDbType::VarChar, type_size.size()),
            SqlDbType::NChar => TypeSize::with_size(SqlDbType::NVarChar, type_size.size()),
            _ => type_size,
        };
        let type_name = self.table_type_name(type_size, nullable);
        self.bind_column(name, values, type_size, &type_name, DEFAULT_FIELD_NAME)
    }

    /// Bind 32-bit integers as `TableType_Generic_Int`.
    pub fn bind_ints<I>(&self, name: &str, values: I) -> Result<BoundParameter>
    where
        I: IntoIterator<Item = i32>,
    {
        self.bind_values(name, values, TypeSize::new(SqlDbType::Int), false)
    }

    /// Bind 64-bit integers as `TableType_Generic_BigInt`.
    pub fn bind_longs<I>(&self, name: &str, values: I) -> Result<BoundParameter>
    where
        I: IntoIterator<Item = i64>,
    {
        self.bind_values(name, values, TypeSize::new(SqlDbType::BigInt), false)
    }

    /// Bind date-times as a non-nullable generic table of the given kind
    /// (`DATETIME`, `DATETIME2` or `DATE`).
    pub fn bind_date_times<I>(
        &self,
        name: &str,
        values: I,
        type_size: TypeSize,
    ) -> Result<BoundParameter>
    where
        I: IntoIterator<Item = chrono::NaiveDateTime>,
    {
        self.bind_values(name, values, type_size, false)
    }

    /// Bind GUIDs as `TableType_Generic_UniqueIdentifier`.
    pub fn bind_uuids<I>(&self, name: &str, values: I) -> Result<BoundParameter>
    where
        I: IntoIterator<Item = Uuid>,
    {
        self.bind_values(
            name,
            values,
            TypeSize::new(SqlDbType::UniqueIdentifier),
            false,
        )
    }

    /// Name of the generic table type for a kind.
    #[must_use]
    pub fn table_type_name(&self, type_size: TypeSize, nullable: bool) -> String {
        format!(
            "{}.TableType_Generic_{}{}",
            self.policy.table_type_schema,
            type_size.db_type(),
            if nullable { "_Nullable" } else { "" }
        )
    }

    fn structured(name: &str, table: TableValue) -> BoundParameter {
        BoundParameter {
            name: name.to_string(),
            value: ParameterValue::Structured(table),
        }
    }

    fn to_storage(&self, value: &mut SqlValue) {
        if let SqlValue::DateTime(v) = value {
            *v = time::to_storage(*v, self.policy);
        }
    }

    fn infer_column(
        &self,
        index: usize,
        column: &TableColumn,
        rows: &[Vec<SqlValue>],
    ) -> Result<ColumnEncoding> {
        let kind = column.type_size.db_type();
        rows.iter()
            .filter_map(|row| row.get(index))
            .find(|value| !value.is_null())
            .and_then(|sample| ColumnEncoding::infer_from_value(&column.name, sample))
            .ok_or_else(|| {
                Error::NotSupported(format!(
                    "{kind} column '{}' has no non-null value to infer a type from",
                    column.name
                ))
            })
    }
}

#[allow(clippy::expect_used)]
static PARAMETER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?[a-zA-Z_][a-zA-Z0-9_@#$]{0,127}$").expect("valid regex"));

#[allow(clippy::expect_used)]
static TYPE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z_][a-zA-Z0-9_@#$]{0,127}\.)?[a-zA-Z_][a-zA-Z0-9_@#$]{0,127}$")
        .expect("valid regex")
});

/// Validate a parameter name to prevent SQL injection through command text.
fn validate_parameter_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::ArgumentNull("name"));
    }
    if !PARAMETER_NAME_RE.is_match(name) {
        return Err(Error::InvalidIdentifier(format!(
            "invalid parameter name '{name}': must start with letter/underscore (after an \
             optional @), contain only alphanumerics/_/@/#/$, and be 1-128 characters"
        )));
    }
    Ok(())
}

fn validate_type_name(type_name: &str) -> Result<()> {
    if type_name.is_empty() {
        return Err(Error::ArgumentNull("type_name"));
    }
    if !TYPE_NAME_RE.is_match(type_name) {
        return Err(Error::InvalidIdentifier(format!(
            "invalid table type name '{type_name}': expected [schema.]name"
        )));
    }
    Ok(())
}

fn validate_columns(columns: &[TableColumn]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::Argument("a table type needs at least one column".into()));
    }
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if column.name.is_empty() {
            return Err(Error::Argument("column field name is empty".into()));
        }
        if !seen.insert(column.name.to_lowercase()) {
            return Err(Error::Argument(format!(
                "duplicate column field name '{}'",
                column.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::policy::LocalZone;
    use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
    use parking_lot::Mutex;
    use sqlhelpers_types::{ColumnLength, TableRows, TypeError};
    use std::sync::Arc;

    fn policy() -> Policy {
        Policy::default().with_local_zone(LocalZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap()))
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1993, 8, 23)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_generic_type_names() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);

        assert_eq!(
            binder.table_type_name(TypeSize::new(SqlDbType::Int), false),
            "dbo.TableType_Generic_Int"
        );
        assert_eq!(
            binder.table_type_name(TypeSize::new(SqlDbType::NVarChar), true),
            "dbo.TableType_Generic_NVarChar_Nullable"
        );

        let policy = Policy::default().with_table_type_schema("app");
        let binder = ParameterBinder::new(&policy);
        assert_eq!(
            binder.table_type_name(TypeSize::new(SqlDbType::DateTime2), false),
            "app.TableType_Generic_DateTime2"
        );
    }

    #[test]
    fn test_bind_ints() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder.bind_ints("@ids", [1, 2, 3]).unwrap();

        assert_eq!(param.name, "@ids");
        let table = param.as_table().unwrap();
        assert_eq!(table.type_name, "dbo.TableType_Generic_Int");
        assert_eq!(table.columns()[0].name, "v");
        assert_eq!(table.columns()[0].sql_type(), "INT");
        assert_eq!(
            table.rows(),
            &[vec![SqlValue::Int(1)], vec![SqlValue::Int(2)], vec![SqlValue::Int(3)]]
        );
    }

    #[test]
    fn test_zero_rows_is_no_rows_marker() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder.bind_longs("ids", Vec::new()).unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.rows, TableRows::NoRows);
        assert_eq!(table.type_name, "dbo.TableType_Generic_BigInt");
    }

    #[test]
    fn test_char_binds_as_varchar() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_values("codes", ["ab", "cd"], TypeSize::new(SqlDbType::Char), true)
            .unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.type_name, "dbo.TableType_Generic_VarChar_Nullable");
        assert_eq!(table.columns()[0].sql_type(), "VARCHAR(MAX)");
    }

    #[test]
    fn test_nullable_values() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_values("v", [None, Some(3), Some(5)], TypeSize::new(SqlDbType::Int), true)
            .unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.type_name, "dbo.TableType_Generic_Int_Nullable");
        assert_eq!(table.rows()[0], vec![SqlValue::Null]);
        assert_eq!(table.rows()[2], vec![SqlValue::Int(5)]);
    }

    #[test]
    fn test_row_width_mismatch() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let columns = [
            TableColumn::new("a", SqlDbType::Int),
            TableColumn::new("b", SqlDbType::BigInt),
        ];
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::BigInt(2)],
            vec![SqlValue::Int(1)],
        ];

        let result = binder.bind_table("t", "dbo.Pair", rows, &columns);
        assert!(matches!(
            result,
            Err(Error::ArgumentOutOfRange { argument: "rows", .. })
        ));
    }

    #[test]
    fn test_column_validation() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let none: Vec<Vec<SqlValue>> = Vec::new();

        assert!(matches!(
            binder.bind_table("t", "dbo.T", none.clone(), &[]),
            Err(Error::Argument(_))
        ));
        let duplicate = [
            TableColumn::new("a", SqlDbType::Int),
            TableColumn::new("A", SqlDbType::Int),
        ];
        assert!(matches!(
            binder.bind_table("t", "dbo.T", none, &duplicate),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn test_name_validation() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let size = TypeSize::new(SqlDbType::Int);

        assert!(matches!(
            binder.bind_scalar("", &1, size),
            Err(Error::ArgumentNull("name"))
        ));
        assert!(matches!(
            binder.bind_scalar("x; DROP TABLE users", &1, size),
            Err(Error::InvalidIdentifier(_))
        ));
        assert!(binder.bind_scalar("_private", &1, size).is_ok());
        assert!(matches!(
            binder.bind_column("v", [1], size, "", "v"),
            Err(Error::ArgumentNull("type_name"))
        ));
        assert!(matches!(
            binder.bind_column("v", [1], size, "dbo.[T]", "v"),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_scalar_null_is_explicit() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_scalar("v", &None::<i32>, TypeSize::new(SqlDbType::Int))
            .unwrap();
        assert_eq!(param.as_scalar(), Some(&SqlValue::Null));
    }

    #[test]
    fn test_scalar_date_time_converted_to_utc() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);

        let param = binder
            .bind_scalar("v", &noon(), TypeSize::new(SqlDbType::DateTime))
            .unwrap();
        assert_eq!(
            param.as_scalar(),
            Some(&SqlValue::DateTime(noon() - chrono::TimeDelta::hours(2)))
        );

        let param = binder
            .bind_scalar("v", &noon(), TypeSize::new(SqlDbType::Date))
            .unwrap();
        assert_eq!(param.as_scalar(), Some(&SqlValue::DateTime(noon())));

        let policy = policy.with_times_stored_in_utc(false);
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_scalar("v", &noon(), TypeSize::new(SqlDbType::DateTime))
            .unwrap();
        assert_eq!(param.as_scalar(), Some(&SqlValue::DateTime(noon())));
    }

    #[test]
    fn test_datetime2_column_sent_as_utc_text() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_date_times("v", [noon()], TypeSize::new(SqlDbType::DateTime2))
            .unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.columns()[0].sql_type(), "CHAR(27)");
        assert_eq!(
            table.rows()[0],
            vec![SqlValue::String("1993-08-23T10:00:00.0000000".into())]
        );
    }

    #[test]
    fn test_date_column_is_not_converted() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let midnight = noon().date().and_hms_opt(0, 30, 0).unwrap();
        let param = binder
            .bind_date_times("v", [midnight], TypeSize::new(SqlDbType::Date))
            .unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.columns()[0].sql_type(), "CHAR(10)");
        assert_eq!(table.rows()[0], vec![SqlValue::String("1993-08-23".into())]);
    }

    #[test]
    fn test_structured_column_is_invalid_even_without_rows() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let result = binder.bind_column(
            "v",
            Vec::<i32>::new(),
            TypeSize::new(SqlDbType::Structured),
            "dbo.T",
            "v",
        );
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_zero_size_is_out_of_range() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let result = binder.bind_values(
            "v",
            ["a"],
            TypeSize::with_size(SqlDbType::VarChar, 0),
            false,
        );
        assert!(matches!(
            result,
            Err(Error::ArgumentOutOfRange { argument: "size", .. })
        ));
    }

    #[test]
    fn test_fallback_inference_emits_diagnostic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let policy = policy().with_diagnostics(Diagnostics::from_fn(move |m| {
            sink_seen.lock().push(m.to_string());
        }));
        let binder = ParameterBinder::new(&policy);

        let param = binder
            .bind_values(
                "v",
                [None, Some(chrono::NaiveTime::from_hms_opt(9, 30, 0).unwrap())],
                TypeSize::new(SqlDbType::Time),
                true,
            )
            .unwrap();
        let column = &param.as_table().unwrap().columns()[0];

        assert_eq!(column.db_type, SqlDbType::Time);
        assert_eq!(column.length, ColumnLength::Unsized);
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].contains("Time"));
    }

    #[test]
    fn test_zero_rows_still_reports_undescribed_columns() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let policy = policy().with_diagnostics(Diagnostics::from_fn(move |m| {
            sink_seen.lock().push(m.to_string());
        }));
        let binder = ParameterBinder::new(&policy);

        let param = binder
            .bind_values("v", Vec::<f32>::new(), TypeSize::new(SqlDbType::Real), false)
            .unwrap();

        assert_eq!(param.as_table().unwrap().rows, TableRows::NoRows);
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].contains("Real"));
    }

    #[test]
    fn test_fallback_inference_all_null_is_not_supported() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let result = binder.bind_values(
            "v",
            [None::<f32>, None],
            TypeSize::new(SqlDbType::Real),
            true,
        );
        assert!(matches!(result, Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_inferred_date_time_goes_as_text() {
        let policy = policy().with_times_stored_in_utc(false);
        let binder = ParameterBinder::new(&policy);
        let param = binder
            .bind_values("v", [noon()], TypeSize::new(SqlDbType::DateTimeOffset), false)
            .unwrap();
        let table = param.as_table().unwrap();

        assert_eq!(table.columns()[0].sql_type(), "CHAR(27)");
        assert_eq!(
            table.rows()[0],
            vec![SqlValue::String("1993-08-23T12:00:00.0000000".into())]
        );
    }

    #[test]
    fn test_text_format_rejects_wrong_cells() {
        let policy = policy();
        let binder = ParameterBinder::new(&policy);
        let result = binder.bind_values("v", [1], TypeSize::new(SqlDbType::Date), false);
        assert!(matches!(
            result,
            Err(Error::Type(TypeError::TypeMismatch { .. }))
        ));
    }
}

//! An in-memory stand-in for the server side of a table-valued parameter
//! round trip.
//!
//! [`FakeServer`] knows table types declared through `CREATE TYPE` DDL and
//! answers the two query shapes helper tests need:
//!
//! ```text
//! SELECT <columns | *> FROM @tvp
//! SELECT @scalar [AS alias]
//! ```
//!
//! Cells are converted to the declared column types the way the server
//! does on insert: legacy `DATETIME` rounds to 1/300 s, `DATETIME2`
//! truncates to 100 ns, `NOT NULL` and primary keys are enforced and rows
//! come back in primary key order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use sqlhelpers::row::field_names_match;
use sqlhelpers::schema;
use sqlhelpers::{
    Column, ColumnLength, ColumnMetadata, FromSql, ParameterValue, Policy, SqlDbType, SqlValue,
    TypeError, TypeSize,
};
use sqlhelpers_types::temporal::{round_to_datetime, truncate_to_datetime2};

use crate::error::ServerError;
use crate::mock::MockCommand;
use crate::result_set::ResultSet;

/// Schema unqualified type names resolve to.
pub const DEFAULT_SCHEMA: &str = "dbo";

#[allow(clippy::expect_used)]
static CREATE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+TYPE\s+([\w.\[\]]+)\s+AS\s+TABLE\s*\((.*)\)\s*$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static DROP_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*DROP\s+TYPE\s+(IF\s+EXISTS\s+)?([\w.\[\]]+)\s*$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\[?(\w+)\]?\s+(\w+(?:\s*\([^)]*\))?)(.*)$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^PRIMARY\s+KEY(?:\s+(?:NON)?CLUSTERED)?\s*\((.*)\)$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static SELECT_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+(.+?)\s+FROM\s+(@\w+)\s*;?\s*$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static SELECT_SCALAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+(@\w+)(?:\s+AS\s+(\w+))?\s*;?\s*$").expect("valid regex")
});

/// One column of a declared table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeColumn {
    /// Column name.
    pub name: String,
    /// Declared kind and length.
    pub type_size: TypeSize,
    /// Whether NULL is allowed.
    pub nullable: bool,
}

/// A user-defined table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableType {
    /// Schema-qualified name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<TypeColumn>,
    /// Indexes of the primary key columns, in key order.
    pub primary_key: Vec<usize>,
}

impl TableType {
    /// Parse a `CREATE TYPE <name> AS TABLE (...)` statement.
    ///
    /// Columns default to `NULL`. A primary key is read from either a
    /// column-level `PRIMARY KEY` or a table-level constraint, and makes
    /// its columns `NOT NULL`.
    pub fn parse_ddl(ddl: &str) -> Result<Self, ServerError> {
        let ddl = ddl.trim().trim_end_matches(';');
        let caps = CREATE_TYPE_RE
            .captures(ddl)
            .ok_or_else(|| ServerError::Ddl(format!("not a CREATE TYPE statement: {ddl}")))?;
        let name = normalize_name(&caps[1]);

        let mut columns: Vec<TypeColumn> = Vec::new();
        let mut key_names: Vec<String> = Vec::new();
        for element in split_top_level(&caps[2], ',') {
            let element = element.trim();
            if element.is_empty() {
                continue;
            }
            if let Some(key) = PRIMARY_KEY_RE.captures(element) {
                key_names.extend(key[1].split(',').filter_map(|part| {
                    part.split_whitespace()
                        .next()
                        .map(|n| n.trim_matches(['[', ']']).to_string())
                }));
                continue;
            }

            let column = COLUMN_RE
                .captures(element)
                .ok_or_else(|| ServerError::Ddl(format!("invalid column definition: {element}")))?;
            let type_size = TypeSize::from_sql_type(&column[2])
                .map_err(|e| ServerError::Ddl(format!("column '{}': {e}", &column[1])))?;
            let options = column[3].to_ascii_uppercase();
            let options: Vec<&str> = options.split_whitespace().collect();
            if options.windows(2).any(|w| w == ["PRIMARY", "KEY"]) {
                key_names.push(column[1].to_string());
            }
            columns.push(TypeColumn {
                name: column[1].to_string(),
                type_size,
                nullable: !options.windows(2).any(|w| w == ["NOT", "NULL"]),
            });
        }

        if columns.is_empty() {
            return Err(ServerError::Ddl(format!("table type '{name}' has no columns")));
        }

        let mut primary_key = Vec::with_capacity(key_names.len());
        for key in &key_names {
            let index = columns
                .iter()
                .position(|c| field_names_match(&c.name, key))
                .ok_or_else(|| ServerError::InvalidColumn(key.clone()))?;
            columns[index].nullable = false;
            primary_key.push(index);
        }

        Ok(Self {
            name,
            columns,
            primary_key,
        })
    }

    fn column(&self, name: &str) -> Option<(usize, &TypeColumn)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| field_names_match(&c.name, name))
    }
}

/// Server side of the round trip: declared table types and query
/// evaluation over a command's parameters.
#[derive(Debug, Default)]
pub struct FakeServer {
    types: HashMap<String, TableType>,
}

impl FakeServer {
    /// A server with no table types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A server with every generic table type declared in the policy's
    /// table type schema.
    pub fn with_generic_types(policy: &Policy) -> Result<Self, ServerError> {
        let mut server = Self::new();
        server.execute_ddl(&schema::create_all_generic_table_types(policy)?)?;
        Ok(server)
    }

    /// Declare a table type.
    pub fn create_type(&mut self, table_type: TableType) -> Result<(), ServerError> {
        let key = table_type.name.to_ascii_lowercase();
        if self.types.contains_key(&key) {
            return Err(ServerError::TypeExists(table_type.name));
        }
        tracing::debug!(
            name = %table_type.name,
            columns = table_type.columns.len(),
            "declared table type"
        );
        self.types.insert(key, table_type);
        Ok(())
    }

    /// Drop a table type. Returns whether it existed.
    pub fn drop_type(&mut self, name: &str) -> bool {
        self.types
            .remove(&normalize_name(name).to_ascii_lowercase())
            .is_some()
    }

    /// Look up a table type by name; unqualified names resolve to `dbo`.
    #[must_use]
    pub fn table_type(&self, name: &str) -> Option<&TableType> {
        self.types.get(&normalize_name(name).to_ascii_lowercase())
    }

    /// Run a DDL script of `CREATE TYPE` and `DROP TYPE` statements.
    ///
    /// Batches are separated by `GO` lines and statements by `;`.
    pub fn execute_ddl(&mut self, script: &str) -> Result<(), ServerError> {
        let mut batch = String::new();
        for line in script.lines().chain(std::iter::once("GO")) {
            if !line.trim().eq_ignore_ascii_case("GO") {
                batch.push_str(line);
                batch.push('\n');
                continue;
            }
            for statement in split_top_level(&batch, ';') {
                self.execute_statement(statement.trim())?;
            }
            batch.clear();
        }
        Ok(())
    }

    fn execute_statement(&mut self, statement: &str) -> Result<(), ServerError> {
        if statement.is_empty() {
            return Ok(());
        }
        if let Some(caps) = DROP_TYPE_RE.captures(statement) {
            if !self.drop_type(&caps[2]) && caps.get(1).is_none() {
                return Err(ServerError::UnknownType(normalize_name(&caps[2])));
            }
            return Ok(());
        }
        self.create_type(TableType::parse_ddl(statement)?)
    }

    /// Evaluate the command's query against its parameters.
    pub fn execute_reader(&self, command: &MockCommand) -> Result<ResultSet, ServerError> {
        let text = command.text.as_deref().unwrap_or_default();
        if let Some(caps) = SELECT_SCALAR_RE.captures(text) {
            let parameter = &caps[1];
            let alias = caps
                .get(2)
                .map_or_else(|| parameter.trim_start_matches('@'), |m| m.as_str());
            return self.select_scalar(command, parameter, alias);
        }
        if let Some(caps) = SELECT_TABLE_RE.captures(text) {
            return self.select_table(command, &caps[2], &caps[1]);
        }
        Err(ServerError::UnsupportedQuery(text.to_string()))
    }

    fn select_scalar(
        &self,
        command: &MockCommand,
        parameter: &str,
        alias: &str,
    ) -> Result<ResultSet, ServerError> {
        let bound = command
            .parameter(parameter)
            .ok_or_else(|| ServerError::UnknownParameter(parameter.to_string()))?;
        let ParameterValue::Scalar { type_size, value } = &bound.value else {
            return Err(ServerError::NotScalar(parameter.to_string()));
        };

        let column = TypeColumn {
            name: alias.to_string(),
            type_size: *type_size,
            nullable: true,
        };
        let value = if value.is_null() {
            SqlValue::Null
        } else {
            coerce(value, &column)?
        };
        let columns = vec![Column::new(alias, 0, type_size.db_type(), true)];
        Ok(ResultSet::new(columns, vec![vec![value]])?)
    }

    fn select_table(
        &self,
        command: &MockCommand,
        parameter: &str,
        projection: &str,
    ) -> Result<ResultSet, ServerError> {
        let bound = command
            .parameter(parameter)
            .ok_or_else(|| ServerError::UnknownParameter(parameter.to_string()))?;
        let table = bound
            .as_table()
            .ok_or_else(|| ServerError::NotTableValued(parameter.to_string()))?;
        let table_type = self
            .table_type(&table.type_name)
            .ok_or_else(|| ServerError::UnknownType(table.type_name.clone()))?;

        if !table.is_empty() && table.column_count() != table_type.columns.len() {
            return Err(ServerError::ColumnCount {
                type_name: table_type.name.clone(),
                expected: table_type.columns.len(),
                actual: table.column_count(),
            });
        }

        let mut rows = table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(table.columns())
                    .zip(&table_type.columns)
                    .map(|((cell, metadata), declared)| insert_cell(cell, metadata, declared))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !table_type.primary_key.is_empty() {
            let key_order = |a: &Vec<SqlValue>, b: &Vec<SqlValue>| {
                table_type
                    .primary_key
                    .iter()
                    .map(|&i| compare(&a[i], &b[i]))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            };
            rows.sort_by(key_order);
            if rows.windows(2).any(|w| key_order(&w[0], &w[1]).is_eq()) {
                return Err(ServerError::DuplicateKey(table_type.name.clone()));
            }
        }

        let selected = project(table_type, projection)?;
        let columns = selected
            .iter()
            .enumerate()
            .map(|(position, (alias, index))| {
                let declared = &table_type.columns[*index];
                Column::new(alias.clone(), position, declared.type_size.db_type(), declared.nullable)
            })
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| selected.iter().map(|(_, i)| row[*i].clone()).collect())
            .collect();

        tracing::debug!(
            parameter = parameter,
            type_name = %table_type.name,
            "selected from table-valued parameter"
        );
        Ok(ResultSet::new(columns, rows)?)
    }
}

/// Resolve projected columns to `(alias, index)` pairs.
fn project(table_type: &TableType, projection: &str) -> Result<Vec<(String, usize)>, ServerError> {
    if projection.trim() == "*" {
        return Ok(table_type
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect());
    }

    projection
        .split(',')
        .map(|item| {
            let words: Vec<&str> = item.split_whitespace().collect();
            let (name, alias) = match words.as_slice() {
                [name] => (*name, *name),
                [name, as_kw, alias] if as_kw.eq_ignore_ascii_case("AS") => (*name, *alias),
                _ => return Err(ServerError::UnsupportedQuery(item.trim().to_string())),
            };
            let name = name.trim_matches(['[', ']']);
            let (index, _) = table_type
                .column(name)
                .ok_or_else(|| ServerError::InvalidColumn(name.to_string()))?;
            Ok((alias.trim_matches(['[', ']']).to_string(), index))
        })
        .collect()
}

/// Store one cell as the server would on insert.
fn insert_cell(
    cell: &SqlValue,
    metadata: &ColumnMetadata,
    declared: &TypeColumn,
) -> Result<SqlValue, ServerError> {
    if cell.is_null() {
        if declared.nullable {
            return Ok(SqlValue::Null);
        }
        return Err(ServerError::NullViolation(declared.name.clone()));
    }
    coerce(&client_truncate(cell, metadata), declared)
}

/// The client cuts character and binary cells to the declared metadata
/// length before sending them.
fn client_truncate(cell: &SqlValue, metadata: &ColumnMetadata) -> SqlValue {
    let ColumnLength::Fixed(limit) = metadata.length else {
        return cell.clone();
    };
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    match cell {
        SqlValue::String(s) if metadata.db_type.is_character() => {
            SqlValue::String(s.chars().take(limit).collect())
        }
        SqlValue::Binary(b) if b.len() > limit => SqlValue::Binary(b.slice(..limit)),
        other => other.clone(),
    }
}

/// Convert a non-NULL cell to the declared column type.
fn coerce(value: &SqlValue, column: &TypeColumn) -> Result<SqlValue, ServerError> {
    let conversion = |e: TypeError| ServerError::Conversion {
        column: column.name.clone(),
        message: e.to_string(),
    };
    let kind = column.type_size.db_type();

    let converted = match kind {
        SqlDbType::Bit => SqlValue::Bool(bool::from_sql(value).map_err(conversion)?),
        SqlDbType::TinyInt => SqlValue::TinyInt(u8::from_sql(value).map_err(conversion)?),
        SqlDbType::SmallInt => SqlValue::SmallInt(i16::from_sql(value).map_err(conversion)?),
        SqlDbType::Int => SqlValue::Int(i32::from_sql(value).map_err(conversion)?),
        SqlDbType::BigInt => SqlValue::BigInt(i64::from_sql(value).map_err(conversion)?),
        SqlDbType::Real => SqlValue::Real(f32::from_sql(value).map_err(conversion)?),
        SqlDbType::Float => SqlValue::Float(f64::from_sql(value).map_err(conversion)?),
        SqlDbType::Decimal | SqlDbType::Money | SqlDbType::SmallMoney => {
            SqlValue::Decimal(rust_decimal::Decimal::from_sql(value).map_err(conversion)?)
        }
        SqlDbType::Char
        | SqlDbType::VarChar
        | SqlDbType::NChar
        | SqlDbType::NVarChar
        | SqlDbType::Text
        | SqlDbType::NText => {
            let text = String::from_sql(value).map_err(conversion)?;
            SqlValue::String(fit_text(text, column)?)
        }
        SqlDbType::Binary | SqlDbType::VarBinary | SqlDbType::Image => {
            let bytes = bytes::Bytes::from_sql(value).map_err(conversion)?;
            if exceeds(bytes.len(), column) {
                return Err(ServerError::Truncation {
                    column: column.name.clone(),
                });
            }
            SqlValue::Binary(bytes)
        }
        SqlDbType::UniqueIdentifier => {
            SqlValue::Uuid(uuid::Uuid::from_sql(value).map_err(conversion)?)
        }
        SqlDbType::Date => SqlValue::Date(NaiveDate::from_sql(value).map_err(conversion)?),
        SqlDbType::Time => SqlValue::Time(NaiveTime::from_sql(value).map_err(conversion)?),
        SqlDbType::DateTime => {
            let value = round_to_datetime(NaiveDateTime::from_sql(value).map_err(conversion)?);
            SqlValue::DateTime(check_range(value, column, datetime_min(), datetime_max())?)
        }
        SqlDbType::SmallDateTime => {
            let value = round_to_minute(NaiveDateTime::from_sql(value).map_err(conversion)?);
            SqlValue::DateTime(check_range(value, column, smalldatetime_min(), smalldatetime_max())?)
        }
        SqlDbType::DateTime2 => SqlValue::DateTime(truncate_to_datetime2(
            NaiveDateTime::from_sql(value).map_err(conversion)?,
        )),
        SqlDbType::DateTimeOffset => SqlValue::DateTimeOffset(
            chrono::DateTime::<chrono::FixedOffset>::from_sql(value).map_err(conversion)?,
        ),
        SqlDbType::Xml => SqlValue::Xml(String::from_sql(value).map_err(conversion)?),
        SqlDbType::Variant => value.clone(),
        _ => {
            return Err(ServerError::Conversion {
                column: column.name.clone(),
                message: format!("{kind} columns are not supported"),
            });
        }
    };
    Ok(converted)
}

fn exceeds(length: usize, column: &TypeColumn) -> bool {
    usize::try_from(column.type_size.size()).is_ok_and(|max| length > max)
}

/// Enforce the declared length; fixed-length kinds pad with spaces.
fn fit_text(text: String, column: &TypeColumn) -> Result<String, ServerError> {
    let length = text.chars().count();
    if exceeds(length, column) {
        return Err(ServerError::Truncation {
            column: column.name.clone(),
        });
    }
    let fixed = matches!(column.type_size.db_type(), SqlDbType::Char | SqlDbType::NChar);
    match usize::try_from(column.type_size.size()) {
        Ok(size) if fixed && length < size => {
            Ok(format!("{text}{}", " ".repeat(size - length)))
        }
        _ => Ok(text),
    }
}

fn check_range(
    value: NaiveDateTime,
    column: &TypeColumn,
    min: NaiveDateTime,
    max: NaiveDateTime,
) -> Result<NaiveDateTime, ServerError> {
    if value < min || value > max {
        return Err(ServerError::OutOfRange {
            column: column.name.clone(),
            message: format!("{value} is outside {min} to {max}"),
        });
    }
    Ok(value)
}

fn round_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    let floor = value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value);
    if value.second() >= 30 {
        floor.checked_add_signed(TimeDelta::minutes(1)).unwrap_or(floor)
    } else {
        floor
    }
}

fn ymd_hms_milli(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_milli_opt(h, mi, s, ms))
        .unwrap_or_default()
}

fn datetime_min() -> NaiveDateTime {
    ymd_hms_milli(1753, 1, 1, 0, 0, 0, 0)
}

fn datetime_max() -> NaiveDateTime {
    ymd_hms_milli(9999, 12, 31, 23, 59, 59, 997)
}

fn smalldatetime_min() -> NaiveDateTime {
    ymd_hms_milli(1900, 1, 1, 0, 0, 0, 0)
}

fn smalldatetime_max() -> NaiveDateTime {
    ymd_hms_milli(2079, 6, 6, 23, 59, 0, 0)
}

/// Ordering of stored cells of one column. NULL sorts first.
fn compare(a: &SqlValue, b: &SqlValue) -> Ordering {
    use SqlValue as V;
    match (a, b) {
        (V::Null, V::Null) => Ordering::Equal,
        (V::Null, _) => Ordering::Less,
        (_, V::Null) => Ordering::Greater,
        (V::Bool(a), V::Bool(b)) => a.cmp(b),
        (V::TinyInt(a), V::TinyInt(b)) => a.cmp(b),
        (V::SmallInt(a), V::SmallInt(b)) => a.cmp(b),
        (V::Int(a), V::Int(b)) => a.cmp(b),
        (V::BigInt(a), V::BigInt(b)) => a.cmp(b),
        (V::Real(a), V::Real(b)) => a.total_cmp(b),
        (V::Float(a), V::Float(b)) => a.total_cmp(b),
        (V::Decimal(a), V::Decimal(b)) => a.cmp(b),
        (V::String(a), V::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (V::Binary(a), V::Binary(b)) => a.cmp(b),
        (V::Uuid(a), V::Uuid(b)) => a.cmp(b),
        (V::Date(a), V::Date(b)) => a.cmp(b),
        (V::Time(a), V::Time(b)) => a.cmp(b),
        (V::DateTime(a), V::DateTime(b)) => a.cmp(b),
        (V::DateTimeOffset(a), V::DateTimeOffset(b)) => a.cmp(b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}

/// Strip brackets and qualify with `dbo` when unqualified.
fn normalize_name(name: &str) -> String {
    let name: String = name.chars().filter(|c| !matches!(c, '[' | ']')).collect();
    if name.contains('.') {
        name
    } else {
        format!("{DEFAULT_SCHEMA}.{name}")
    }
}

/// Split on `separator` outside parentheses.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_level_primary_key() {
        let ddl = "CREATE TYPE udtt_UnitTests_int_pk AS TABLE\n(\n    i int NOT NULL,\n    PRIMARY KEY CLUSTERED (i ASC)\n)";
        let table_type = TableType::parse_ddl(ddl).unwrap();
        assert_eq!(table_type.name, "dbo.udtt_UnitTests_int_pk");
        assert_eq!(table_type.columns.len(), 1);
        assert_eq!(table_type.columns[0].type_size, TypeSize::new(SqlDbType::Int));
        assert!(!table_type.columns[0].nullable);
        assert_eq!(table_type.primary_key, vec![0]);
    }

    #[test]
    fn test_parse_lengths_and_nullability() {
        let ddl = "CREATE TYPE [app].[People] AS TABLE (name NVARCHAR(50) NULL, amount DECIMAL(18, 2), id INT PRIMARY KEY);";
        let table_type = TableType::parse_ddl(ddl).unwrap();
        assert_eq!(table_type.name, "app.People");
        assert_eq!(
            table_type.columns[0].type_size,
            TypeSize::with_size(SqlDbType::NVarChar, 50)
        );
        assert!(table_type.columns[0].nullable);
        assert_eq!(table_type.columns[1].type_size.db_type(), SqlDbType::Decimal);
        assert!(table_type.columns[1].nullable);
        assert_eq!(table_type.primary_key, vec![2]);
        assert!(!table_type.columns[2].nullable);
    }

    #[test]
    fn test_parse_rejects_other_statements() {
        assert!(matches!(
            TableType::parse_ddl("CREATE TABLE t (i INT)"),
            Err(ServerError::Ddl(_))
        ));
        assert!(matches!(
            TableType::parse_ddl("CREATE TYPE t AS TABLE (i WIDGET)"),
            Err(ServerError::Ddl(_))
        ));
    }

    #[test]
    fn test_generic_types_declared_from_script() {
        let server = FakeServer::with_generic_types(&Policy::default()).unwrap();
        let ints = server.table_type("dbo.TableType_Generic_Int").unwrap();
        assert_eq!(ints.columns[0].name, "v");
        assert!(!ints.columns[0].nullable);

        let strings = server
            .table_type("TableType_Generic_NVarChar_Nullable")
            .unwrap();
        assert!(strings.columns[0].nullable);
        assert_eq!(strings.columns[0].type_size, TypeSize::new(SqlDbType::NVarChar));
    }

    #[test]
    fn test_ddl_script_with_drop() {
        let mut server = FakeServer::new();
        server
            .execute_ddl("CREATE TYPE t AS TABLE (i INT);\nGO\nDROP TYPE t;\nCREATE TYPE t AS TABLE (l BIGINT)\nGO\n")
            .unwrap();
        assert_eq!(server.table_type("t").unwrap().columns[0].name, "l");

        assert!(matches!(
            server.execute_ddl("CREATE TYPE dbo.t AS TABLE (i INT)"),
            Err(ServerError::TypeExists(_))
        ));
        assert!(matches!(
            server.execute_ddl("DROP TYPE missing"),
            Err(ServerError::UnknownType(_))
        ));
        server.execute_ddl("DROP TYPE IF EXISTS missing").unwrap();
    }

    #[test]
    fn test_datetime_coercion_rounds() {
        let column = TypeColumn {
            name: "v".to_string(),
            type_size: TypeSize::new(SqlDbType::DateTime),
            nullable: false,
        };
        let value = ymd_hms_milli(2017, 1, 4, 13, 51, 33, 2);
        assert_eq!(
            coerce(&SqlValue::DateTime(value), &column).unwrap(),
            SqlValue::DateTime(ymd_hms_milli(2017, 1, 4, 13, 51, 33, 3))
        );

        let early = ymd_hms_milli(1700, 1, 1, 0, 0, 0, 0);
        assert!(matches!(
            coerce(&SqlValue::DateTime(early), &column),
            Err(ServerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_client_truncation_follows_metadata() {
        let metadata = ColumnMetadata::new("v", SqlDbType::VarChar, ColumnLength::Fixed(3));
        assert_eq!(
            client_truncate(&SqlValue::String("abcdefg".into()), &metadata),
            SqlValue::String("abc".into())
        );

        let metadata = ColumnMetadata::new("v", SqlDbType::VarChar, ColumnLength::Max);
        assert_eq!(
            client_truncate(&SqlValue::String("abcdefg".into()), &metadata),
            SqlValue::String("abcdefg".into())
        );
    }

    #[test]
    fn test_fixed_char_pads() {
        let column = TypeColumn {
            name: "c".to_string(),
            type_size: TypeSize::with_size(SqlDbType::Char, 5),
            nullable: true,
        };
        assert_eq!(
            coerce(&SqlValue::String("ab".into()), &column).unwrap(),
            SqlValue::String("ab   ".into())
        );
        assert!(matches!(
            coerce(&SqlValue::String("abcdef".into()), &column),
            Err(ServerError::Truncation { .. })
        ));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a DECIMAL(18, 2), b INT", ','),
            vec!["a DECIMAL(18, 2)", " b INT"]
        );
    }
}

//! T-SQL declarations for the generic table types.
//!
//! The single-column helpers on [`ParameterBinder`] expect one table type
//! per kind and nullability to exist in the database. This module renders
//! the `CREATE TYPE` statements for them.

use sqlhelpers_types::{ColumnStrategy, SqlDbType, TypeSize};

use crate::binder::{DEFAULT_FIELD_NAME, ParameterBinder};
use crate::error::{Error, Result};
use crate::policy::Policy;

/// Kinds a generic table type is declared for.
///
/// `CHAR` and `NCHAR` bind through their variable-length forms, and the
/// legacy large-object kinds cannot be table type columns.
pub const GENERIC_KINDS: [SqlDbType; 20] = [
    SqlDbType::Bit,
    SqlDbType::TinyInt,
    SqlDbType::SmallInt,
    SqlDbType::Int,
    SqlDbType::BigInt,
    SqlDbType::Real,
    SqlDbType::Float,
    SqlDbType::Money,
    SqlDbType::SmallMoney,
    SqlDbType::VarChar,
    SqlDbType::NVarChar,
    SqlDbType::VarBinary,
    SqlDbType::UniqueIdentifier,
    SqlDbType::Date,
    SqlDbType::Time,
    SqlDbType::DateTime,
    SqlDbType::DateTime2,
    SqlDbType::SmallDateTime,
    SqlDbType::DateTimeOffset,
    SqlDbType::Xml,
];

/// T-SQL column type for a kind as declared in a table type.
pub fn declared_type(kind: SqlDbType) -> Result<String> {
    match kind.column_strategy() {
        ColumnStrategy::Forbidden => Err(Error::InvalidOperation(format!(
            "{kind} cannot be a table type column"
        ))),
        ColumnStrategy::WithLength => Ok(format!("{}(MAX)", kind.name().to_ascii_uppercase())),
        _ => match kind {
            SqlDbType::Variant => Ok("SQL_VARIANT".to_string()),
            SqlDbType::Udt | SqlDbType::Timestamp => Err(Error::NotSupported(format!(
                "{kind} has no generic table type"
            ))),
            other => Ok(other.name().to_ascii_uppercase()),
        },
    }
}

/// `CREATE TYPE` statement for one generic table type.
///
/// ```rust
/// use sqlhelpers::{Policy, SqlDbType};
/// use sqlhelpers::schema::create_generic_table_type;
///
/// let ddl = create_generic_table_type(&Policy::default(), SqlDbType::Int, false).unwrap();
/// assert_eq!(ddl, "CREATE TYPE dbo.TableType_Generic_Int AS TABLE\n(\n    v INT NOT NULL\n);\n");
/// ```
pub fn create_generic_table_type(policy: &Policy, kind: SqlDbType, nullable: bool) -> Result<String> {
    let column_type = declared_type(kind)?;
    let name = ParameterBinder::new(policy).table_type_name(TypeSize::new(kind), nullable);
    let null = if nullable { "NULL" } else { "NOT NULL" };
    Ok(format!(
        "CREATE TYPE {name} AS TABLE\n(\n    {DEFAULT_FIELD_NAME} {column_type} {null}\n);\n"
    ))
}

/// Declarations of every generic table type, nullable and not.
pub fn create_all_generic_table_types(policy: &Policy) -> Result<String> {
    let mut script = String::new();
    for kind in GENERIC_KINDS {
        for nullable in [false, true] {
            script.push_str(&create_generic_table_type(policy, kind, nullable)?);
            script.push_str("GO\n\n");
        }
    }
    Ok(script)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_types() {
        assert_eq!(declared_type(SqlDbType::NVarChar).unwrap(), "NVARCHAR(MAX)");
        assert_eq!(declared_type(SqlDbType::DateTime2).unwrap(), "DATETIME2");
        assert_eq!(declared_type(SqlDbType::UniqueIdentifier).unwrap(), "UNIQUEIDENTIFIER");
        assert_eq!(declared_type(SqlDbType::Variant).unwrap(), "SQL_VARIANT");
        assert!(matches!(
            declared_type(SqlDbType::Structured),
            Err(Error::InvalidOperation(_))
        ));
        assert!(matches!(
            declared_type(SqlDbType::Timestamp),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_nullable_declaration() {
        let policy = Policy::default().with_table_type_schema("app");
        let ddl = create_generic_table_type(&policy, SqlDbType::DateTime2, true).unwrap();
        assert!(ddl.starts_with("CREATE TYPE app.TableType_Generic_DateTime2_Nullable AS TABLE"));
        assert!(ddl.contains("v DATETIME2 NULL"));
    }

    #[test]
    fn test_all_generic_kinds_declare() {
        let script = create_all_generic_table_types(&Policy::default()).unwrap();
        assert_eq!(script.matches("CREATE TYPE").count(), GENERIC_KINDS.len() * 2);
        assert!(script.contains("dbo.TableType_Generic_VarBinary_Nullable"));
    }
}

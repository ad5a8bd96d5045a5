//! SQL Server column kinds.

use std::fmt;

use crate::temporal::TextFormat;

/// A SQL Server column kind.
///
/// Names follow the client library's canonical spelling, which is also what
/// the generic table type naming convention (`TableType_Generic_<Kind>`)
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SqlDbType {
    /// BIGINT (i64).
    BigInt,
    /// BINARY(n).
    Binary,
    /// BIT (bool).
    Bit,
    /// CHAR(n).
    Char,
    /// DATETIME, legacy precision (1/300 s).
    DateTime,
    /// DECIMAL / NUMERIC.
    Decimal,
    /// FLOAT (f64).
    Float,
    /// IMAGE.
    Image,
    /// INT (i32).
    Int,
    /// MONEY.
    Money,
    /// NCHAR(n).
    NChar,
    /// NTEXT.
    NText,
    /// NVARCHAR(n).
    NVarChar,
    /// REAL (f32).
    Real,
    /// UNIQUEIDENTIFIER.
    UniqueIdentifier,
    /// SMALLDATETIME.
    SmallDateTime,
    /// SMALLINT (i16).
    SmallInt,
    /// SMALLMONEY.
    SmallMoney,
    /// TEXT.
    Text,
    /// TIMESTAMP / ROWVERSION.
    Timestamp,
    /// TINYINT (u8).
    TinyInt,
    /// VARBINARY(n).
    VarBinary,
    /// VARCHAR(n).
    VarChar,
    /// SQL_VARIANT.
    Variant,
    /// XML.
    Xml,
    /// User-defined CLR type.
    Udt,
    /// Table-valued (structured) type.
    Structured,
    /// DATE.
    Date,
    /// TIME.
    Time,
    /// DATETIME2, 100ns precision.
    DateTime2,
    /// DATETIMEOFFSET.
    DateTimeOffset,
}

/// How a column kind is described inside a table-valued parameter.
///
/// The table-valued parameter encoder accepts fewer kinds than the scalar
/// encoder, so every kind maps onto exactly one of these strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStrategy {
    /// Usable directly, declared with an explicit length.
    WithLength,
    /// Usable directly, declared without a length.
    WithoutLength,
    /// Declared as another kind.
    Substitute(SqlDbType),
    /// Values are sent as fixed-format text in a `CHAR` column.
    AsText(TextFormat),
    /// Never legal inside a table-valued parameter.
    Forbidden,
    /// No safe representation; the column type must be inferred from data.
    Unsupported,
}

impl SqlDbType {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 31] = [
        Self::BigInt,
        Self::Binary,
        Self::Bit,
        Self::Char,
        Self::DateTime,
        Self::Decimal,
        Self::Float,
        Self::Image,
        Self::Int,
        Self::Money,
        Self::NChar,
        Self::NText,
        Self::NVarChar,
        Self::Real,
        Self::UniqueIdentifier,
        Self::SmallDateTime,
        Self::SmallInt,
        Self::SmallMoney,
        Self::Text,
        Self::Timestamp,
        Self::TinyInt,
        Self::VarBinary,
        Self::VarChar,
        Self::Variant,
        Self::Xml,
        Self::Udt,
        Self::Structured,
        Self::Date,
        Self::Time,
        Self::DateTime2,
        Self::DateTimeOffset,
    ];

    /// Canonical name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BigInt => "BigInt",
            Self::Binary => "Binary",
            Self::Bit => "Bit",
            Self::Char => "Char",
            Self::DateTime => "DateTime",
            Self::Decimal => "Decimal",
            Self::Float => "Float",
            Self::Image => "Image",
            Self::Int => "Int",
            Self::Money => "Money",
            Self::NChar => "NChar",
            Self::NText => "NText",
            Self::NVarChar => "NVarChar",
            Self::Real => "Real",
            Self::UniqueIdentifier => "UniqueIdentifier",
            Self::SmallDateTime => "SmallDateTime",
            Self::SmallInt => "SmallInt",
            Self::SmallMoney => "SmallMoney",
            Self::Text => "Text",
            Self::Timestamp => "Timestamp",
            Self::TinyInt => "TinyInt",
            Self::VarBinary => "VarBinary",
            Self::VarChar => "VarChar",
            Self::Variant => "Variant",
            Self::Xml => "Xml",
            Self::Udt => "Udt",
            Self::Structured => "Structured",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime2 => "DateTime2",
            Self::DateTimeOffset => "DateTimeOffset",
        }
    }

    /// Look a kind up by its canonical name or its T-SQL spelling,
    /// ignoring case (`"nvarchar"`, `"NVarChar"`, `"sql_variant"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        match name.to_ascii_uppercase().as_str() {
            "INTEGER" => return Some(Self::Int),
            "NUMERIC" => return Some(Self::Decimal),
            "SQL_VARIANT" => return Some(Self::Variant),
            "ROWVERSION" => return Some(Self::Timestamp),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Table-valued parameter column strategy for this kind.
    #[must_use]
    pub const fn column_strategy(self) -> ColumnStrategy {
        match self {
            Self::Binary
            | Self::VarBinary
            | Self::Char
            | Self::VarChar
            | Self::NChar
            | Self::NVarChar
            | Self::Text
            | Self::NText
            | Self::Image => ColumnStrategy::WithLength,

            Self::Bit
            | Self::BigInt
            | Self::Int
            | Self::SmallInt
            | Self::TinyInt
            | Self::Decimal
            | Self::Float
            | Self::Money
            | Self::DateTime
            | Self::UniqueIdentifier
            | Self::Xml => ColumnStrategy::WithoutLength,

            // Udt -> VarBinary is an untested guess.
            Self::Udt => ColumnStrategy::Substitute(Self::VarBinary),
            Self::SmallDateTime => ColumnStrategy::Substitute(Self::DateTime),
            Self::SmallMoney => ColumnStrategy::Substitute(Self::Money),

            // Would otherwise be sent as DateTime, which has a smaller range.
            Self::Date => ColumnStrategy::AsText(TextFormat::Date),
            Self::DateTime2 => ColumnStrategy::AsText(TextFormat::DateTime2),

            Self::Structured => ColumnStrategy::Forbidden,

            Self::Real
            | Self::Time
            | Self::DateTimeOffset
            | Self::Timestamp
            | Self::Variant => ColumnStrategy::Unsupported,
        }
    }

    /// Whether the kind holds a calendar date with no time of day.
    #[must_use]
    pub const fn is_date_only(self) -> bool {
        matches!(self, Self::Date)
    }

    /// Whether the kind holds character data.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(
            self,
            Self::Char | Self::VarChar | Self::NChar | Self::NVarChar | Self::Text | Self::NText
        )
    }
}

impl fmt::Display for SqlDbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

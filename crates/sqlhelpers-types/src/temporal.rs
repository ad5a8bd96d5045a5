//! Date and time text formats and precision rules.
//!
//! Table-valued parameters cannot carry the full range of `DATE` and
//! `DATETIME2` natively, so those columns travel as fixed-width text that
//! the server converts back on insert:
//!
//! | Kind        | Text format                   | Width |
//! |-------------|-------------------------------|-------|
//! | `DATE`      | `yyyy-MM-dd`                  | 10    |
//! | `DATETIME2` | `yyyy-MM-ddTHH:mm:ss.fffffff` | 27    |

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::error::TypeError;
use crate::value::SqlValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME2_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const NANOS_PER_SECOND: u32 = 1_000_000_000;
const DATETIME2_TICK_NANOS: u32 = 100;

/// Legacy `DATETIME` ticks per second.
const DATETIME_TICKS_PER_SECOND: u64 = 300;

/// Fixed-width text encodings for temporal table-valued parameter columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextFormat {
    /// `yyyy-MM-dd`.
    Date,
    /// `yyyy-MM-ddTHH:mm:ss.fffffff`.
    DateTime2,
}

impl TextFormat {
    /// Exact width of the encoded text, used as the `CHAR` column length.
    #[must_use]
    pub const fn length(self) -> u32 {
        match self {
            Self::Date => 10,
            Self::DateTime2 => 27,
        }
    }

    /// Encode a cell. NULL stays NULL; dates and date-times become text.
    pub fn encode(self, value: &SqlValue) -> Result<SqlValue, TypeError> {
        let text = match (self, value) {
            (_, SqlValue::Null) => return Ok(SqlValue::Null),
            (Self::Date, SqlValue::Date(d)) => format_date(*d),
            (Self::Date, SqlValue::DateTime(dt)) => format_date(dt.date()),
            (Self::DateTime2, SqlValue::DateTime(dt)) => format_datetime2(*dt),
            (Self::DateTime2, SqlValue::Date(d)) => format_datetime2(d.and_time(NaiveTime::MIN)),
            (_, other) => {
                return Err(TypeError::TypeMismatch {
                    expected: self.expected(),
                    actual: other.type_name().to_string(),
                });
            }
        };
        Ok(SqlValue::String(text))
    }

    /// Decode text produced by [`encode`](Self::encode).
    pub fn decode(self, text: &str) -> Result<SqlValue, TypeError> {
        let text = text.trim_end();
        match self {
            Self::Date => Ok(SqlValue::Date(NaiveDate::parse_from_str(text, DATE_FORMAT)?)),
            Self::DateTime2 => Ok(SqlValue::DateTime(NaiveDateTime::parse_from_str(
                text,
                "%Y-%m-%dT%H:%M:%S%.f",
            )?)),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime2 => "datetime2",
        }
    }
}

/// Render a date as `yyyy-MM-dd`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a date-time as `yyyy-MM-ddTHH:mm:ss.fffffff`, truncating below
/// 100ns.
#[must_use]
pub fn format_datetime2(value: NaiveDateTime) -> String {
    // Leap-second nanos run past 1e9.
    let ticks = (value.nanosecond() % NANOS_PER_SECOND) / DATETIME2_TICK_NANOS;
    format!("{}.{ticks:07}", value.format(DATETIME2_SECONDS_FORMAT))
}

/// Truncate a date-time to `DATETIME2` precision (100ns).
#[must_use]
pub fn truncate_to_datetime2(value: NaiveDateTime) -> NaiveDateTime {
    let nanos = value.nanosecond() % NANOS_PER_SECOND;
    value
        .with_nanosecond(nanos - nanos % DATETIME2_TICK_NANOS)
        .unwrap_or(value)
}

/// Round a date-time to legacy `DATETIME` precision.
///
/// `DATETIME` counts 1/300 s ticks, so milliseconds land on `.000`, `.003`
/// or `.007` increments.
#[must_use]
pub fn round_to_datetime(value: NaiveDateTime) -> NaiveDateTime {
    let time = value.time();
    let nanos_of_day = u64::from(time.num_seconds_from_midnight()) * u64::from(NANOS_PER_SECOND)
        + u64::from(time.nanosecond() % NANOS_PER_SECOND);

    let ticks = (nanos_of_day * DATETIME_TICKS_PER_SECOND + u64::from(NANOS_PER_SECOND) / 2)
        / u64::from(NANOS_PER_SECOND);
    let millis = (ticks * 10 + 1) / 3;

    let Ok(millis) = i64::try_from(millis) else {
        return value;
    };
    value
        .date()
        .and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::milliseconds(millis))
        .unwrap_or(value)
}

/// Smallest value a `DATETIME2` column holds.
#[must_use]
pub fn datetime2_min() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Largest value a `DATETIME2` column holds.
#[must_use]
pub fn datetime2_max() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_900))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Parse date-time text in the shapes the server and client render.
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime, TypeError> {
    let text = text.trim();
    const FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];

    let mut last_err = None;
    for format in FORMATS {
        match NaiveDateTime::parse_from_str(text, format) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = Some(e),
        }
    }
    match NaiveDate::parse_from_str(text, DATE_FORMAT) {
        Ok(date) => Ok(date.and_time(NaiveTime::MIN)),
        Err(e) => Err(last_err.unwrap_or(e).into()),
    }
}

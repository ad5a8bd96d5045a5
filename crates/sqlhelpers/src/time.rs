//! Local/UTC conversion of stored date-times.
//!
//! With [`Policy::times_stored_in_utc`] set, date-times are converted to
//! UTC on the way in and back to the local zone on the way out. Stored
//! values carry no zone, so the conversion is a reinterpretation of the
//! wall clock.
//!
//! Local times that do not exist (the gap at a daylight saving transition)
//! convert using the offset in effect at that instant; ambiguous local times
//! use the earlier of the two instants. Results saturate at the `DATETIME2`
//! range when the input was inside it.

use chrono::{FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use sqlhelpers_types::temporal::{datetime2_max, datetime2_min};

use crate::policy::{LocalZone, Policy};

impl LocalZone {
    /// Offset of this zone at the given UTC instant.
    #[must_use]
    pub fn offset_at_utc(&self, utc: NaiveDateTime) -> FixedOffset {
        match self {
            Self::System => chrono::Local.offset_from_utc_datetime(&utc).fix(),
            Self::Fixed(offset) => *offset,
        }
    }

    /// Interpret a wall-clock time in this zone and return it in UTC.
    #[must_use]
    pub fn local_to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        let offset = match self {
            Self::System => match chrono::Local.from_local_datetime(&local) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.offset().fix(),
                LocalResult::None => chrono::Local.offset_from_utc_datetime(&local).fix(),
            },
            Self::Fixed(offset) => *offset,
        };
        shift(local, -i64::from(offset.local_minus_utc()))
    }

    /// Express a UTC instant as wall-clock time in this zone.
    #[must_use]
    pub fn utc_to_local(&self, utc: NaiveDateTime) -> NaiveDateTime {
        shift(utc, i64::from(self.offset_at_utc(utc).local_minus_utc()))
    }
}

fn shift(value: NaiveDateTime, seconds: i64) -> NaiveDateTime {
    let shifted = value.checked_add_signed(TimeDelta::seconds(seconds));
    let (min, max) = (datetime2_min(), datetime2_max());
    if value < min || value > max {
        return shifted.unwrap_or(value);
    }
    match shifted {
        Some(v) => v.clamp(min, max),
        None if seconds < 0 => min,
        None => max,
    }
}

/// Convert a local date-time to its stored form.
#[must_use]
pub fn to_storage(value: NaiveDateTime, policy: &Policy) -> NaiveDateTime {
    if policy.times_stored_in_utc {
        policy.local_zone.local_to_utc(value)
    } else {
        value
    }
}

/// Convert a stored date-time to local time.
#[must_use]
pub fn from_storage(raw: NaiveDateTime, policy: &Policy) -> NaiveDateTime {
    if policy.times_stored_in_utc {
        policy.local_zone.utc_to_local(raw)
    } else {
        raw
    }
}

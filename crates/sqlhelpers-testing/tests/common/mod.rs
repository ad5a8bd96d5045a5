//! Shared setup for round-trip tests.

#![allow(dead_code)]

use std::sync::Once;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use sqlhelpers::{BoundParameter, Command, ConnectionExt, LocalZone, Policy};
use sqlhelpers_testing::{FakeServer, MockConnection, ResultSet, ServerError};

static TRACING: Once = Once::new();

/// Route `tracing` output to the test writer. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// UTC storage with local time two hours ahead of UTC.
pub fn policy() -> Policy {
    init_tracing();
    Policy::default().with_local_zone(LocalZone::Fixed(
        FixedOffset::east_opt(2 * 3600).expect("valid offset"),
    ))
}

/// UTC storage with local time equal to UTC.
pub fn utc_policy() -> Policy {
    init_tracing();
    Policy::default().with_local_zone(LocalZone::utc())
}

/// A server with the generic table types declared for `policy`.
pub fn server(policy: &Policy) -> FakeServer {
    FakeServer::with_generic_types(policy).expect("generic table types declare")
}

/// Run `text` with one bound parameter.
pub fn query(
    server: &FakeServer,
    policy: &Policy,
    text: &str,
    parameter: BoundParameter,
) -> Result<ResultSet, ServerError> {
    let conn = MockConnection::new();
    let mut cmd = conn.get_command(Some(text), None, None, policy);
    cmd.add_parameter(parameter);
    server.execute_reader(&cmd)
}

pub fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("valid date-time")
}

pub fn dt_milli(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_milli_opt(h, mi, s, ms))
        .expect("valid date-time")
}

//! Process-wide binding and reading policy.
//!
//! A [`Policy`] is passed explicitly to [`ParameterBinder`] and
//! [`RowReader`]. Applications that configure once at startup can
//! [`install`] a policy and borrow it back with [`current`].
//!
//! [`ParameterBinder`]: crate::binder::ParameterBinder
//! [`RowReader`]: crate::reader::RowReader

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};

/// SRID of WGS 84, the default coordinate system for geography values.
pub const WGS84_SRID: i32 = 4326;

/// The time zone the application treats as "local".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// The operating system's zone, with daylight saving rules.
    #[default]
    System,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl LocalZone {
    /// UTC itself.
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }
}

impl FromStr for LocalZone {
    type Err = Error;

    /// Accepts `System`/`Local`, `UTC`/`Z`, or an offset like `+02:00`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("system") || s.eq_ignore_ascii_case("local") {
            return Ok(Self::System);
        }
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Self::utc());
        }
        s.parse::<FixedOffset>()
            .map(Self::Fixed)
            .map_err(|_| Error::Config(format!("invalid local zone: {s}")))
    }
}

/// Settings applied to each newly created command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Command timeout. `None` leaves the client default in place.
    #[serde(with = "duration_secs")]
    pub command_timeout: Option<Duration>,
}

impl CommandSettings {
    /// Settings with a command timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            command_timeout: Some(timeout),
        }
    }
}

/// Binding and reading policy.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Whether date-times are stored in UTC. When set, bound date-times are
    /// converted local to UTC and read date-times UTC to local.
    pub times_stored_in_utc: bool,

    /// SRID used for geography values when none is given.
    pub default_srid: i32,

    /// Zone used for local/UTC conversion.
    pub local_zone: LocalZone,

    /// Schema of the generic single-column table types.
    pub table_type_schema: String,

    /// Defaults for newly created commands.
    pub command: CommandSettings,

    /// Sink for non-fatal anomalies.
    pub diagnostics: Diagnostics,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            times_stored_in_utc: true,
            default_srid: WGS84_SRID,
            local_zone: LocalZone::System,
            table_type_schema: "dbo".to_string(),
            command: CommandSettings::default(),
            diagnostics: Diagnostics::none(),
        }
    }
}

impl Policy {
    /// Create a policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a policy from an options string.
    ///
    /// Uses the same `key=value;` syntax as ADO.NET connection strings:
    /// ```text
    /// TimesStoredInUtc=false;CoordinateSystemId=4269;CommandTimeout=60;TableTypeSchema=app;LocalZone=+02:00
    /// ```
    pub fn from_options_string(options: &str) -> Result<Self> {
        let mut policy = Self::default();

        for part in options.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "timesstoredinutc" | "times stored in utc" => {
                    policy.times_stored_in_utc = parse_bool(value)
                        .ok_or_else(|| Error::Config(format!("invalid boolean: {value}")))?;
                }
                "coordinatesystemid" | "srid" => {
                    policy.default_srid = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid srid: {value}")))?;
                }
                "commandtimeout" | "command timeout" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid timeout: {value}")))?;
                    policy.command.command_timeout = Some(Duration::from_secs(secs));
                }
                "tabletypeschema" | "table type schema" => {
                    if value.is_empty() {
                        return Err(Error::Config("table type schema is empty".into()));
                    }
                    policy.table_type_schema = value.to_string();
                }
                "localzone" | "local zone" => {
                    policy.local_zone = value.parse()?;
                }
                _ => {
                    tracing::debug!(key = key, value = value, "ignoring unknown policy option");
                }
            }
        }

        Ok(policy)
    }

    /// Set whether times are stored in UTC.
    #[must_use]
    pub fn with_times_stored_in_utc(mut self, enabled: bool) -> Self {
        self.times_stored_in_utc = enabled;
        self
    }

    /// Set the default geography SRID.
    #[must_use]
    pub fn with_default_srid(mut self, srid: i32) -> Self {
        self.default_srid = srid;
        self
    }

    /// Set the local zone.
    #[must_use]
    pub fn with_local_zone(mut self, zone: LocalZone) -> Self {
        self.local_zone = zone;
        self
    }

    /// Set the schema of the generic table types.
    #[must_use]
    pub fn with_table_type_schema(mut self, schema: impl Into<String>) -> Self {
        self.table_type_schema = schema.into();
        self
    }

    /// Set the default command timeout.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command.command_timeout = Some(timeout);
        self
    }

    /// Set the diagnostic sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") || value == "0"
    {
        Some(false)
    } else {
        None
    }
}

/// Serializable policy settings, e.g. from an application config file.
///
/// ```rust
/// use sqlhelpers::policy::{Policy, PolicyOptions};
///
/// let options: PolicyOptions = serde_json::from_str(
///     r#"{ "times_stored_in_utc": false, "command": { "command_timeout": 45 } }"#,
/// ).unwrap();
/// let policy = Policy::try_from(options).unwrap();
/// assert!(!policy.times_stored_in_utc);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyOptions {
    /// See [`Policy::times_stored_in_utc`].
    pub times_stored_in_utc: bool,
    /// See [`Policy::default_srid`].
    pub default_srid: i32,
    /// Zone text as accepted by [`LocalZone::from_str`].
    pub local_zone: Option<String>,
    /// See [`Policy::table_type_schema`].
    pub table_type_schema: String,
    /// See [`Policy::command`].
    pub command: CommandSettings,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            times_stored_in_utc: policy.times_stored_in_utc,
            default_srid: policy.default_srid,
            local_zone: None,
            table_type_schema: policy.table_type_schema,
            command: policy.command,
        }
    }
}

impl TryFrom<PolicyOptions> for Policy {
    type Error = Error;

    fn try_from(options: PolicyOptions) -> Result<Self> {
        let local_zone = match options.local_zone.as_deref() {
            Some(zone) => zone.parse()?,
            None => LocalZone::System,
        };
        if options.table_type_schema.is_empty() {
            return Err(Error::Config("table type schema is empty".into()));
        }
        Ok(Self {
            times_stored_in_utc: options.times_stored_in_utc,
            default_srid: options.default_srid,
            local_zone,
            table_type_schema: options.table_type_schema,
            command: options.command,
            diagnostics: Diagnostics::none(),
        })
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

static GLOBAL: Lazy<RwLock<Arc<Policy>>> = Lazy::new(|| RwLock::new(Arc::new(Policy::default())));

/// Install `policy` as the process-wide policy.
///
/// Intended for startup. Policies already handed out by [`current`] keep
/// their old values.
pub fn install(policy: Policy) {
    tracing::debug!(
        times_stored_in_utc = policy.times_stored_in_utc,
        default_srid = policy.default_srid,
        table_type_schema = %policy.table_type_schema,
        "installing sqlhelpers policy"
    );
    *GLOBAL.write() = Arc::new(policy);
}

/// The process-wide policy.
#[must_use]
pub fn current() -> Arc<Policy> {
    Arc::clone(&GLOBAL.read())
}

//! User domain types.
//!
//! # Time fields
//!
//! A user carries four point-in-time fields. `instant` is the canonical one;
//! `timestamp`, `local_date_time` and `zoned_date_time` are kept for clients
//! that still read them. Nothing reconciles the four: they are stored and
//! returned exactly as written, and may disagree or be independently unset.

use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use user_lookup_core::UserId;

/// A persisted user (domain type).
///
/// Serialized with camelCase keys; unset fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Storage-assigned identifier.
    pub id: UserId,
    /// Free-form email address (not validated).
    pub email: Option<String>,
    /// Free-form display name.
    pub name: Option<String>,
    /// Legacy wall-clock timestamp. Deprecated: read `instant` instead.
    pub timestamp: Option<NaiveDateTime>,
    /// Legacy date-time without zone. Deprecated: read `instant` instead.
    pub local_date_time: Option<NaiveDateTime>,
    /// Legacy date-time with explicit offset. Deprecated: read `instant` instead.
    pub zoned_date_time: Option<DateTime<FixedOffset>>,
    /// Absolute point in time.
    pub instant: Option<DateTime<Utc>>,
}

/// A user that has not been stored yet.
///
/// The storage layer assigns the id on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub local_date_time: Option<NaiveDateTime>,
    pub zoned_date_time: Option<DateTime<FixedOffset>>,
    pub instant: Option<DateTime<Utc>>,
}

impl NewUser {
    /// Attach a storage-assigned id, producing the persisted form.
    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            timestamp: self.timestamp,
            local_date_time: self.local_date_time,
            zoned_date_time: self.zoned_date_time,
            instant: self.instant,
        }
    }
}

/// Renders every field by name, `null` for unset values.
///
/// This is the form written to the diagnostic log when a lookup succeeds.
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User(id={}, email={}, name={}, timestamp={}, local_date_time={}, zoned_date_time={}, instant={})",
            self.id,
            Quoted(self.email.as_deref()),
            Quoted(self.name.as_deref()),
            OrNull(self.timestamp.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f"))),
            OrNull(
                self.local_date_time
                    .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f"))
            ),
            OrNull(
                self.zoned_date_time
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            ),
            OrNull(
                self.instant
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            ),
        )
    }
}

struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(s) => write!(f, "{s:?}"),
            None => f.write_str("null"),
        }
    }
}

struct OrNull<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("null"),
        }
    }
}

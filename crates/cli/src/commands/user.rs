//! User record commands.
//!
//! # Usage
//!
//! ```bash
//! ul-cli user create -e ann@example.com -n "Ann" \
//!     --instant 2024-01-01T00:00:00Z \
//!     --zoned-date-time 2024-01-01T02:00:00+02:00
//! ```
//!
//! Time arguments are parsed before connecting, so a typo never reaches the
//! database.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use clap::Args;

use user_lookup_server::db::{PgUserRepository, UserRepository};
use user_lookup_server::models::NewUser;

use super::CliError;

/// Fields of the user to insert. Every field is optional.
#[derive(Debug, Args)]
pub struct CreateUserArgs {
    /// Email address (free-form)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Canonical point in time, RFC 3339 (e.g. 2024-01-01T00:00:00Z)
    #[arg(long, value_parser = parse_instant)]
    pub instant: Option<DateTime<Utc>>,

    /// Legacy timestamp without zone (e.g. 2024-01-01T00:00:00)
    #[arg(long, value_parser = parse_naive)]
    pub timestamp: Option<NaiveDateTime>,

    /// Legacy local date-time without zone (e.g. 2024-01-01T00:00:00)
    #[arg(long, value_parser = parse_naive)]
    pub local_date_time: Option<NaiveDateTime>,

    /// Legacy date-time with offset, RFC 3339 (e.g. 2024-01-01T02:00:00+02:00)
    #[arg(long, value_parser = parse_zoned)]
    pub zoned_date_time: Option<DateTime<FixedOffset>>,
}

impl From<CreateUserArgs> for NewUser {
    fn from(args: CreateUserArgs) -> Self {
        Self {
            email: args.email,
            name: args.name,
            timestamp: args.timestamp,
            local_date_time: args.local_date_time,
            zoned_date_time: args.zoned_date_time,
            instant: args.instant,
        }
    }
}

/// Insert a user and log the id the database assigned.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the insert fails.
pub async fn create(args: CreateUserArgs) -> Result<(), CliError> {
    let new_user = NewUser::from(args);
    let pool = super::connect().await?;
    let users = PgUserRepository::new(pool);

    let user = users.create(&new_user).await?;

    tracing::info!(id = %user.id, "User created: {user}");
    Ok(())
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 (2024-01-01T00:00:00Z): {e}"))
}

fn parse_zoned(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| format!("expected RFC 3339 with offset (2024-01-01T02:00:00+02:00): {e}"))
}

fn parse_naive(s: &str) -> Result<NaiveDateTime, String> {
    s.parse::<NaiveDateTime>()
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}

//! `PostgreSQL` user repository.
//!
//! Queries are hand-written and mapped through [`UserRow`] so the stored
//! shape stays visible next to the code that reads it.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use sqlx::PgPool;

use user_lookup_core::UserId;

use super::{RepositoryError, UserRepository};
use crate::models::{NewUser, User};

/// Row layout of `lookup.user`.
///
/// `zoned_date_time` is stored as a UTC instant plus the offset it was
/// written with, so the original offset survives a round trip.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: Option<String>,
    name: Option<String>,
    timestamp: Option<NaiveDateTime>,
    local_date_time: Option<NaiveDateTime>,
    zoned_date_time: Option<DateTime<Utc>>,
    zoned_offset_seconds: Option<i32>,
    instant: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let zoned_date_time = match row.zoned_date_time {
            Some(utc) => {
                let seconds = row.zoned_offset_seconds.unwrap_or(0);
                let offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "user {}: zone offset {seconds}s out of range",
                        row.id
                    ))
                })?;
                Some(utc.with_timezone(&offset))
            }
            None => None,
        };

        Ok(Self {
            id: UserId::new(row.id),
            email: row.email,
            name: row.name,
            timestamp: row.timestamp,
            local_date_time: row.local_date_time,
            zoned_date_time,
            instant: row.instant,
        })
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, "timestamp", local_date_time,
                   zoned_date_time, zoned_offset_seconds, instant
            FROM lookup.user
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO lookup.user (
                email, name, "timestamp", local_date_time,
                zoned_date_time, zoned_offset_seconds, instant
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, name, "timestamp", local_date_time,
                      zoned_date_time, zoned_offset_seconds, instant
            "#,
        )
        .bind(user.email.as_deref())
        .bind(user.name.as_deref())
        .bind(user.timestamp)
        .bind(user.local_date_time)
        .bind(user.zoned_date_time.map(|t| t.with_timezone(&Utc)))
        .bind(user.zoned_date_time.map(|t| t.offset().local_minus_utc()))
        .bind(user.instant)
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

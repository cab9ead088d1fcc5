//! Database operations for the user lookup service.
//!
//! # Schema: `lookup`
//!
//! ## Tables
//!
//! - `user` - User records keyed by a storage-generated integer id
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p user-lookup-cli -- migrate
//! ```
//!
//! # Repositories
//!
//! Handlers only see the [`UserRepository`] trait. [`PgUserRepository`] backs
//! it with `PostgreSQL`; [`InMemoryUserRepository`] keeps records in process
//! memory for tests.

pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use user_lookup_core::UserId;

use crate::models::{NewUser, User};

pub use memory::InMemoryUserRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
///
/// A lookup that matches nothing is not an error; it is `Ok(None)`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A non-database backend could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Lookup and storage of [`User`] records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    ///
    /// Returns `Ok(None)` when no record has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read or the stored
    /// row cannot be mapped to a `User`.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert a new user; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

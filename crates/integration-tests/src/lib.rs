//! Integration tests for the user lookup service.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests against an in-memory repository (no database needed)
//! cargo test -p user-lookup-integration-tests
//!
//! # PostgreSQL-backed tests
//! USER_LOOKUP_TEST_DATABASE_URL=postgres://localhost/user_lookup_test \
//!     cargo test -p user-lookup-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `user_lookup` - `GET /user/{id}` behaviour over real HTTP
//! - `postgres_repository` - `PgUserRepository` against a live database

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::net::TcpListener;

use user_lookup_core::UserId;
use user_lookup_server::config::LookupSettings;
use user_lookup_server::db::{RepositoryError, UserRepository};
use user_lookup_server::models::{NewUser, User};
use user_lookup_server::routes;
use user_lookup_server::state::AppState;

/// Environment variable naming the database used by ignored tests.
pub const TEST_DATABASE_URL_VAR: &str = "USER_LOOKUP_TEST_DATABASE_URL";

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the full application on `127.0.0.1:0` with the given repository.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(users: Arc<dyn UserRepository>, lookup: LookupSettings) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let app = routes::app(AppState::new(users, lookup));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Issue a `GET` request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// Repository wrapper that counts `find_by_id` calls.
pub struct CountingRepository<R> {
    inner: R,
    lookups: AtomicUsize,
}

impl<R> CountingRepository<R> {
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `find_by_id` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: UserRepository> UserRepository for CountingRepository<R> {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.inner.create(user).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }
}

/// Repository simulating a store that cannot be reached.
#[derive(Debug, Default)]
pub struct UnreachableRepository;

#[async_trait]
impl UserRepository for UnreachableRepository {
    async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _user: &NewUser) -> Result<User, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

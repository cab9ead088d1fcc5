//! User lookup route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use user_lookup_core::UserId;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;

/// Look up a user by id.
///
/// `GET /user/{id}`
///
/// Responds `200` with the user as JSON, or `200` with `null` when no user
/// has this id. A segment that is not a 32-bit integer is rejected with
/// `400` before the repository is consulted.
pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Option<User>>> {
    let id: UserId = raw_id
        .parse()
        .map_err(|e| AppError::BadRequest(format!("user id must be an integer: {e}")))?;

    let user = state.users().find_by_id(id).await?;

    if let Some(found) = &user
        && state.lookup().log_found_users
    {
        tracing::info!(user = %found, "User found");
    }

    Ok(Json(user))
}

/// `GET /user/` with an empty id segment.
pub async fn missing_id() -> AppError {
    AppError::BadRequest("user id must be an integer: missing".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::LookupSettings;
    use crate::db::{InMemoryUserRepository, RepositoryError, UserRepository};
    use crate::models::NewUser;

    use super::*;

    /// In-memory repository that counts lookups and can simulate an outage.
    #[derive(Default)]
    struct FakeRepository {
        users: InMemoryUserRepository,
        unreachable: bool,
        lookups: AtomicUsize,
    }

    impl FakeRepository {
        fn with_users(users: impl IntoIterator<Item = User>) -> Self {
            Self {
                users: InMemoryUserRepository::with_users(users),
                ..Self::default()
            }
        }

        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Self::default()
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserRepository for FakeRepository {
        async fn find_by_id(&self, id: UserId) -> std::result::Result<Option<User>, RepositoryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.users.find_by_id(id).await
        }

        async fn create(&self, user: &NewUser) -> std::result::Result<User, RepositoryError> {
            self.users.create(user).await
        }

        async fn ping(&self) -> std::result::Result<(), RepositoryError> {
            self.users.ping().await
        }
    }

    /// Shared buffer the test subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn lines_containing(&self, needle: &str) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .filter(|line| line.contains(needle))
                .map(str::to_owned)
                .collect()
        }
    }

    /// Run a request with a text subscriber capturing log output.
    async fn get_logged(app: Router, uri: &str) -> (StatusCode, LogBuffer) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (status, _) = get(app, uri).await;
        (status, logs)
    }

    fn ann() -> User {
        NewUser {
            email: Some("a@x.com".to_string()),
            name: Some("Ann".to_string()),
            instant: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..NewUser::default()
        }
        .into_user(UserId::new(1))
    }

    fn app(repo: Arc<dyn UserRepository>, log_found_users: bool) -> Router {
        crate::routes::app(AppState::new(repo, LookupSettings { log_found_users }))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_found_user_is_returned() {
        let repo = Arc::new(InMemoryUserRepository::with_users([ann()]));

        for log_found_users in [true, false] {
            let (status, body) = get(app(repo.clone(), log_found_users), "/user/1").await;

            assert_eq!(status, StatusCode::OK);
            let value: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(
                value,
                json!({
                    "id": 1,
                    "email": "a@x.com",
                    "name": "Ann",
                    "timestamp": null,
                    "localDateTime": null,
                    "zonedDateTime": null,
                    "instant": "2024-01-01T00:00:00Z",
                })
            );
        }
    }

    #[tokio::test]
    async fn test_missing_user_is_null() {
        let repo = Arc::new(FakeRepository::default());

        let (status, body) = get(app(repo.clone(), true), "/user/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"null");
        assert_eq!(repo.lookups(), 1);
    }

    #[tokio::test]
    async fn test_malformed_ids_never_reach_repository() {
        let repo = Arc::new(FakeRepository::with_users([ann()]));

        for uri in ["/user/abc", "/user/1.5", "/user/", "/user/99999999999", "/user/%20"] {
            let (status, _) = get(app(repo.clone(), true), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        }

        assert_eq!(repo.lookups(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let (status, body) = get(app(Arc::new(FakeRepository::unreachable()), true), "/user/1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(body, b"null");
        assert_eq!(body, b"Internal server error");
    }

    #[tokio::test]
    async fn test_negative_and_extreme_ids_are_passed_through() {
        let repo = Arc::new(FakeRepository::default());

        for uri in ["/user/-1", "/user/0", "/user/2147483647", "/user/-2147483648"] {
            let (status, body) = get(app(repo.clone(), true), uri).await;
            assert_eq!(status, StatusCode::OK, "uri {uri}");
            assert_eq!(body, b"null");
        }

        assert_eq!(repo.lookups(), 4);
    }

    #[tokio::test]
    async fn test_repeated_lookups_are_idempotent() {
        let repo = Arc::new(InMemoryUserRepository::with_users([ann()]));

        let (_, first) = get(app(repo.clone(), true), "/user/1").await;
        let (_, second) = get(app(repo, true), "/user/1").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_found_user_is_logged_once_when_enabled() {
        let repo = Arc::new(InMemoryUserRepository::with_users([ann()]));

        let (status, logs) = get_logged(app(repo, true), "/user/1").await;

        assert_eq!(status, StatusCode::OK);
        let lines = logs.lines_containing("User found");
        assert_eq!(lines.len(), 1, "log lines: {lines:?}");
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains(&ann().to_string()));
        assert!(lines[0].contains("User(id=1, email=\"a@x.com\", name=\"Ann\""));
    }

    #[tokio::test]
    async fn test_found_user_is_not_logged_when_disabled() {
        let repo = Arc::new(InMemoryUserRepository::with_users([ann()]));

        let (status, logs) = get_logged(app(repo, false), "/user/1").await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.lines_containing("User found").is_empty());
        assert!(logs.lines_containing("User(id=").is_empty());
    }

    #[tokio::test]
    async fn test_absent_user_is_not_logged() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let (status, logs) = get_logged(app(repo, true), "/user/1").await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.lines_containing("User found").is_empty());
    }
}

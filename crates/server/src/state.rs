//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::LookupSettings;
use crate::db::UserRepository;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The repository is injected
/// by the caller, so tests can hand in a fake without touching a database.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    users: Arc<dyn UserRepository>,
    lookup: LookupSettings,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `users` - Repository used to resolve user lookups
    /// * `lookup` - Lookup endpoint settings
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, lookup: LookupSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner { users, lookup }),
        }
    }

    /// Get a reference to the user repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    /// Get the lookup endpoint settings.
    #[must_use]
    pub fn lookup(&self) -> LookupSettings {
        self.inner.lookup
    }
}

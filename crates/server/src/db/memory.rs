//! In-process user repository.
//!
//! Ids are assigned from a counter starting at 1, mirroring an identity
//! column. Nothing is persisted across restarts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use user_lookup_core::UserId;

use super::{RepositoryError, UserRepository};
use crate::models::{NewUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    last_id: i32,
}

/// Repository that keeps users in memory.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `users`, keeping their ids.
    ///
    /// Later inserts are assigned ids above the highest seeded id.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut inner = Inner::default();
        for user in users {
            inner.last_id = inner.last_id.max(user.id.as_i32());
            inner.users.insert(user.id, user);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Whether the repository holds no users.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        let next = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Unavailable("user id space exhausted".to_owned()))?;

        let stored = user.clone().into_user(UserId::new(next));
        inner.last_id = next;
        inner.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

//! User profile management.

use std::sync::Arc;

use tracing::instrument;

use crate::config::RecommenderConfig;
use crate::models::{User, UserId};
use crate::storage::traits::ProfileBackend;
use crate::{Error, Result, current_timestamp};

/// Service for creating and looking up users.
pub struct UserService {
    profiles: Arc<dyn ProfileBackend>,
    config: RecommenderConfig,
}

impl UserService {
    /// Creates a user service.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileBackend>, config: RecommenderConfig) -> Self {
        Self { profiles, config }
    }

    /// Creates a guest user with a random id and a zero taste vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    #[instrument(skip(self))]
    pub fn create_guest(&self) -> Result<User> {
        self.create_guest_with_id(UserId::generate())
    }

    /// Creates a guest user with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the id is blank or already taken.
    #[instrument(skip(self), fields(user_id = %id.as_str()))]
    pub fn create_guest_with_id(&self, id: UserId) -> Result<User> {
        if id.as_str().trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".to_string()));
        }

        let user = User::guest(id, self.config.embedding_dim, current_timestamp());
        self.profiles.create_user(&user)?;

        metrics::counter!("users_created_total", "user_type" => user.user_type.as_str())
            .increment(1);
        tracing::info!(user_id = %user.id.as_str(), "Created guest user");
        Ok(user)
    }

    /// Gets a user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserNotFound`] for unknown ids.
    pub fn get(&self, id: &UserId) -> Result<User> {
        self.profiles
            .get_user(id)?
            .ok_or_else(|| Error::UserNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::is_zero;
    use crate::storage::InMemoryStore;

    fn service() -> UserService {
        let config = RecommenderConfig::default().with_embedding_dim(8);
        UserService::new(Arc::new(InMemoryStore::new()), config)
    }

    #[test]
    fn test_create_guest() {
        let service = service();
        let user = service.create_guest().unwrap();
        assert_eq!(user.preference.len(), 8);
        assert!(is_zero(&user.preference));
        assert_eq!(service.get(&user.id).unwrap(), user);
    }

    #[test]
    fn test_create_guest_with_taken_id() {
        let service = service();
        service.create_guest_with_id(UserId::new("alice")).unwrap();
        assert!(matches!(
            service.create_guest_with_id(UserId::new("alice")),
            Err(Error::InvalidInput(_))
        ));
        assert!(service.create_guest_with_id(UserId::new("  ")).is_err());
    }

    #[test]
    fn test_get_unknown() {
        assert!(matches!(
            service().get(&UserId::new("nobody")),
            Err(Error::UserNotFound(_))
        ));
    }
}

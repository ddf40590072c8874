//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., MongoDB).

use async_trait::async_trait;

use crate::domain::entities::{NewUser, User, UserFilter, UserId, UserUpdate};
use crate::error::DomainError;

/// Repository for User documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List users matching an equality filter
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Apply a partial update, returning the updated user if it exists
    async fn update(&self, id: &UserId, update: &UserUpdate)
        -> Result<Option<User>, DomainError>;

    /// Delete a user, returning whether anything was removed
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;
}

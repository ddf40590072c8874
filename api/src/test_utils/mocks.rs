//! Mock implementations of port traits
//!
//! In-memory implementations that store data in memory and follow the
//! relaxed query mode: filters on unknown fields simply match nothing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::entities::{NewUser, User, UserFilter, UserId, UserUpdate};
use crate::domain::ports::UserRepository;
use crate::error::DomainError;

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

fn matches(user: &User, filter: &UserFilter) -> bool {
    filter.0.iter().all(|(field, value)| match field.as_str() {
        "_id" => user.id.to_string() == *value,
        "name" => user.name == *value,
        "email" => user.email == *value,
        "created_at" => user.created_at.to_rfc3339() == *value,
        _ => false,
    })
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        let mut found: Vec<User> = users
            .values()
            .filter(|u| matches(u, filter))
            .cloned()
            .collect();
        found.sort_by_key(|u| u.created_at);
        Ok(found)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let user = User {
            id: UserId::new(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            created_at: Utc::now(),
        };
        self.users.write().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write().unwrap();
        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut users = self.users.write().unwrap();
        Ok(users.remove(id).is_some())
    }
}

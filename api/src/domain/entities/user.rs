//! User domain entity
//!
//! Represents a user document stored in the `users` collection.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::DomainError;

/// Unique identifier for a user (MongoDB ObjectId)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub ObjectId);

impl UserId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for UserId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl std::str::FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::Validation(format!("Invalid user id: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Equality filter built from query parameters (`?name=ada&email=...`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter(pub BTreeMap<String, String>);

impl UserFilter {
    /// Fields the user schema defines. Only these are accepted in strict query mode.
    pub const KNOWN_FIELDS: &'static [&'static str] = &["_id", "name", "email", "created_at"];

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for UserFilter {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }
}

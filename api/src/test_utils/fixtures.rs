//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::adapters::ConnectionState;
use crate::config::Config;
use crate::domain::entities::{User, UserId};
use crate::domain::ports::UserRepository;
use crate::server::Lifecycle;
use crate::AppState;

/// Create a test user whose email is derived from the name
pub fn test_user(name: &str) -> User {
    User {
        id: UserId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name),
        created_at: Utc::now(),
    }
}

/// Configuration pointing at `url`, with short timeouts and an ephemeral port
pub fn test_config(url: &str) -> Config {
    Config {
        mongo_db_url: url.to_string(),
        mongo_db_name: None,
        connect_timeout: Duration::from_millis(500),
        host: [127, 0, 0, 1].into(),
        port: 0,
        shutdown_timeout: Duration::from_secs(1),
    }
}

/// App state over the given repository, with the database reported as open
pub fn test_state(users: Arc<dyn UserRepository>) -> AppState {
    let (_tx, database) = watch::channel(ConnectionState::Open);
    AppState::new(users, Lifecycle::new(), database)
}

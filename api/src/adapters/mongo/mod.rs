//! MongoDB adapters
//!
//! The shared connection handle and the repository implementations built on it.

pub mod connection;
pub mod user_repo;

pub use connection::{ConnectionState, MongoConnection, QueryMode};
pub use user_repo::MongoUserRepository;

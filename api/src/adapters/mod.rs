//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod mongo;

pub use mongo::{ConnectionState, MongoConnection, MongoUserRepository, QueryMode};

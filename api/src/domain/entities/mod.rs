//! Domain entities
//!
//! Pure domain models. Storage documents live in the adapters.

pub mod user;

pub use user::{NewUser, User, UserFilter, UserId, UserUpdate};

//! Test utilities
//!
//! Hand-written in-memory repositories and fixtures for unit tests.
//! Failure paths use the mockall-generated `MockUserRepository` instead.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

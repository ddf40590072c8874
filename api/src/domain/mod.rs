//! Domain layer
//!
//! - `entities`: Domain models representing the stored documents
//! - `ports`: Trait definitions for persistence
//!
//! `UserId` wraps a BSON ObjectId; nothing else here depends on the driver.

pub mod entities;
pub mod ports;

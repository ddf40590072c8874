//! Request middleware
//!
//! - `json_body`: parses JSON request bodies before handlers run
//! - `error_handler`: terminal stage that renders every error response

pub mod error_handler;
pub mod json_body;

pub use error_handler::{handle_errors, handle_panic, ErrorCounter};
pub use json_body::{parse_json_body, JsonBody};

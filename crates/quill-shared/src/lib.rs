//! # Quill Shared
//!
//! Wire types for the HTTP API, free of server dependencies so clients can reuse them.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};

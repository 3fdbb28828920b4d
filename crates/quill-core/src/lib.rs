//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! This crate holds the content model, the ports infrastructure must implement,
//! and the services that enforce publishing and moderation rules. It performs no I/O.

pub mod domain;
pub mod error;
pub mod ports;
pub mod sanitize;
pub mod services;
pub mod validation;

pub use error::{DomainError, RepoError};

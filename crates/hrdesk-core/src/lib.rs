//! # hrdesk-core
//!
//! Core crate for HRDesk. Contains configuration schemas, session lifecycle
//! events, and the unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other HRDesk crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

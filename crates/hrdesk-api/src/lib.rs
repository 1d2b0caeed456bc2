//! HTTP client and wire protocol types for the HRDesk backend.

pub mod client;
pub mod protocol;

pub use client::{ApiClient, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, VALIDATE_PATH};
pub use protocol::{ApiErrorBody, LoginRequest, LoginResponse, RefreshResponse};

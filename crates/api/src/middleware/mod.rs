//! Request middleware.

pub mod auth;
pub mod envelope;

pub use auth::{AuthUser, auth_middleware};
pub use envelope::{REQUEST_ID_HEADER, envelope_middleware};

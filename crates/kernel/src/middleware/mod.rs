//! HTTP middleware components.

pub mod bearer_auth;

pub use bearer_auth::authenticate_bearer_token;

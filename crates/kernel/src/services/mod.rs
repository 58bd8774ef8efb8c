//! Kernel services outside the offer catalog.
//!
//! Accounts and bearer identity. Catalog operations live in
//! [`crate::catalog`].

pub mod account;
pub mod identity;

pub use account::{
    AccountError, AccountProfile, AccountService, AuthenticatedAccount, LoginRequest,
    SignupRequest,
};
pub use identity::{CallerIdentity, IdentityVerifier, TokenVerifier};

//! Brocante marketplace kernel library.
//!
//! This library exposes the kernel for the `brocante` binary and for
//! integration testing.

pub mod asset;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;

//! Offer catalog.
//!
//! This module provides:
//! - OfferFilter / ListingQuery: normalization of raw listing filters
//! - query_builder: SQL generation for listing and counting offers
//! - merge: field validation and partial-update reconciliation
//! - OfferService: listing, detail, publish, update, and delete operations

mod error;
mod filter;
pub mod merge;
mod offer_service;
pub mod query_builder;

pub use error::{FieldViolation, OfferError};
pub use filter::{
    DEFAULT_PAGE_SIZE, DEFAULT_PRICE_MAX, DEFAULT_PRICE_MIN, ListingQuery, MAX_PAGE_SIZE,
    OfferFilter, OfferPredicate, SortOrder,
};
pub use merge::{apply_update, merge_details};
pub use offer_service::{OfferPage, OfferService};

//! Domain models.

pub mod offer;
pub mod user;

pub use offer::{
    AttributeChange, DetailKey, NewOffer, Offer, OfferChanges, OfferDetail, OfferDetails,
    OfferSummary, OwnerProfile, PriceInput,
};
pub use user::User;

//! Partial-update reconciliation for offers.
//!
//! [`apply_update`] validates every proposed field before touching anything,
//! then merges the accepted changes into a copy of the offer. A request with
//! any invalid field is rejected as a whole.

use tracing::debug;

use super::FieldViolation;
use crate::models::offer::{
    AttributeChange, DESCRIPTION_MAX_CHARS, DetailKey, NAME_MAX_CHARS, Offer, OfferChanges,
    OfferDetails, PRICE_CEILING, PriceInput,
};

/// Check an offer name.
pub fn validate_name(name: &str) -> Result<(), FieldViolation> {
    let len = name.chars().count();
    if len >= NAME_MAX_CHARS {
        return Err(FieldViolation::new(
            "name",
            format!("name must be shorter than {NAME_MAX_CHARS} characters (got {len})"),
        ));
    }
    Ok(())
}

/// Check an offer description.
pub fn validate_description(description: &str) -> Result<(), FieldViolation> {
    let len = description.chars().count();
    if len >= DESCRIPTION_MAX_CHARS {
        return Err(FieldViolation::new(
            "description",
            format!(
                "description must be shorter than {DESCRIPTION_MAX_CHARS} characters (got {len})"
            ),
        ));
    }
    Ok(())
}

/// Check an offer price against its numeric bounds.
pub fn validate_price(price: f64) -> Result<(), FieldViolation> {
    if !price.is_finite() || price < 0.0 {
        return Err(FieldViolation::new(
            "price",
            "price must be a non-negative number",
        ));
    }
    if price >= PRICE_CEILING {
        return Err(FieldViolation::new(
            "price",
            format!("price must be below {PRICE_CEILING}"),
        ));
    }
    Ok(())
}

/// Check a client-supplied price and return its amount.
pub fn validate_price_input(price: &PriceInput) -> Result<f64, FieldViolation> {
    match price {
        PriceInput::Amount(amount) => validate_price(*amount).map(|()| *amount),
        PriceInput::Unparsed(raw) => Err(FieldViolation::new(
            "price",
            format!("price must be a number (got '{raw}')"),
        )),
    }
}

/// Validate the scalar fields of a change set, collecting every violation.
pub fn validate_changes(changes: &OfferChanges) -> Vec<FieldViolation> {
    let checks = [
        changes.name.as_deref().map(validate_name),
        changes.description.as_deref().map(validate_description),
        changes
            .price
            .as_ref()
            .map(|p| validate_price_input(p).map(|_| ())),
    ];
    checks.into_iter().flatten().filter_map(Result::err).collect()
}

/// Produce the updated offer, or every violation if any field is invalid.
///
/// The returned offer keeps `changed` as-is; the caller stamps it when
/// persisting.
pub fn apply_update(existing: &Offer, changes: &OfferChanges) -> Result<Offer, Vec<FieldViolation>> {
    let violations = validate_changes(changes);
    if !violations.is_empty() {
        return Err(violations);
    }

    let mut updated = existing.clone();
    if let Some(name) = &changes.name {
        updated.name.clone_from(name);
    }
    if let Some(description) = &changes.description {
        updated.description.clone_from(description);
    }
    if let Some(PriceInput::Amount(price)) = changes.price {
        updated.price = price;
    }
    merge_details(&mut updated.details, &changes.attributes);

    Ok(updated)
}

/// Replace detail values in place.
///
/// Changes for keys the offer was not created with, including unrecognized
/// key names, are ignored. Returns how many values were replaced.
pub fn merge_details(details: &mut OfferDetails, changes: &[AttributeChange]) -> usize {
    let mut applied = 0;
    for change in changes {
        let Some(key) = DetailKey::parse(&change.key) else {
            debug!(key = %change.key, "ignoring unknown detail key");
            continue;
        };
        if details.set(key, change.value.clone()) {
            applied += 1;
        } else {
            debug!(key = %key, "ignoring detail key absent from offer");
        }
    }
    applied
}

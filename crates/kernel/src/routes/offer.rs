//! Offer route handlers.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::form::MultipartForm;
use crate::catalog::{OfferFilter, OfferPage};
use crate::error::{AppError, AppResult};
use crate::models::{
    AttributeChange, DetailKey, NewOffer, Offer, OfferChanges, OfferDetail, PriceInput,
};
use crate::services::CallerIdentity;
use crate::state::AppState;

/// Multipart field holding the offer picture.
const PICTURE_FIELD: &str = "picture";

/// Create the offer router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list_offers))
        .route("/offer/publish", post(publish_offer))
        .route("/offer/update/{id}", put(update_offer))
        .route("/offer/delete/{id}", delete(delete_offer))
        .route("/offer/{id}", get(get_offer))
}

/// List offers.
///
/// GET /offers?title=&priceMin=&priceMax=&sort=&page=&pageSize=
async fn list_offers(
    State(state): State<AppState>,
    Query(filter): Query<OfferFilter>,
) -> AppResult<Json<OfferPage>> {
    let page = state.offers().list_offers(&filter).await?;
    Ok(Json(page))
}

/// Get one offer with its owner's profile.
///
/// GET /offer/{id}
async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OfferDetail>> {
    let id = parse_offer_id(&id)?;
    let detail = state.offers().get_offer_detail(id).await?;
    Ok(Json(detail))
}

/// Publish an offer.
///
/// POST /offer/publish
/// Content-Type: multipart/form-data
///
/// Form fields: title, description, price, brand, size, condition, color,
/// city (or location), picture (file)
async fn publish_offer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    multipart: Multipart,
) -> AppResult<Json<Offer>> {
    let mut form = MultipartForm::read(multipart).await?;

    let input = NewOffer {
        title: form.text("title").unwrap_or_default(),
        description: form.text("description"),
        price: price_field(&form, &["price"]),
        brand: form.text("brand"),
        size: form.text("size"),
        condition: form.text("condition"),
        color: form.text("color"),
        location: form.text("city").or_else(|| form.text("location")),
    };
    let picture = form.take_file(PICTURE_FIELD);

    let offer = state.offers().publish_offer(&caller, input, picture).await?;
    Ok(Json(offer))
}

/// Partially update an offer.
///
/// PUT /offer/update/{id}
/// Content-Type: multipart/form-data
///
/// Form fields (all optional): product_name, product_description,
/// product_price, brand, size, condition, color, location, attributes
/// (JSON array of `{key, value}`), picture (file)
async fn update_offer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<Offer>> {
    let id = parse_offer_id(&id)?;
    let mut form = MultipartForm::read(multipart).await?;

    let changes = offer_changes(&form)?;
    let picture = form.take_file(PICTURE_FIELD);

    let offer = state
        .offers()
        .update_offer(id, &caller, changes, picture)
        .await?;
    Ok(Json(offer))
}

/// Delete an offer and its pictures.
///
/// DELETE /offer/delete/{id}
async fn delete_offer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_offer_id(&id)?;
    state.offers().delete_offer(id, &caller).await?;
    Ok(Json(json!({ "message": "Offer deleted" })))
}

/// Ids that are not UUIDs cannot name an offer.
fn parse_offer_id(raw: &str) -> AppResult<Uuid> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// The first present price field among `names`.
///
/// Unparseable text is passed on and reported by the service together with
/// every other invalid field.
fn price_field(form: &MultipartForm, names: &[&str]) -> Option<PriceInput> {
    names
        .iter()
        .find_map(|name| form.text(name))
        .map(|raw| PriceInput::parse(&raw))
}

/// Collect the changes of an update form.
fn offer_changes(form: &MultipartForm) -> AppResult<OfferChanges> {
    let mut attributes: Vec<AttributeChange> = DetailKey::ALL
        .into_iter()
        .filter_map(|key| {
            form.text(&key.as_str().to_lowercase())
                .map(|value| AttributeChange::new(key.as_str(), value))
        })
        .collect();

    if let Some(raw) = form.text("attributes") {
        let extra: Vec<AttributeChange> = serde_json::from_str(&raw).map_err(|e| {
            AppError::BadRequest(format!("attributes must be a JSON array of {{key, value}}: {e}"))
        })?;
        attributes.extend(extra);
    }

    Ok(OfferChanges {
        name: form.text("product_name").or_else(|| form.text("name")),
        description: form
            .text("product_description")
            .or_else(|| form.text("description")),
        price: price_field(form, &["product_price", "price"]),
        attributes,
    })
}

//! Offer model.
//!
//! Offers are the listings of the marketplace. Besides the scalar fields
//! each offer carries a small set of structured details (brand, size, ...)
//! whose keys are fixed when the offer is published.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::asset::StoredAsset;

/// Offer names must be strictly shorter than this many characters.
pub const NAME_MAX_CHARS: usize = 50;

/// Offer descriptions must be strictly shorter than this many characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Prices must be strictly below this value.
pub const PRICE_CEILING: f64 = 100_000.0;

/// Recognized structured detail keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetailKey {
    Brand,
    Size,
    Condition,
    Color,
    Location,
}

impl DetailKey {
    /// All keys, in the order new offers lay them out.
    pub const ALL: [DetailKey; 5] = [
        DetailKey::Brand,
        DetailKey::Size,
        DetailKey::Condition,
        DetailKey::Color,
        DetailKey::Location,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetailKey::Brand => "BRAND",
            DetailKey::Size => "SIZE",
            DetailKey::Condition => "CONDITION",
            DetailKey::Color => "COLOR",
            DetailKey::Location => "LOCATION",
        }
    }

    /// Parse a key name. Only the exact upper-case names are recognized.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl std::fmt::Display for DetailKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured offer details.
///
/// Stored as one slot per known key plus the order the keys were laid out
/// in at creation. Only keys listed in `order` are part of the offer; the
/// key set and order never change after construction.
///
/// On the wire this is an array of single-key objects:
/// `[{"BRAND": "Nike"}, {"SIZE": "M"}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferDetails {
    brand: Option<String>,
    size: Option<String>,
    condition: Option<String>,
    color: Option<String>,
    location: Option<String>,
    order: Vec<DetailKey>,
}

/// Error building details with the same key twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("duplicate detail key {0}")]
pub struct DuplicateDetailKey(pub DetailKey);

impl OfferDetails {
    /// Build details from ordered entries. Each key may appear at most once.
    pub fn from_entries<I, V>(entries: I) -> Result<Self, DuplicateDetailKey>
    where
        I: IntoIterator<Item = (DetailKey, V)>,
        V: Into<String>,
    {
        let mut details = Self::default();
        for (key, value) in entries {
            if details.order.contains(&key) {
                return Err(DuplicateDetailKey(key));
            }
            details.order.push(key);
            *details.slot_mut(key) = Some(value.into());
        }
        Ok(details)
    }

    /// Keys of this offer, in their fixed order.
    pub fn keys(&self) -> &[DetailKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: DetailKey) -> bool {
        self.slot(key).is_some()
    }

    /// Value for `key`, if the offer has that key.
    pub fn get(&self, key: DetailKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Replace the value of an existing key.
    ///
    /// Returns `false`, leaving the details untouched, when the offer was not
    /// created with `key`.
    pub fn set(&mut self, key: DetailKey, value: impl Into<String>) -> bool {
        match self.slot_mut(key) {
            Some(current) => {
                *current = value.into();
                true
            }
            None => false,
        }
    }

    /// Entries in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (DetailKey, &str)> + '_ {
        self.order
            .iter()
            .map(|key| (*key, self.get(*key).unwrap_or_default()))
    }

    fn slot(&self, key: DetailKey) -> &Option<String> {
        match key {
            DetailKey::Brand => &self.brand,
            DetailKey::Size => &self.size,
            DetailKey::Condition => &self.condition,
            DetailKey::Color => &self.color,
            DetailKey::Location => &self.location,
        }
    }

    fn slot_mut(&mut self, key: DetailKey) -> &mut Option<String> {
        match key {
            DetailKey::Brand => &mut self.brand,
            DetailKey::Size => &mut self.size,
            DetailKey::Condition => &mut self.condition,
            DetailKey::Color => &mut self.color,
            DetailKey::Location => &mut self.location,
        }
    }
}

struct DetailEntry<'a>(DetailKey, &'a str);

impl Serialize for DetailEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0, self.1)?;
        map.end()
    }
}

impl Serialize for OfferDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.order.len()))?;
        for (key, value) in self.iter() {
            seq.serialize_element(&DetailEntry(key, value))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for OfferDetails {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<BTreeMap<DetailKey, String>>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            if entry.len() != 1 {
                return Err(D::Error::custom(format!(
                    "detail entry must have exactly one key, found {}",
                    entry.len()
                )));
            }
            entries.extend(entry);
        }
        OfferDetails::from_entries(entries).map_err(D::Error::custom)
    }
}

/// Offer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    pub name: String,

    pub description: String,

    pub price: f64,

    /// Structured details with a fixed key set.
    pub details: OfferDetails,

    /// Stored picture, if any.
    pub image: Option<StoredAsset>,

    /// Owning user ID.
    pub owner_id: Uuid,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Listing projection of an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OfferSummary {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
}

impl From<&Offer> for OfferSummary {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id,
            name: offer.name.clone(),
            price: offer.price,
        }
    }
}

/// Public fields of an offer's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerProfile {
    pub id: Uuid,
    pub username: String,
    pub phone: Option<String>,
    pub avatar: Option<StoredAsset>,
}

/// Full offer with its owner's public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferDetail {
    #[serde(flatten)]
    pub offer: Offer,
    pub owner: Option<OwnerProfile>,
}

/// A price as sent by the client.
///
/// Text that does not parse is kept so validation can report it alongside
/// every other field instead of failing early.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Amount(f64),
    Unparsed(String),
}

impl PriceInput {
    /// Parse client text. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(amount) => PriceInput::Amount(amount),
            Err(_) => PriceInput::Unparsed(raw.to_string()),
        }
    }
}

impl From<f64> for PriceInput {
    fn from(amount: f64) -> Self {
        PriceInput::Amount(amount)
    }
}

/// Input for publishing a new offer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOffer {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub color: Option<String>,
    pub location: Option<String>,
}

impl NewOffer {
    /// Details laid out in the standard key order.
    ///
    /// Every key is present so later updates can set any of them; missing
    /// values are stored as empty strings.
    pub fn details(&self) -> OfferDetails {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        let entries = [
            (DetailKey::Brand, value(&self.brand)),
            (DetailKey::Size, value(&self.size)),
            (DetailKey::Condition, value(&self.condition)),
            (DetailKey::Color, value(&self.color)),
            (DetailKey::Location, value(&self.location)),
        ];
        // Keys are distinct by construction.
        OfferDetails::from_entries(entries).unwrap_or_default()
    }
}

/// Proposed change to one structured detail.
///
/// The key is kept as received so unknown keys can be ignored rather than
/// rejected. Keys match the upper-case detail names exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub key: String,
    pub value: String,
}

impl AttributeChange {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Partial update of an offer. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub attributes: Vec<AttributeChange>,
}

impl OfferChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.attributes.is_empty()
    }
}

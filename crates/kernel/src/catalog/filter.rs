//! Listing filter normalization.
//!
//! Clients send every listing parameter as an optional, loosely-typed query
//! string value. [`OfferFilter::normalize`] turns that into a [`ListingQuery`]
//! whose every field has a concrete, validated value.

use serde::Deserialize;

use super::FieldViolation;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Lower price bound when `priceMin` is absent.
pub const DEFAULT_PRICE_MIN: f64 = 0.0;

/// Upper price bound when `priceMax` is absent.
pub const DEFAULT_PRICE_MAX: f64 = 100_000.0;

/// Raw listing filter as received from the client.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferFilter {
    pub title: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Result ordering for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Storage order (creation order).
    #[default]
    Natural,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Parse the wire value (`price-asc` / `price-desc`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "price-asc" => Some(SortOrder::PriceAsc),
            "price-desc" => Some(SortOrder::PriceDesc),
            _ => None,
        }
    }
}

/// The filter predicate alone: what `count` is computed over.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferPredicate {
    /// Case-insensitive substring of the offer name. Empty matches everything.
    pub title: String,
    pub price_min: f64,
    pub price_max: f64,
}

impl Default for OfferPredicate {
    fn default() -> Self {
        Self {
            title: String::new(),
            price_min: DEFAULT_PRICE_MIN,
            price_max: DEFAULT_PRICE_MAX,
        }
    }
}

impl OfferPredicate {
    /// Evaluate the predicate against one offer.
    ///
    /// Bounds are never swapped: `price_min > price_max` matches nothing.
    pub fn matches(&self, name: &str, price: f64) -> bool {
        if price < self.price_min || price > self.price_max {
            return false;
        }
        self.title.is_empty() || name.to_lowercase().contains(&self.title.to_lowercase())
    }
}

/// A fully normalized listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub predicate: OfferPredicate,
    pub sort: SortOrder,
    /// 1-indexed page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            predicate: OfferPredicate::default(),
            sort: SortOrder::Natural,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingQuery {
    /// Number of matching records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_size).saturating_mul(u64::from(self.page.saturating_sub(1)))
    }

    /// Number of records to return.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl OfferFilter {
    /// Apply defaults and bounds, collecting every invalid parameter.
    pub fn normalize(&self) -> Result<ListingQuery, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        // Blank titles are absent; otherwise whitespace is part of the substring.
        let title = match &self.title {
            Some(raw) if present(&self.title).is_some() => raw.clone(),
            _ => String::new(),
        };

        let price_min = parse_price(&self.price_min, "priceMin", DEFAULT_PRICE_MIN)
            .unwrap_or_else(|v| {
                violations.push(v);
                DEFAULT_PRICE_MIN
            });
        let price_max = parse_price(&self.price_max, "priceMax", DEFAULT_PRICE_MAX)
            .unwrap_or_else(|v| {
                violations.push(v);
                DEFAULT_PRICE_MAX
            });

        let sort = match present(&self.sort) {
            None => SortOrder::Natural,
            Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
                violations.push(FieldViolation::new(
                    "sort",
                    format!("unknown sort '{raw}', expected price-asc or price-desc"),
                ));
                SortOrder::Natural
            }),
        };

        let page = match present(&self.page) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => 1,
                Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
                Err(_) => {
                    violations.push(FieldViolation::new("page", "page must be an integer"));
                    1
                }
            },
        };

        let page_size = match present(&self.page_size) {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&n) => n as u32,
                Ok(_) => {
                    violations.push(FieldViolation::new(
                        "pageSize",
                        format!("pageSize must be between 1 and {MAX_PAGE_SIZE}"),
                    ));
                    DEFAULT_PAGE_SIZE
                }
                Err(_) => {
                    violations.push(FieldViolation::new(
                        "pageSize",
                        "pageSize must be an integer",
                    ));
                    DEFAULT_PAGE_SIZE
                }
            },
        };

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ListingQuery {
            predicate: OfferPredicate {
                title,
                price_min,
                price_max,
            },
            sort,
            page,
            page_size,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(
    value: &Option<String>,
    field: &'static str,
    default: f64,
) -> Result<f64, FieldViolation> {
    let Some(raw) = present(value) else {
        return Ok(default);
    };
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(FieldViolation::new(
            field,
            format!("{field} must be a number"),
        )),
    }
}

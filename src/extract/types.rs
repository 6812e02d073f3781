//! Extraction types and traits
//!
//! Defines the record shapes a listing page produces, the field values of a
//! seller profile, and the trait every extraction strategy implements.

use crate::browser::RenderedPage;
use crate::error::{Error, Result};
use crate::types::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Record
// ============================================================================

/// One row produced by a listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A service card on a category listing
    Listing {
        title: String,
        seller: String,
        link: String,
    },
    /// A buyer review on a seller profile
    Review {
        date: String,
        service_title: String,
        period: Option<String>,
        price: Option<String>,
    },
    /// A portfolio entry or service offered by a seller
    Service {
        title: String,
        hashtag: Option<String>,
        link: String,
    },
}

impl Record {
    /// Fixed column names for a record kind
    pub fn columns(kind: RecordKind) -> &'static [&'static str] {
        match kind {
            RecordKind::Listing => &["title", "seller", "link"],
            RecordKind::Review => &["date", "service_title", "period", "price"],
            RecordKind::Service => &["title", "hashtag", "link"],
        }
    }

    /// Which shape this record has
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Listing { .. } => RecordKind::Listing,
            Record::Review { .. } => RecordKind::Review,
            Record::Service { .. } => RecordKind::Service,
        }
    }

    /// Cell values in column order; absent optionals become empty strings
    pub fn cells(&self) -> Vec<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        match self {
            Record::Listing {
                title,
                seller,
                link,
            } => vec![title.clone(), seller.clone(), link.clone()],
            Record::Review {
                date,
                service_title,
                period,
                price,
            } => vec![date.clone(), service_title.clone(), opt(period), opt(price)],
            Record::Service {
                title,
                hashtag,
                link,
            } => vec![title.clone(), opt(hashtag), link.clone()],
        }
    }

    /// Seller name, for listing records
    pub fn seller(&self) -> Option<&str> {
        match self {
            Record::Listing { seller, .. } => Some(seller),
            _ => None,
        }
    }

    /// Build a record of `kind` from named field values.
    ///
    /// Required fields that are absent or empty fail with
    /// [`Error::MissingField`]; optional ones become `None`.
    pub fn from_fields(kind: RecordKind, mut fields: BTreeMap<String, String>) -> Result<Self> {
        let mut take = |name: &str| fields.remove(name).filter(|v| !v.is_empty());
        let record = match kind {
            RecordKind::Listing => Record::Listing {
                title: take("title").ok_or_else(|| Error::missing_record_field("title"))?,
                seller: take("seller").ok_or_else(|| Error::missing_record_field("seller"))?,
                link: take("link").ok_or_else(|| Error::missing_record_field("link"))?,
            },
            RecordKind::Review => Record::Review {
                date: take("date").ok_or_else(|| Error::missing_record_field("date"))?,
                service_title: take("service_title")
                    .ok_or_else(|| Error::missing_record_field("service_title"))?,
                period: take("period"),
                price: take("price"),
            },
            RecordKind::Service => Record::Service {
                title: take("title").ok_or_else(|| Error::missing_record_field("title"))?,
                hashtag: take("hashtag"),
                link: take("link").ok_or_else(|| Error::missing_record_field("link"))?,
            },
        };
        Ok(record)
    }
}

// ============================================================================
// Seller Profile
// ============================================================================

/// Value of a single profile field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain text
    Text(String),
    /// Ordered list of tags
    List(Vec<String>),
    /// Group title to tags
    Map(BTreeMap<String, Vec<String>>),
}

impl FieldValue {
    /// Check whether the field carries nothing
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Map(groups) => groups.is_empty(),
        }
    }

    /// Flat cell representation: text as-is, lists and maps as JSON
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// Output row of a profile crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerProfile {
    /// Seller name as it appears in listings
    pub seller: String,
    /// Profile page the fields were read from
    pub profile_url: String,
    /// Extracted profile fields by name
    pub fields: BTreeMap<String, FieldValue>,
    /// Reviews across every review page
    pub reviews: Vec<Record>,
    /// Services across every service page
    pub services: Vec<Record>,
}

impl SellerProfile {
    /// Create an empty profile
    pub fn new(seller: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            seller: seller.into(),
            profile_url: profile_url.into(),
            fields: BTreeMap::new(),
            reviews: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Column names: seller, profile_url, the fields, reviews, services
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["seller".to_string(), "profile_url".to_string()];
        columns.extend(self.fields.keys().cloned());
        columns.push("reviews".to_string());
        columns.push("services".to_string());
        columns
    }

    /// Cell values in column order
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![self.seller.clone(), self.profile_url.clone()];
        cells.extend(self.fields.values().map(FieldValue::to_cell));
        cells.push(serde_json::to_string(&self.reviews).unwrap_or_default());
        cells.push(serde_json::to_string(&self.services).unwrap_or_default());
        cells
    }

    /// Text of a field, if present and textual
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Extractor Trait
// ============================================================================

/// Core trait for page extraction strategies
///
/// Extraction is synchronous: it works on HTML already captured by the
/// browser, so parsed documents never live across an `.await`.
pub trait PageExtractor: Send + Sync {
    /// Extract the records of one rendered page, in page order
    fn extract(&self, page: &RenderedPage) -> Result<Vec<Record>>;

    /// Record shape this extractor produces
    fn kind(&self) -> RecordKind;
}

impl PageExtractor for Box<dyn PageExtractor> {
    fn extract(&self, page: &RenderedPage) -> Result<Vec<Record>> {
        self.as_ref().extract(page)
    }

    fn kind(&self) -> RecordKind {
        self.as_ref().kind()
    }
}

//! Page extraction module
//!
//! Supports: CSS selector cards, text patterns, fallback chains, profile fields
//!
//! # Overview
//!
//! The extract module turns rendered HTML into typed records. Site-specific
//! selectors are data: every extractor is compiled from field definitions,
//! never hard-coded.

mod profile;
mod strategies;
mod types;

pub use profile::{GroupFieldSpec, ListFieldSpec, ProfileExtractor, ProfileFields, SectionRef};
pub use strategies::{
    element_text, FallbackExtractor, FieldReader, FieldSpec, FieldTransform, SelectorExtractor,
    TextPatternExtractor,
};
pub use types::{FieldValue, PageExtractor, Record, SellerProfile};

//! Runtime objects from definitions
//!
//! Turns listing and profile definitions into the extractors and advancers
//! the engine runs with.

use crate::error::Result;
use crate::extract::{
    FallbackExtractor, PageExtractor, ProfileExtractor, SelectorExtractor, TextPatternExtractor,
};
use crate::loader::types::{ListingDefinition, PaginationDefinition, ProfileDefinition};
use crate::pagination::{
    Advancer, NextControlAdvancer, PageParamAdvancer, ProgressSignal, SinglePageAdvancer,
};

/// Build the extractor of a listing: the selector strategy, backed by the
/// text pattern when one is defined
pub fn build_extractor(def: &ListingDefinition) -> Result<Box<dyn PageExtractor>> {
    let primary: Box<dyn PageExtractor> = Box::new(SelectorExtractor::new(
        def.kind,
        &def.extract.container,
        &def.extract.fields,
    )?);

    let Some(fallback) = &def.fallback else {
        return Ok(primary);
    };

    let fallback = TextPatternExtractor::new(
        def.kind,
        fallback.container.as_deref(),
        &fallback.pattern,
        &fallback.fields,
    )?;
    Ok(Box::new(FallbackExtractor::new(primary, Box::new(fallback))?))
}

/// Build the advancer of a listing: a page-number parameter when one is
/// declared, else the control itself
pub fn build_advancer(def: Option<&PaginationDefinition>) -> Box<dyn Advancer> {
    let Some(def) = def else {
        return Box::new(SinglePageAdvancer);
    };

    let progress = match &def.page_marker {
        Some(marker) => ProgressSignal::PageMarker(marker.clone()),
        None => ProgressSignal::Locator,
    };
    match &def.page_param {
        Some(param) => Box::new(PageParamAdvancer::new(param, &def.control).with_progress(progress)),
        None => Box::new(NextControlAdvancer::new(&def.control).with_progress(progress)),
    }
}

/// Build the field extractor of a profile page
pub fn build_profile_extractor(def: &ProfileDefinition) -> Result<ProfileExtractor> {
    ProfileExtractor::new(&def.fields)
}

//! YAML parser for site definitions
//!
//! Parses and validates site YAML files.
//! Supports both built-in sites (by name) and custom YAML files (by path).

use crate::browser::parse_selector;
use crate::error::{Error, Result};
use crate::loader::build::{build_extractor, build_profile_extractor};
use crate::loader::types::{ListingDefinition, ProfileDefinition, SiteDefinition};
use crate::sites;
use crate::template;
use crate::types::RecordKind;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Variables every locator can use
const SITE_VARIABLES: &[&str] = &["base_url", "name"];

/// Load a site definition from a name or file path
///
/// This function first checks if the input is a built-in site name (e.g., "kmong"),
/// then falls back to loading from a file path.
pub fn load_site(path: impl AsRef<Path>) -> Result<SiteDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = sites::get_builtin(&path_str) {
            return load_site_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Site '{}' not found. Built-in sites: {}. Or provide a path to a YAML file.",
                path.display(),
                sites::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read site file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_site_from_str(&content)
}

/// Load a site definition from a YAML string
pub fn load_site_from_str(yaml: &str) -> Result<SiteDefinition> {
    let def: SiteDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse site YAML: {e}")))?;

    validate_site(&def)?;
    Ok(def)
}

/// Validate a site definition
fn validate_site(def: &SiteDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Site name cannot be empty"));
    }

    if def.base_url.is_empty() {
        return Err(Error::config("Site base_url cannot be empty"));
    }
    url::Url::parse(&def.base_url)
        .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

    if def.listings.is_empty() {
        return Err(Error::config("Site must have at least one listing"));
    }

    let names: HashSet<_> = def.listings.iter().map(|l| &l.name).collect();
    if names.len() != def.listings.len() {
        return Err(Error::config("Duplicate listing names found"));
    }

    let profile_variable = def.profile.as_ref().map(|p| p.variable.as_str());
    let profile_refs = def
        .profile
        .as_ref()
        .map(ProfileDefinition::listing_refs)
        .unwrap_or_default();

    for listing in &def.listings {
        let embedded = profile_refs.contains(&listing.name.as_str());
        validate_listing(listing, embedded.then_some(profile_variable).flatten())?;
    }

    if let Some(profile) = &def.profile {
        validate_profile(def, profile)?;
    }

    Ok(())
}

/// Validate a listing definition
///
/// `profile_variable` is set when the listing is crawled as part of a
/// profile, which makes the seller variable available to its locator.
fn validate_listing(listing: &ListingDefinition, profile_variable: Option<&str>) -> Result<()> {
    if listing.name.is_empty() {
        return Err(Error::config("Listing name cannot be empty"));
    }

    build_extractor(listing)
        .map_err(|e| Error::config(format!("Listing '{}': {e}", listing.name)))?;

    if let Some(pagination) = &listing.pagination {
        parse_selector(&pagination.control)
            .map_err(|e| Error::config(format!("Listing '{}': {e}", listing.name)))?;
        if let Some(marker) = &pagination.page_marker {
            parse_selector(marker)
                .map_err(|e| Error::config(format!("Listing '{}': {e}", listing.name)))?;
        }
        if pagination.page_param.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(Error::invalid_value(
                format!("{}.pagination.page_param", listing.name),
                "cannot be empty",
            ));
        }
    }

    if listing.max_pages == Some(0) {
        return Err(Error::invalid_value(
            format!("{}.max_pages", listing.name),
            "must be at least 1",
        ));
    }

    let Some(locator) = &listing.locator else {
        if profile_variable.is_none() {
            return Err(Error::config(format!(
                "Listing '{}' has no locator and is not part of the profile",
                listing.name
            )));
        }
        return Ok(());
    };

    let allowed: Vec<&str> = listing
        .variable
        .as_deref()
        .into_iter()
        .chain(profile_variable)
        .collect();
    check_locator(&listing.name, locator, &allowed)
}

/// Validate the profile definition and the listings it refers to
fn validate_profile(site: &SiteDefinition, profile: &ProfileDefinition) -> Result<()> {
    if profile.locator.is_empty() {
        return Err(Error::config("Profile locator cannot be empty"));
    }
    check_locator("profile", &profile.locator, &[profile.variable.as_str()])?;

    build_profile_extractor(profile).map_err(|e| Error::config(format!("Profile: {e}")))?;

    let refs = [
        ("reviews", &profile.reviews, RecordKind::Review),
        ("services", &profile.services, RecordKind::Service),
        ("sellers_from", &profile.sellers_from, RecordKind::Listing),
    ];
    for (field, name, kind) in refs {
        let Some(name) = name else { continue };
        let listing = site.listing(name).ok_or_else(|| {
            Error::config(format!("Profile {field} refers to unknown listing '{name}'"))
        })?;
        if listing.kind != kind {
            return Err(Error::config(format!(
                "Profile {field} listing '{name}' produces {} records, expected {kind}",
                listing.kind
            )));
        }
    }

    Ok(())
}

/// Every variable in `locator` must be a site variable or one of `allowed`
fn check_locator(owner: &str, locator: &str, allowed: &[&str]) -> Result<()> {
    for variable in template::extract_variables(locator) {
        let known = match variable.split_once('.') {
            Some(("site", key)) => SITE_VARIABLES.contains(&key),
            Some(("target", key)) => allowed.contains(&key),
            Some(_) => false,
            None => SITE_VARIABLES.contains(&variable.as_str()) || allowed.contains(&variable.as_str()),
        };
        if !known {
            return Err(Error::config(format!(
                "'{owner}' locator uses unknown variable '{variable}'"
            )));
        }
    }
    Ok(())
}

//! Extraction strategy implementations
//!
//! Each strategy turns a rendered page into records of one shape.

use super::types::{PageExtractor, Record};
use crate::browser::{parse_selector, RenderedPage};
use crate::error::{Error, Result};
use crate::types::{normalize_text, RecordKind};
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// Field Transforms
// ============================================================================

/// Text clean-up applied to an extracted value, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTransform {
    /// Remove a leading string (e.g. `"Order range : "`)
    StripPrefix(String),
    /// Remove a trailing string (e.g. a unit suffix)
    StripSuffix(String),
    /// Replace every occurrence of `from` with `to`
    Replace {
        from: String,
        #[serde(default)]
        to: String,
    },
    /// Keep at most this many characters
    MaxChars(usize),
}

impl FieldTransform {
    /// Apply the transform
    pub fn apply(&self, value: String) -> String {
        match self {
            FieldTransform::StripPrefix(prefix) => match value.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => value,
            },
            FieldTransform::StripSuffix(suffix) => match value.strip_suffix(suffix.as_str()) {
                Some(rest) => rest.to_string(),
                None => value,
            },
            FieldTransform::Replace { from, to } => value.replace(from.as_str(), to),
            FieldTransform::MaxChars(n) => value.chars().take(*n).collect(),
        }
    }
}

// ============================================================================
// Field Spec
// ============================================================================

/// Where a single field value lives inside a container element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// CSS selector relative to the container; absent means the container itself
    #[serde(default)]
    pub selector: Option<String>,
    /// Attribute to read instead of the text
    #[serde(default)]
    pub attr: Option<String>,
    /// Only accept elements whose text contains this
    #[serde(default)]
    pub contains: Option<String>,
    /// Clean-up applied after reading
    #[serde(default)]
    pub transforms: Vec<FieldTransform>,
}

impl FieldSpec {
    /// Field read from the first element matching `selector`
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Default::default()
        }
    }

    /// Field read from an attribute of the first match
    pub fn attr(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            attr: Some(attr.into()),
            ..Default::default()
        }
    }

    /// Require the element text to contain `needle`
    #[must_use]
    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    /// Append a transform
    #[must_use]
    pub fn with_transform(mut self, transform: FieldTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Compile into a reusable field reader
    pub fn compile(&self) -> Result<FieldReader> {
        let selector = self.selector.as_deref().map(parse_selector).transpose()?;
        Ok(FieldReader {
            selector,
            attr: self.attr.clone(),
            contains: self.contains.clone(),
            transforms: self.transforms.clone(),
        })
    }
}

/// A compiled [`FieldSpec`]
#[derive(Debug, Clone)]
pub struct FieldReader {
    selector: Option<Selector>,
    attr: Option<String>,
    contains: Option<String>,
    transforms: Vec<FieldTransform>,
}

impl FieldReader {
    /// Read the field from `scope`; `base_url` resolves link attributes
    pub fn read(&self, scope: ElementRef<'_>, base_url: &str) -> Option<String> {
        let element = match &self.selector {
            Some(selector) => scope.select(selector).find(|el| self.accepts(el))?,
            None if self.accepts(&scope) => scope,
            None => return None,
        };
        self.value_of(element, base_url)
    }

    /// Read every matching element, in document order
    pub fn read_all(&self, scope: ElementRef<'_>, base_url: &str) -> Vec<String> {
        let Some(selector) = &self.selector else {
            return self.read(scope, base_url).into_iter().collect();
        };
        scope
            .select(selector)
            .filter(|el| self.accepts(el))
            .filter_map(|el| self.value_of(el, base_url))
            .collect()
    }

    fn value_of(&self, element: ElementRef<'_>, base_url: &str) -> Option<String> {
        let raw = match &self.attr {
            Some(attr) => {
                let value = element.value().attr(attr)?.trim().to_string();
                if is_link_attr(attr) {
                    resolve_link(base_url, &value)
                } else {
                    value
                }
            }
            None => element_text(&element),
        };
        let value = self
            .transforms
            .iter()
            .fold(raw, |value, transform| transform.apply(value));
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    fn accepts(&self, element: &ElementRef<'_>) -> bool {
        match &self.contains {
            Some(needle) => element_text(element).contains(needle.as_str()),
            None => true,
        }
    }
}

/// Normalised text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn is_link_attr(attr: &str) -> bool {
    matches!(attr, "href" | "src")
}

fn resolve_link(base_url: &str, href: &str) -> String {
    url::Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn compile_fields(fields: &BTreeMap<String, FieldSpec>) -> Result<Vec<(String, FieldReader)>> {
    fields
        .iter()
        .map(|(name, spec)| Ok((name.clone(), spec.compile()?)))
        .collect()
}

fn check_fields(kind: RecordKind, fields: &BTreeMap<String, FieldSpec>) -> Result<()> {
    for name in fields.keys() {
        if !Record::columns(kind).contains(&name.as_str()) {
            return Err(Error::invalid_value(
                name.clone(),
                format!("not a {kind} column (expected one of {:?})", Record::columns(kind)),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Selector Extractor
// ============================================================================

/// Structured extraction: one record per container element, one CSS
/// selector per field
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    kind: RecordKind,
    container_text: String,
    container: Selector,
    fields: Vec<(String, FieldReader)>,
}

impl SelectorExtractor {
    /// Compile an extractor; every field name must be a column of `kind`
    pub fn new(
        kind: RecordKind,
        container: &str,
        fields: &BTreeMap<String, FieldSpec>,
    ) -> Result<Self> {
        check_fields(kind, fields)?;
        Ok(Self {
            kind,
            container_text: container.to_string(),
            container: parse_selector(container)?,
            fields: compile_fields(fields)?,
        })
    }
}

impl PageExtractor for SelectorExtractor {
    /// Cards that match the container but yield no record are skipped.
    /// When every matched card is skipped the markup no longer fits the
    /// field selectors, and the page fails instead of reading as empty.
    fn extract(&self, page: &RenderedPage) -> Result<Vec<Record>> {
        let document = page.document();
        let mut records = Vec::new();
        let mut unreadable = Unreadable::default();

        for container in document.select(&self.container) {
            let values: BTreeMap<String, String> = self
                .fields
                .iter()
                .filter_map(|(name, reader)| {
                    reader
                        .read(container, &page.url)
                        .map(|value| (name.clone(), value))
                })
                .collect();

            match Record::from_fields(self.kind, values) {
                Ok(record) => records.push(record),
                Err(e) => unreadable.skip(self.kind, e),
            }
        }

        unreadable.check(records, &self.container_text)
    }

    fn kind(&self) -> RecordKind {
        self.kind
    }
}

/// Cards a container matched but no record could be built from
#[derive(Debug, Default)]
struct Unreadable {
    count: usize,
    first: Option<Error>,
}

impl Unreadable {
    fn skip(&mut self, kind: RecordKind, error: Error) {
        debug!("Skipping {kind} card: {error}");
        self.count += 1;
        self.first.get_or_insert(error);
    }

    /// `records`, or an extraction error when cards matched and none was read
    fn check(self, records: Vec<Record>, container: &str) -> Result<Vec<Record>> {
        match self.first {
            Some(first) if records.is_empty() => Err(Error::extraction(format!(
                "{} cards matched '{container}' but none could be read: {first}",
                self.count
            ))),
            _ => Ok(records),
        }
    }
}

// ============================================================================
// Text Pattern Extractor
// ============================================================================

/// Unstructured extraction: a regex with named groups run over the text of
/// each container (one line per text node)
///
/// Fields the text does not carry, such as links, can still be read with
/// selectors through `fields`.
#[derive(Debug, Clone)]
pub struct TextPatternExtractor {
    kind: RecordKind,
    container_text: Option<String>,
    container: Option<Selector>,
    pattern: Regex,
    fields: Vec<(String, FieldReader)>,
}

impl TextPatternExtractor {
    /// Compile an extractor.
    ///
    /// Without a container the pattern runs over the whole body text and
    /// every match is a record.
    pub fn new(
        kind: RecordKind,
        container: Option<&str>,
        pattern: &str,
        fields: &BTreeMap<String, FieldSpec>,
    ) -> Result<Self> {
        check_fields(kind, fields)?;
        let pattern = Regex::new(pattern).map_err(|e| Error::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            kind,
            container_text: container.map(str::to_string),
            container: container.map(parse_selector).transpose()?,
            pattern,
            fields: compile_fields(fields)?,
        })
    }

    fn captures(&self, text: &str, values: &mut BTreeMap<String, String>) -> bool {
        let Some(caps) = self.pattern.captures(text) else {
            return false;
        };
        for name in self.pattern.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                values.insert(name.to_string(), m.as_str().trim().to_string());
            }
        }
        true
    }
}

impl PageExtractor for TextPatternExtractor {
    fn extract(&self, page: &RenderedPage) -> Result<Vec<Record>> {
        let document = page.document();
        let mut records = Vec::new();

        let Some(container) = &self.container else {
            let text = lines(&document.root_element());
            for caps in self.pattern.captures_iter(&text) {
                let values = self
                    .pattern
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().trim().to_string()))
                    })
                    .collect();
                match Record::from_fields(self.kind, values) {
                    Ok(record) => records.push(record),
                    Err(e) => debug!("Skipping {} match: {e}", self.kind),
                }
            }
            return Ok(records);
        };

        let mut unreadable = Unreadable::default();
        for element in document.select(container) {
            let mut values: BTreeMap<String, String> = self
                .fields
                .iter()
                .filter_map(|(name, reader)| {
                    reader
                        .read(element, &page.url)
                        .map(|value| (name.clone(), value))
                })
                .collect();
            if !self.captures(&lines(&element), &mut values) {
                unreadable.skip(
                    self.kind,
                    Error::extraction(format!("text does not match /{}/", self.pattern)),
                );
                continue;
            }
            match Record::from_fields(self.kind, values) {
                Ok(record) => records.push(record),
                Err(e) => unreadable.skip(self.kind, e),
            }
        }

        unreadable.check(records, self.container_text.as_deref().unwrap_or_default())
    }

    fn kind(&self) -> RecordKind {
        self.kind
    }
}

/// Non-empty text nodes of an element, one per line
fn lines(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Fallback Extractor
// ============================================================================

/// Tries a primary strategy and falls back to a second one when the
/// primary fails or finds nothing
pub struct FallbackExtractor {
    primary: Box<dyn PageExtractor>,
    fallback: Box<dyn PageExtractor>,
}

impl FallbackExtractor {
    /// Combine two strategies producing the same record shape
    pub fn new(primary: Box<dyn PageExtractor>, fallback: Box<dyn PageExtractor>) -> Result<Self> {
        if primary.kind() != fallback.kind() {
            return Err(Error::config(format!(
                "fallback produces {} records, primary produces {}",
                fallback.kind(),
                primary.kind()
            )));
        }
        Ok(Self { primary, fallback })
    }
}

impl std::fmt::Debug for FallbackExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackExtractor")
            .field("kind", &self.primary.kind())
            .finish_non_exhaustive()
    }
}

impl PageExtractor for FallbackExtractor {
    fn extract(&self, page: &RenderedPage) -> Result<Vec<Record>> {
        match self.primary.extract(page) {
            Ok(records) if !records.is_empty() => Ok(records),
            Ok(_) => {
                debug!("Primary extraction found nothing on {}, trying fallback", page.url);
                self.fallback.extract(page)
            }
            Err(primary) => {
                debug!("Primary extraction failed on {}: {primary}, trying fallback", page.url);
                match self.fallback.extract(page) {
                    Ok(records) if !records.is_empty() => Ok(records),
                    // Nothing from either: the primary failure says more
                    _ => Err(primary),
                }
            }
        }
    }

    fn kind(&self) -> RecordKind {
        self.primary.kind()
    }
}

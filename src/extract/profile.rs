//! Profile field extraction
//!
//! A profile page is not a listing: it carries named fields of three
//! shapes (text, tag list, titled tag groups) read once per page.

use super::strategies::{element_text, FieldReader, FieldSpec};
use super::types::FieldValue;
use crate::browser::{parse_selector, RenderedPage};
use crate::error::Result;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A titled section on the profile page.
///
/// The section is the parent of the heading element whose text equals
/// `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    /// Selector of the section headings
    pub heading: String,
    /// Heading text to look for
    pub title: String,
}

/// Tag list field, optionally scoped to a titled section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFieldSpec {
    /// Selector of the items
    pub item: FieldSpec,
    /// Restrict the items to one section
    #[serde(default)]
    pub section: Option<SectionRef>,
}

/// Grouped field: every title element paired with the items next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFieldSpec {
    /// Root element holding the groups
    #[serde(default)]
    pub root: Option<String>,
    /// Selector of the group titles
    pub title: String,
    /// Selector of the items, looked up in the title's parent
    pub item: String,
}

/// Field definitions of a profile page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    /// Single text values
    #[serde(default)]
    pub text: BTreeMap<String, FieldSpec>,
    /// Tag lists
    #[serde(default)]
    pub list: BTreeMap<String, ListFieldSpec>,
    /// Titled tag groups
    #[serde(default)]
    pub group: BTreeMap<String, GroupFieldSpec>,
}

impl ProfileFields {
    /// Every field name, in output order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .text
            .keys()
            .chain(self.list.keys())
            .chain(self.group.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone)]
struct CompiledList {
    item: FieldReader,
    section: Option<(Selector, String)>,
}

#[derive(Debug, Clone)]
struct CompiledGroup {
    root: Option<Selector>,
    title: Selector,
    item: Selector,
}

/// Reads profile fields out of a rendered profile page
#[derive(Debug, Clone)]
pub struct ProfileExtractor {
    text: Vec<(String, FieldReader)>,
    list: Vec<(String, CompiledList)>,
    group: Vec<(String, CompiledGroup)>,
}

impl ProfileExtractor {
    /// Compile the field definitions
    pub fn new(fields: &ProfileFields) -> Result<Self> {
        let text = fields
            .text
            .iter()
            .map(|(name, spec)| Ok((name.clone(), spec.compile()?)))
            .collect::<Result<Vec<_>>>()?;

        let list = fields
            .list
            .iter()
            .map(|(name, spec)| {
                let section = match &spec.section {
                    Some(s) => Some((parse_selector(&s.heading)?, s.title.clone())),
                    None => None,
                };
                Ok((
                    name.clone(),
                    CompiledList {
                        item: spec.item.compile()?,
                        section,
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let group = fields
            .group
            .iter()
            .map(|(name, spec)| {
                Ok((
                    name.clone(),
                    CompiledGroup {
                        root: spec.root.as_deref().map(parse_selector).transpose()?,
                        title: parse_selector(&spec.title)?,
                        item: parse_selector(&spec.item)?,
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { text, list, group })
    }

    /// Extract every defined field.
    ///
    /// Fields that cannot be found come back empty rather than missing, so
    /// every profile row has the same columns.
    pub fn extract(&self, page: &RenderedPage) -> BTreeMap<String, FieldValue> {
        let document = page.document();
        let root = document.root_element();
        let mut fields = BTreeMap::new();

        for (name, reader) in &self.text {
            let value = reader.read(root, &page.url).unwrap_or_default();
            if value.is_empty() {
                debug!("Profile field '{name}' not found on {}", page.url);
            }
            fields.insert(name.clone(), FieldValue::Text(value));
        }

        for (name, list) in &self.list {
            let scope = match &list.section {
                Some((heading, title)) => find_section(root, heading, title),
                None => Some(root),
            };
            let items = scope
                .map(|scope| list.item.read_all(scope, &page.url))
                .unwrap_or_default();
            if items.is_empty() {
                debug!("Profile field '{name}' is empty on {}", page.url);
            }
            fields.insert(name.clone(), FieldValue::List(items));
        }

        for (name, group) in &self.group {
            fields.insert(name.clone(), FieldValue::Map(read_groups(root, group)));
        }

        fields
    }
}

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

fn find_section<'a>(
    root: ElementRef<'a>,
    heading: &Selector,
    title: &str,
) -> Option<ElementRef<'a>> {
    root.select(heading)
        .find(|el| element_text(el) == title)
        .and_then(parent_element)
}

fn read_groups(root: ElementRef<'_>, group: &CompiledGroup) -> BTreeMap<String, Vec<String>> {
    let scope = match &group.root {
        Some(selector) => match root.select(selector).next() {
            Some(scope) => scope,
            None => return BTreeMap::new(),
        },
        None => root,
    };

    let mut groups = BTreeMap::new();
    for title_el in scope.select(&group.title) {
        let title = element_text(&title_el);
        if title.is_empty() {
            continue;
        }
        let items = parent_element(title_el)
            .map(|parent| {
                parent
                    .select(&group.item)
                    .map(|el| element_text(&el))
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        groups.insert(title, items);
    }
    groups
}

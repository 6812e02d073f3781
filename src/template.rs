//! Template interpolation for site definitions
//!
//! Handles `{{ variable }}` interpolation in locators.
//! Supports scoped access like `{{ site.base_url }}` and `{{ target.seller }}`;
//! a bare name looks in the target first, then in the site.

use crate::error::{Error, Result};
use crate::partition::Target;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Site-wide values (`base_url`, `name`)
    pub site: BTreeMap<String, String>,
    /// Values of the current target
    pub target: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a site value
    #[must_use]
    pub fn with_site(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.site.insert(key.into(), value.into());
        self
    }

    /// Use the variables of `target`
    #[must_use]
    pub fn with_target(mut self, target: &Target) -> Self {
        self.target = target.vars.clone();
        self
    }

    /// Get a value by path (e.g., "site.base_url" or "seller")
    pub fn get(&self, path: &str) -> Option<&str> {
        let value = match path.split_once('.') {
            Some(("site", key)) => self.site.get(key),
            Some(("target", key)) => self.target.get(key),
            Some(_) => None,
            None => self.target.get(path).or_else(|| self.site.get(path)),
        };
        value.map(String::as_str)
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut errors = Vec::new();

    let result = TEMPLATE_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let var_path = &caps[1];
        match ctx.get(var_path) {
            Some(value) => value.to_string(),
            None => {
                errors.push(var_path.to_string());
                String::new()
            }
        }
    });

    if errors.is_empty() {
        Ok(result.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable paths from a template, in order of appearance
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext::new()
            .with_site("base_url", "https://market.test")
            .with_target(&Target::bound("seller", "alice"))
    }

    #[test]
    fn test_simple_substitution() {
        let result = render("{{ base_url }}/@{{ seller }}", &ctx()).unwrap();
        assert_eq!(result, "https://market.test/@alice");
    }

    #[test]
    fn test_scoped_access() {
        let result = render("{{site.base_url}}/@{{target.seller}}", &ctx()).unwrap();
        assert_eq!(result, "https://market.test/@alice");
    }

    #[test]
    fn test_target_shadows_site() {
        let ctx = ctx().with_target(&Target::bound("base_url", "x"));
        assert_eq!(ctx.get("base_url"), Some("x"));
        assert_eq!(ctx.get("site.base_url"), Some("https://market.test"));
    }

    #[test]
    fn test_undefined_variable() {
        let err = render("{{ base_url }}/category/{{ category_id }}", &ctx()).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { variable } if variable == "category_id"));
    }

    #[test]
    fn test_unknown_scope() {
        assert!(render("{{ config.key }}", &ctx()).is_err());
    }

    #[test]
    fn test_no_templates() {
        let result = render("https://market.test/", &ctx()).unwrap();
        assert_eq!(result, "https://market.test/");
        assert!(!has_templates("https://market.test/"));
    }

    #[test]
    fn test_extract_variables() {
        assert_eq!(
            extract_variables("{{ base_url }}/category/{{ category_id }}?page={{ base_url }}"),
            vec!["base_url", "category_id", "base_url"]
        );
    }

    #[test]
    fn test_non_ascii_values() {
        let ctx = ctx().with_target(&Target::bound("seller", "디자인공방"));
        assert_eq!(
            render("{{ base_url }}/@{{ seller }}", &ctx).unwrap(),
            "https://market.test/@디자인공방"
        );
    }
}

//! Built-in site definitions embedded in the binary
//!
//! Lets users pass `--site kmong` instead of a path to a YAML file.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in site YAML definitions
pub static BUILTIN_SITES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("kmong", include_str!("../sites/kmong.yaml"));
    m
});

/// Summary of a built-in site, for `list`
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub url: &'static str,
}

/// Get a built-in site by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_SITES.get(name).copied()
}

/// Check if a name refers to a built-in site
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_SITES.contains_key(name)
}

/// List all built-in site names, sorted
pub fn list_builtin() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTIN_SITES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Details about every built-in site
pub fn list_builtin_info() -> Vec<SiteInfo> {
    vec![SiteInfo {
        name: "kmong",
        description: "Freelance marketplace: category services, seller profiles, reviews",
        url: "https://kmong.com",
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sites_exist() {
        assert!(get_builtin("kmong").is_some());
        assert!(is_builtin("kmong"));
    }

    #[test]
    fn test_unknown_site() {
        assert!(get_builtin("unknown").is_none());
    }

    #[test]
    fn test_list_builtin_matches_info() {
        let names = list_builtin();
        let info: Vec<&str> = list_builtin_info().iter().map(|i| i.name).collect();
        assert_eq!(names, info);
    }
}

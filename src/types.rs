//! Common types used throughout market-harvest
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;


// ============================================================================
// Record Kind
// ============================================================================

/// The closed set of record shapes a listing can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A service card on a category listing (title, seller, link)
    #[default]
    Listing,
    /// A buyer review on a seller profile
    Review,
    /// A service offered by a seller, listed on the profile
    Service,
}

impl RecordKind {
    /// Lower-case name, as used in file names and YAML
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Listing => "listing",
            RecordKind::Review => "review",
            RecordKind::Service => "service",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// File format used by checkpoint sinks
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Comma separated, UTF-8 with byte-order mark
    #[default]
    Csv,
    /// One JSON object per line
    Jsonl,
    /// Parquet, all columns as strings
    Parquet,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Parquet => "parquet",
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Collapse runs of whitespace and trim, the way rendered text reads
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_serde() {
        let kind: RecordKind = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(kind, RecordKind::Review);

        let json = serde_json::to_string(&RecordKind::Listing).unwrap();
        assert_eq!(json, "\"listing\"");
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Csv.extension(), "csv");
        assert_eq!(OutputFormat::Jsonl.extension(), "jsonl");
        assert_eq!(OutputFormat::Parquet.extension(), "parquet");
        assert_eq!(OutputFormat::default(), OutputFormat::Csv);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello \n\t world  "), "hello world");
        assert_eq!(normalize_text(""), "");
    }
}

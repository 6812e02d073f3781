//! Tests for partition module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

// ============================================================================
// Chunking Tests
// ============================================================================

#[test_case(10, 3, vec![4, 3, 3] ; "uneven")]
#[test_case(9, 3, vec![3, 3, 3] ; "even")]
#[test_case(2, 5, vec![1, 1] ; "more workers than items")]
#[test_case(5, 0, vec![5] ; "zero workers")]
#[test_case(5, 1, vec![5] ; "single worker")]
fn test_chunk_sizes(items: usize, workers: usize, expected: Vec<usize>) {
    let values: Vec<usize> = (0..items).collect();
    let chunks = chunk_contiguous(&values, workers);

    assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), expected);
    assert_eq!(chunks.concat(), values);
}

#[test]
fn test_chunk_empty() {
    let chunks = chunk_contiguous::<u8>(&[], 4);
    assert!(chunks.is_empty());
}

// ============================================================================
// Target Tests
// ============================================================================

#[test]
fn test_target_bound() {
    let target = Target::bound("seller", "alice").with_var("tab", "reviews");
    assert_eq!(target.id, "alice");
    assert_eq!(target.get("seller"), Some("alice"));
    assert_eq!(target.get("tab"), Some("reviews"));
    assert_eq!(target.get("missing"), None);
}

#[test]
fn test_unique_in_order() {
    assert_eq!(
        unique_in_order(["b", "a", " b ", "", "c", "a"]),
        vec!["b", "a", "c"]
    );
}

// ============================================================================
// Source Tests
// ============================================================================

#[test]
fn test_list_source() {
    let source = ListSource::new(["661", "663", "661"], "category_id");
    let targets = source.targets().unwrap();

    assert_eq!(source.variable(), "category_id");
    assert_eq!(
        targets.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["661", "663"]
    );
    assert_eq!(targets[1].get("category_id"), Some("663"));
}

#[test]
fn test_csv_column_source_with_bom() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("services.csv");
    std::fs::write(
        &path,
        "\u{feff}seller,title,link\nbob,A,/1\nalice,B,/2\nbob,C,/3\n,D,/4\n",
    )
    .unwrap();

    let source = CsvColumnSource::new(&path, "seller", "seller");
    let targets = source.targets().unwrap();

    assert_eq!(
        targets.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["bob", "alice"]
    );
    assert_eq!(targets[0].get("seller"), Some("bob"));
}

#[test]
fn test_csv_column_source_missing_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("services.csv");
    std::fs::write(&path, "title,link\nA,/1\n").unwrap();

    let err = CsvColumnSource::new(&path, "seller", "seller")
        .targets()
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("title, link"));
}

#[test]
fn test_csv_column_source_missing_file() {
    let dir = tempdir().unwrap();
    let err = CsvColumnSource::new(dir.path().join("nope.csv"), "seller", "seller")
        .values()
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

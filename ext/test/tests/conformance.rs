//! Conformance tests that run YAML fixtures against docmatch
//!
//! Run with: cargo test -p docmatch-test --test conformance --features docmatch-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use docmatch_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// The spec/tests directory at the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");

    // Go up: ext/test -> ext -> workspace root
    let root = Path::new(manifest_dir)
        .parent()
        .and_then(Path::parent)
        .expect("Could not find workspace root");

    root.join("spec").join("tests")
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    assert!(dir.exists(), "Fixtures directory does not exist: {}", dir.display());

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());

    for path in paths {
        println!("Running fixture: {}", path.display());

        let yaml = fs::read_to_string(&path).expect("read yaml");

        // Parse potentially multiple fixtures (separated by ---)
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

#[test]
fn test_equality() {
    run_fixtures_in_dir(&fixtures_dir().join("01_equality"));
}

#[test]
fn test_operators() {
    run_fixtures_in_dir(&fixtures_dir().join("02_operators"));
}

#[test]
fn test_explanations() {
    run_fixtures_in_dir(&fixtures_dir().join("03_explanations"));
}

#[test]
fn test_errors() {
    run_fixtures_in_dir(&fixtures_dir().join("04_errors"));
}

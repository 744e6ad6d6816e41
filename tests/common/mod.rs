// Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use gtest_oracle::model::QualifiedName;

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn name(text: &str) -> QualifiedName {
    text.parse().expect("fixture names are well formed")
}

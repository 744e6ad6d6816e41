//! Record types shared by every stage of the verifier.
//!
//! The extractor produces [`ExpectedCase`]s, the ingestor produces
//! [`ActualCase`]s, and the matcher consumes both. Nothing here knows how the
//! records were produced.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// QUALIFIED NAMES
// ============================================================================

/// `Namespace::Suite::Test` identity key. The namespace part is optional and
/// may itself contain `::` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: Option<String>,
    pub suite: String,
    pub test: String,
}

impl QualifiedName {
    pub fn new(suite: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            namespace: None,
            suite: suite.into(),
            test: test.into(),
        }
    }
}

/// Why a string could not be read as a [`QualifiedName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("qualified name is empty")]
    Empty,
    #[error("'{0}' has no '::' separator between suite and test")]
    MissingSeparator(String),
    #[error("'{0}' has an empty component")]
    EmptyComponent(String),
    #[error("'{0}' contains whitespace")]
    Whitespace(String),
}

impl FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(NameError::Whitespace(s.to_string()));
        }
        let parts: Vec<&str> = s.split("::").collect();
        if parts.len() < 2 {
            return Err(NameError::MissingSeparator(s.to_string()));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(NameError::EmptyComponent(s.to_string()));
        }
        let test = parts[parts.len() - 1].to_string();
        let suite = parts[parts.len() - 2].to_string();
        let namespace = (parts.len() > 2).then(|| parts[..parts.len() - 2].join("::"));
        Ok(Self {
            namespace,
            suite,
            test,
        })
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}::", ns)?;
        }
        write!(f, "{}::{}", self.suite, self.test)
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// STATUSES
// ============================================================================

/// Terminal outcome declared by a `NODE:` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedStatus {
    Passed,
    Failed,
    Skipped,
}

impl ExpectedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedStatus::Passed => "passed",
            ExpectedStatus::Failed => "failed",
            ExpectedStatus::Skipped => "skipped",
        }
    }
}

impl FromStr for ExpectedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(ExpectedStatus::Passed),
            "failed" => Ok(ExpectedStatus::Failed),
            "skipped" => Ok(ExpectedStatus::Skipped),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome observed in a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualStatus {
    Passed,
    Failed,
    Skipped,
    /// The binary terminated abnormally before reporting this test.
    Crashed,
}

impl ActualStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActualStatus::Passed => "passed",
            ActualStatus::Failed => "failed",
            ActualStatus::Skipped => "skipped",
            ActualStatus::Crashed => "crashed",
        }
    }

    /// Exact enum correspondence; `crashed` never equals an expected status.
    pub fn agrees_with(&self, expected: ExpectedStatus) -> bool {
        matches!(
            (self, expected),
            (ActualStatus::Passed, ExpectedStatus::Passed)
                | (ActualStatus::Failed, ExpectedStatus::Failed)
                | (ActualStatus::Skipped, ExpectedStatus::Skipped)
        )
    }
}

impl fmt::Display for ActualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EXPECTED SIDE
// ============================================================================

/// A 1-based inclusive line range inside one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    #[serde(serialize_with = "serialize_path")]
    pub file: Arc<PathBuf>,
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceSpan {
    pub fn new(file: Arc<PathBuf>, start_line: usize, end_line: usize) -> Self {
        Self {
            file,
            start_line,
            end_line,
        }
    }

    pub fn line(file: Arc<PathBuf>, line: usize) -> Self {
        Self::new(file, line, line)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file.display(), self.start_line)
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.file.display(),
                self.start_line,
                self.end_line
            )
        }
    }
}

fn serialize_path<S: serde::Serializer>(path: &Arc<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&path.display())
}

/// Expected failure text captured from a `MESSAGE:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedMessage {
    /// Whitespace-normalized text (see [`crate::normalize`]).
    pub text: String,
    /// `false` when the block was tagged `NOLINE`.
    pub anchored: bool,
    /// Present when the block names a different owner than its enclosing case.
    pub owner_override: Option<QualifiedName>,
    /// Where the block starts in source.
    pub origin: SourceSpan,
}

/// Declared outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedCase {
    pub name: QualifiedName,
    pub status: ExpectedStatus,
    pub messages: Vec<ExpectedMessage>,
    /// The `NODE` … `NODEEND` extent.
    pub source_span: SourceSpan,
}

// ============================================================================
// ACTUAL SIDE
// ============================================================================

/// Where the run reported a failure as having happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FailureLocation {
    /// `<file>:<line>`
    Known { file: String, line: usize },
    /// googletest's `unknown file`, used for exceptions escaping the test body.
    Unknown,
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureLocation::Known { file, line } => write!(f, "{}:{}", file, line),
            FailureLocation::Unknown => f.write_str("unknown file"),
        }
    }
}

/// One failure reported by the run, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActualFailure {
    /// `None` when the run-output format carries no location information.
    pub location: Option<FailureLocation>,
    pub message: String,
}

impl ActualFailure {
    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }
}

/// Observed outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActualCase {
    pub name: QualifiedName,
    pub status: ActualStatus,
    pub failure_messages: Vec<ActualFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_part_name() {
        let name: QualifiedName = "TestOne::TestFailure".parse().unwrap();
        assert_eq!(name, QualifiedName::new("TestOne", "TestFailure"));
        assert_eq!(name.to_string(), "TestOne::TestFailure");
    }

    #[test]
    fn parses_nested_namespace() {
        let name: QualifiedName = "outer::inner::TestFixture::TestOk".parse().unwrap();
        assert_eq!(name.namespace.as_deref(), Some("outer::inner"));
        assert_eq!(name.suite, "TestFixture");
        assert_eq!(name.test, "TestOk");
        assert_eq!(name.to_string(), "outer::inner::TestFixture::TestOk");
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!("".parse::<QualifiedName>(), Err(NameError::Empty));
        assert!(matches!(
            "TestOne".parse::<QualifiedName>(),
            Err(NameError::MissingSeparator(_))
        ));
        assert!(matches!(
            "TestOne::".parse::<QualifiedName>(),
            Err(NameError::EmptyComponent(_))
        ));
        assert!(matches!(
            "Test One::X".parse::<QualifiedName>(),
            Err(NameError::Whitespace(_))
        ));
    }

    #[test]
    fn crashed_never_agrees() {
        for expected in [
            ExpectedStatus::Passed,
            ExpectedStatus::Failed,
            ExpectedStatus::Skipped,
        ] {
            assert!(!ActualStatus::Crashed.agrees_with(expected));
        }
        assert!(ActualStatus::Failed.agrees_with(ExpectedStatus::Failed));
        assert!(!ActualStatus::Passed.agrees_with(ExpectedStatus::Failed));
    }
}

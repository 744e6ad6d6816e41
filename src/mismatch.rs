//! Classified discrepancies between declared and observed outcomes.

use std::fmt;
use std::sync::Arc;

use miette::NamedSource;
use serde::Serialize;

use crate::model::{QualifiedName, SourceSpan};

/// Mismatch taxonomy. The declaration order is the order used for counts in
/// the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchKind {
    MalformedAnnotation,
    DuplicateExpected,
    StatusMismatch,
    MessageMismatch,
    MissingActual,
    UnexpectedActual,
}

impl MismatchKind {
    pub const ALL: [MismatchKind; 6] = [
        MismatchKind::MalformedAnnotation,
        MismatchKind::DuplicateExpected,
        MismatchKind::StatusMismatch,
        MismatchKind::MessageMismatch,
        MismatchKind::MissingActual,
        MismatchKind::UnexpectedActual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::MalformedAnnotation => "malformed-annotation",
            MismatchKind::DuplicateExpected => "duplicate-expected",
            MismatchKind::StatusMismatch => "status-mismatch",
            MismatchKind::MessageMismatch => "message-mismatch",
            MismatchKind::MissingActual => "missing-actual",
            MismatchKind::UnexpectedActual => "unexpected-actual",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range into an annotated source, kept so malformed input can be shown
/// as a labelled snippet.
#[derive(Debug, Clone)]
pub struct SourceExcerpt {
    pub source: Arc<NamedSource<String>>,
    pub offset: usize,
    pub len: usize,
}

/// One discrepancy, with enough context to find it without re-reading source.
#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub name: Option<QualifiedName>,
    pub location: Option<SourceSpan>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub detail: String,
    #[serde(skip)]
    pub excerpt: Option<SourceExcerpt>,
}

impl Mismatch {
    pub fn new(kind: MismatchKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            name: None,
            location: None,
            expected: None,
            actual: None,
            detail: detail.into(),
            excerpt: None,
        }
    }

    pub fn malformed(detail: impl Into<String>, location: SourceSpan) -> Self {
        Self::new(MismatchKind::MalformedAnnotation, detail).at(location)
    }

    pub fn named(mut self, name: QualifiedName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn at(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }

    pub fn values(mut self, expected: Option<String>, actual: Option<String>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }

    pub fn with_excerpt(mut self, excerpt: SourceExcerpt) -> Self {
        self.excerpt = Some(excerpt);
        self
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == MismatchKind::MalformedAnnotation
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        write!(f, ": {}", self.detail)
    }
}

// The excerpt is presentation-only; equality is over the reported fields.
impl PartialEq for Mismatch {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.location == other.location
            && self.expected == other.expected
            && self.actual == other.actual
            && self.detail == other.detail
    }
}

impl Eq for Mismatch {}

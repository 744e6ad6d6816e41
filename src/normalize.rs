//! Whitespace normalization for failure text.
//!
//! Annotated expectations are re-indented to sit inside a C++ comment, while
//! googletest prints the same text with its own indentation. Both sides are
//! therefore reduced to a canonical form before comparison: every run of
//! whitespace (including line breaks and blank lines) becomes a single space,
//! and leading/trailing whitespace is dropped.

use std::fmt;

use serde::Serialize;

/// Collapses all whitespace runs to one space and trims both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How an expected message is compared to the actual one, after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MessageMatch {
    /// Expected text must occur somewhere in the actual text.
    #[default]
    Substring,
    /// Expected text must equal the actual text.
    Strict,
}

impl MessageMatch {
    /// Compares already-normalized strings.
    pub fn accepts(&self, expected: &str, actual: &str) -> bool {
        match self {
            MessageMatch::Substring => actual.contains(expected),
            MessageMatch::Strict => actual == expected,
        }
    }
}

impl fmt::Display for MessageMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageMatch::Substring => f.write_str("substring"),
            MessageMatch::Strict => f.write_str("strict"),
        }
    }
}

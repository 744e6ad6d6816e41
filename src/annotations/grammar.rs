//! Single-line recognition of annotation markers.
//!
//! Markers live in C++ comments:
//!
//! ```text
//! TEST(TestOne, TestFailure) { // NODE:TestOne::TestFailure,failed
//!   ASSERT_FALSE(true); /* MESSAGE:
//!   Value of: true
//!   */
//! } // NODEEND
//! ```
//!
//! Nothing here keeps state across lines; see [`super::extractor`] for that.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ExpectedStatus, NameError, QualifiedName};

pub const NODE_TAG: &str = "NODE:";
pub const NODE_END_TAG: &str = "NODEEND";
pub const MESSAGE_TAG: &str = "MESSAGE:";
pub const NOLINE_TAG: &str = "NOLINE";
pub const COMMENT_CLOSE: &str = "*/";

static TEST_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(TEST|TEST_F|TEST_P|TYPED_TEST|TYPED_TEST_P)\s*\(")
        .expect("test macro pattern is valid")
});

/// A marker found in a line, with its byte offset and the byte offset just
/// past everything the marker consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found<T> {
    pub at: usize,
    pub end: usize,
    pub marker: T,
}

/// The three markers the extractor looks for outside of a message block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    /// `NODE:<header>`; the header is the raw, unparsed token.
    Node(&'a str),
    NodeEnd,
    /// `MESSAGE:<header>`; the header may be empty.
    Message(&'a str),
}

/// Why a `NODE:` header could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("NODE header '{0}' is missing the ',<status>' suffix")]
    MissingStatus(String),
    #[error("NODE header has an invalid test name: {0}")]
    BadName(#[from] NameError),
    #[error("unrecognized status '{0}' (expected passed, failed or skipped)")]
    UnknownStatus(String),
}

/// Parsed form of a `MESSAGE:` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageHeader {
    /// `MESSAGE:` with no tag.
    Plain,
    /// `MESSAGE:NOLINE`
    Unanchored,
    /// `MESSAGE:<Suite>::<Test>`
    Owner(QualifiedName),
}

/// Finds the earliest `NODE:`, `NODEEND` or `MESSAGE:` marker in `text`.
pub fn next_marker(text: &str) -> Option<Found<Marker<'_>>> {
    let candidates = [
        text.find(NODE_TAG).map(|at| (at, NODE_TAG)),
        text.find(NODE_END_TAG).map(|at| (at, NODE_END_TAG)),
        text.find(MESSAGE_TAG).map(|at| (at, MESSAGE_TAG)),
    ];
    let (at, tag) = candidates.into_iter().flatten().min_by_key(|(at, _)| *at)?;
    let after = at + tag.len();
    match tag {
        NODE_END_TAG => Some(Found {
            at,
            end: after,
            marker: Marker::NodeEnd,
        }),
        _ => {
            let header = header_token(&text[after..]);
            let marker = if tag == NODE_TAG {
                Marker::Node(header)
            } else {
                Marker::Message(header)
            };
            Some(Found {
                at,
                end: after + header.len(),
                marker,
            })
        }
    }
}

/// The token glued to a tag: everything up to whitespace or a comment close.
fn header_token(text: &str) -> &str {
    let stop = text
        .char_indices()
        .find(|(i, c)| c.is_whitespace() || text[*i..].starts_with(COMMENT_CLOSE))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..stop]
}

/// Parses `<name>,<status>`.
pub fn parse_node_header(header: &str) -> Result<(QualifiedName, ExpectedStatus), HeaderError> {
    let (name, status) = header
        .rsplit_once(',')
        .ok_or_else(|| HeaderError::MissingStatus(header.to_string()))?;
    let name: QualifiedName = name.parse()?;
    let status = status
        .parse::<ExpectedStatus>()
        .map_err(HeaderError::UnknownStatus)?;
    Ok((name, status))
}

/// Parses the token following `MESSAGE:`.
pub fn parse_message_header(header: &str) -> Result<MessageHeader, String> {
    if header.is_empty() {
        return Ok(MessageHeader::Plain);
    }
    if header == NOLINE_TAG {
        return Ok(MessageHeader::Unanchored);
    }
    if !header.contains("::") {
        return Err(format!(
            "unrecognized MESSAGE tag '{}' (expected NOLINE or a qualified test name)",
            header
        ));
    }
    header
        .parse::<QualifiedName>()
        .map(MessageHeader::Owner)
        .map_err(|e| format!("invalid MESSAGE owner: {}", e))
}

/// True when `code` contains a googletest test-definition macro call.
pub fn invokes_test_macro(code: &str) -> bool {
    TEST_MACRO.is_match(code)
}

/// Position of the comment terminator in `text`.
pub fn comment_close(text: &str) -> Option<usize> {
    text.find(COMMENT_CLOSE)
}

/// True when the end of `before` sits inside a `/*` comment opened on the
/// same line: its last `/*` is not preceded by `//` and not closed again.
pub fn opens_block_comment(before: &str) -> bool {
    let Some(open) = before.rfind("/*") else {
        return false;
    };
    !before[..open].contains("//") && !before[open..].contains(COMMENT_CLOSE)
}

/// The code of a line: everything before its first `//` or `/*`.
pub fn code_part(line: &str) -> &str {
    let cut = [line.find("//"), line.find("/*")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..cut]
}

/// The part of `code` after its last `;`, `{` or `}`: the statement still
/// being written.
pub fn statement_tail(code: &str) -> &str {
    match code.rfind([';', '{', '}']) {
        Some(at) => &code[at + 1..],
        None => code,
    }
}

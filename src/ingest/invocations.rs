//! Lists of tests the collaborator was asked to run.
//!
//! Two layouts are accepted, and may even be mixed:
//!
//! ```text
//! TestOne.              <- googletest --gtest_list_tests
//!   TestFailure
//!   TestEQFailure  # GetParam() = 1
//! TestFixture::TestOk   <- one qualified name per line
//! ```

use crate::model::QualifiedName;

/// Parses an invocation list, returning names in order plus any lines that
/// could not be understood.
pub fn parse(text: &str) -> (Vec<QualifiedName>, Vec<String>) {
    let mut names = Vec::new();
    let mut warnings = Vec::new();
    let mut suite: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or("").trim_end();
        if content.trim().is_empty() {
            continue;
        }
        let indented = content.starts_with([' ', '\t']);
        let token = content.trim();

        if indented {
            match &suite {
                Some(suite) => names.push(QualifiedName::new(suite.clone(), token)),
                None => warnings.push(format!("line {}: test '{}' listed before any suite", idx + 1, token)),
            }
            continue;
        }
        if let Some(stripped) = token.strip_suffix('.') {
            suite = Some(stripped.to_string());
            continue;
        }
        suite = None;
        match token.parse::<QualifiedName>() {
            Ok(name) => names.push(name),
            Err(e) => warnings.push(format!("line {}: {}", idx + 1, e)),
        }
    }
    (names, warnings)
}

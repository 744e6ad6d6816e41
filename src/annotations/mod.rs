//! # Annotation Extraction
//!
//! Turns annotated test sources into the expected-outcome set.
//!
//! Extraction is split in two phases:
//! 1. **Per file** ([`extractor`]): a line state machine that knows nothing
//!    about other files. Files are independent and may be processed in
//!    parallel.
//! 2. **Merge** ([`merge`]): concatenates per-file results in discovery order,
//!    reports duplicate names, and resolves `MESSAGE:<Owner>` redirects, which
//!    may point into a different file.

use std::collections::HashMap;

use tracing::debug;

use crate::mismatch::{Mismatch, MismatchKind};
use crate::model::{ExpectedCase, ExpectedStatus, QualifiedName};

pub mod extractor;
pub mod grammar;

pub use extractor::{extract_file, FileExtraction, Redirect};

/// The merged expected set plus every annotation problem found on the way.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Number of source files merged.
    pub files: usize,
    /// Unique by name, in source order.
    pub cases: Vec<ExpectedCase>,
    /// `malformed-annotation` and `duplicate-expected` entries, in the order
    /// they were found.
    pub problems: Vec<Mismatch>,
}

impl Extraction {
    pub fn has_malformed(&self) -> bool {
        self.problems.iter().any(Mismatch::is_malformed)
    }

    pub fn find(&self, name: &QualifiedName) -> Option<&ExpectedCase> {
        self.cases.iter().find(|c| &c.name == name)
    }
}

/// Merges per-file extractions given in discovery order.
pub fn merge(files: Vec<FileExtraction>) -> Extraction {
    let mut merged = Extraction {
        files: files.len(),
        ..Extraction::default()
    };
    let mut index: HashMap<QualifiedName, usize> = HashMap::new();
    let mut redirects: Vec<Redirect> = Vec::new();

    for file in files {
        merged.problems.extend(file.malformed);
        for case in file.cases {
            if let Some(&first) = index.get(&case.name) {
                let original = &merged.cases[first].source_span;
                merged.problems.push(
                    Mismatch::new(
                        MismatchKind::DuplicateExpected,
                        format!("'{}' is already declared at {}", case.name, original),
                    )
                    .named(case.name.clone())
                    .at(case.source_span.clone()),
                );
                continue;
            }
            index.insert(case.name.clone(), merged.cases.len());
            merged.cases.push(case);
        }
        redirects.extend(file.redirects);
    }

    resolve_redirects(&mut merged, &index, redirects);
    debug!(
        cases = merged.cases.len(),
        problems = merged.problems.len(),
        "merged annotations"
    );
    merged
}

/// Attaches redirected messages to their owners.
///
/// Redirects from the owner's own file are spliced in by source line; those
/// from other files are appended afterwards, in discovery order.
fn resolve_redirects(
    merged: &mut Extraction,
    index: &HashMap<QualifiedName, usize>,
    redirects: Vec<Redirect>,
) {
    let mut foreign = Vec::new();
    for redirect in redirects {
        let Some(&slot) = index.get(&redirect.owner) else {
            merged.problems.push(
                Mismatch::malformed(
                    format!(
                        "MESSAGE attributed to '{}', which no NODE declares",
                        redirect.owner
                    ),
                    redirect.message.origin.clone(),
                )
                .named(redirect.owner.clone())
                .with_excerpt(redirect.excerpt),
            );
            continue;
        };
        let owner = &mut merged.cases[slot];
        if owner.status != ExpectedStatus::Failed {
            merged.problems.push(
                Mismatch::malformed(
                    format!(
                        "MESSAGE attributed to '{}', which is declared {}",
                        owner.name, owner.status
                    ),
                    redirect.message.origin.clone(),
                )
                .named(owner.name.clone())
                .with_excerpt(redirect.excerpt),
            );
            continue;
        }
        if owner.source_span.file != redirect.message.origin.file {
            foreign.push((slot, redirect));
            continue;
        }
        let line = redirect.message.origin.start_line;
        let at = owner
            .messages
            .iter()
            .position(|m| m.origin.file == redirect.message.origin.file && m.origin.start_line > line)
            .unwrap_or(owner.messages.len());
        owner.messages.insert(at, redirect.message);
    }
    for (slot, redirect) in foreign {
        merged.cases[slot].messages.push(redirect.message);
    }
}

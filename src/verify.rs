//! End-to-end verification: extract, ingest, match.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::info;

use crate::annotations::Extraction;
use crate::discovery::extract_tree;
use crate::ingest::{ingest_files, Ingestion, RunFormat};
use crate::matcher::match_outcomes;
use crate::mismatch::Mismatch;
use crate::normalize::MessageMatch;
use crate::report::{ExitStatus, Totals};
use crate::OracleError;

/// Resolved options for one verification run.
#[derive(Debug, Clone, Default)]
pub struct VerifyConfig {
    /// Annotated source file or directory.
    pub source: PathBuf,
    /// Output written by the test run.
    pub run_output: PathBuf,
    /// Tests the run was asked to execute, for `crashed` inference.
    pub invocations: Option<PathBuf>,
    pub format: RunFormat,
    pub message_match: MessageMatch,
}

/// Everything the reporter needs.
#[derive(Debug, Clone, Default)]
pub struct Verification {
    /// Annotation problems first, then matcher output.
    pub mismatches: Vec<Mismatch>,
    pub totals: Totals,
    /// Ingestion warnings (unreadable records, duplicate run entries, ...).
    pub warnings: Vec<String>,
}

impl Verification {
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from_mismatches(&self.mismatches)
    }
}

/// Compares an extracted expected set with an ingested actual set.
///
/// Annotation problems (malformed and duplicate declarations) keep their
/// extraction order and precede the matcher output. Matching runs even when annotations are malformed so that a single pass
/// shows every problem; the exit status still reflects the malformed input.
pub fn check(extraction: Extraction, ingestion: Ingestion, mode: MessageMatch) -> Verification {
    let mut mismatches = extraction.problems;
    mismatches.extend(match_outcomes(&extraction.cases, &ingestion.cases, mode));

    let matched = {
        let flagged: HashSet<_> = mismatches.iter().filter_map(|m| m.name.as_ref()).collect();
        extraction
            .cases
            .iter()
            .filter(|c| !flagged.contains(&c.name))
            .count()
    };

    Verification {
        totals: Totals {
            files: extraction.files,
            expected: extraction.cases.len(),
            actual: ingestion.cases.len(),
            matched,
        },
        mismatches,
        warnings: ingestion.warnings,
    }
}

/// Reads both sides from disk and compares them.
pub fn verify(config: &VerifyConfig) -> Result<Verification, OracleError> {
    let extraction = extract_tree(&config.source)?;
    let ingestion = ingest_files(&config.run_output, config.format, config.invocations.as_deref())?;
    info!(
        expected = extraction.cases.len(),
        actual = ingestion.cases.len(),
        mode = %config.message_match,
        "matching outcomes"
    );
    let verification = check(extraction, ingestion, config.message_match);
    info!(mismatches = verification.mismatches.len(), "verification complete");
    Ok(verification)
}

//! # Result Ingestion
//!
//! Reads what the external test run produced and turns it into the actual
//! outcome set. Content problems (truncated output, unreadable records,
//! duplicate names) are collected as warnings; only I/O failures are errors.
//!
//! When an invocation list is supplied, tests that were asked for but never
//! reported are recorded as `crashed`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{ActualCase, ActualStatus, QualifiedName};
use crate::{err_io, OracleError};

pub mod gtest;
pub mod invocations;
pub mod records;

/// Serialization of the run output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RunFormat {
    /// Decide from the content.
    #[default]
    Auto,
    /// googletest `--gtest_output=json` report.
    GtestJson,
    /// JSON array of `{name, status, failures}` records.
    Records,
    /// One record per line.
    JsonLines,
}

impl fmt::Display for RunFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunFormat::Auto => "auto",
            RunFormat::GtestJson => "gtest-json",
            RunFormat::Records => "records",
            RunFormat::JsonLines => "json-lines",
        })
    }
}

/// The actual outcome set and what went wrong while reading it.
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    /// Unique by name, in run-output order, followed by inferred crashes.
    pub cases: Vec<ActualCase>,
    pub warnings: Vec<String>,
}

impl Ingestion {
    pub fn find(&self, name: &QualifiedName) -> Option<&ActualCase> {
        self.cases.iter().find(|c| &c.name == name)
    }
}

/// Picks a concrete format from the first non-blank character.
pub fn detect_format(text: &str) -> RunFormat {
    match text.trim_start().chars().next() {
        Some('[') => RunFormat::Records,
        Some('{') => {
            // a truncated report still names its top-level key
            let is_report = match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) => value.get("testsuites").is_some(),
                Err(_) => text.contains("\"testsuites\""),
            };
            if is_report {
                RunFormat::GtestJson
            } else {
                RunFormat::JsonLines
            }
        }
        _ => RunFormat::JsonLines,
    }
}

/// Parses run output text.
pub fn ingest_str(text: &str, format: RunFormat) -> Ingestion {
    let format = match format {
        RunFormat::Auto => detect_format(text),
        other => other,
    };
    debug!(%format, bytes = text.len(), "ingesting run output");

    let (cases, mut warnings) = match format {
        RunFormat::GtestJson => match serde_json::from_str::<gtest::Report>(text) {
            Ok(report) => (gtest::cases(report), Vec::new()),
            Err(e) => (Vec::new(), vec![format!("unreadable googletest report: {}", e)]),
        },
        RunFormat::Records => match records::parse_array(text) {
            Ok(cases) => (cases, Vec::new()),
            Err(e) => (Vec::new(), vec![format!("unreadable record array: {}", e)]),
        },
        RunFormat::JsonLines | RunFormat::Auto => records::parse_lines(text),
    };

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(cases.len());
    for case in cases {
        if seen.insert(case.name.clone()) {
            unique.push(case);
        } else {
            warnings.push(format!("'{}' reported more than once; keeping the first record", case.name));
        }
    }

    Ingestion {
        cases: unique,
        warnings,
    }
}

/// Adds a `crashed` case for every invoked name missing from the run output.
pub fn infer_crashes(ingestion: &mut Ingestion, invoked: &[QualifiedName]) {
    let reported: HashSet<QualifiedName> = ingestion.cases.iter().map(|c| c.name.clone()).collect();
    let mut added = HashSet::new();
    for name in invoked {
        if reported.contains(name) || !added.insert(name.clone()) {
            continue;
        }
        debug!(case = %name, "invoked but not reported; recording as crashed");
        ingestion.cases.push(ActualCase {
            name: name.clone(),
            status: ActualStatus::Crashed,
            failure_messages: Vec::new(),
        });
    }
}

/// Reads the run output and, optionally, the invocation list from disk.
pub fn ingest_files(
    run_output: &Path,
    format: RunFormat,
    invocation_list: Option<&Path>,
) -> Result<Ingestion, OracleError> {
    let text = std::fs::read_to_string(run_output).map_err(|e| {
        err_io!(run_output, e).with_help("pass the file written by the test binary, e.g. via --gtest_output=json:<file>")
    })?;
    let mut ingestion = ingest_str(&text, format);

    if let Some(list) = invocation_list {
        let text = std::fs::read_to_string(list).map_err(|e| err_io!(list, e))?;
        let (names, warnings) = invocations::parse(&text);
        ingestion
            .warnings
            .extend(warnings.into_iter().map(|w| format!("{}: {}", list.display(), w)));
        infer_crashes(&mut ingestion, &names);
    }

    for warning in &ingestion.warnings {
        warn!("{}", warning);
    }
    Ok(ingestion)
}

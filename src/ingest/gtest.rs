//! googletest JSON reports (`--gtest_output=json:<file>`).

use serde::Deserialize;

use crate::model::{ActualCase, ActualFailure, ActualStatus, FailureLocation, QualifiedName};

#[derive(Debug, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub testsuites: Vec<Suite>,
}

#[derive(Debug, Deserialize)]
pub struct Suite {
    pub name: String,
    #[serde(default)]
    pub testsuite: Vec<TestInfo>,
}

#[derive(Debug, Deserialize)]
pub struct TestInfo {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
pub struct Failure {
    pub failure: String,
}

impl TestInfo {
    fn status(&self) -> ActualStatus {
        if !self.failures.is_empty() {
            return ActualStatus::Failed;
        }
        let skipped_result = matches!(self.result.as_deref(), Some("SKIPPED") | Some("SUPPRESSED"));
        let not_run = self.status.as_deref() == Some("NOTRUN");
        if skipped_result || not_run {
            ActualStatus::Skipped
        } else {
            ActualStatus::Passed
        }
    }
}

/// Flattens a report into cases, keeping suite and test order.
pub fn cases(report: Report) -> Vec<ActualCase> {
    report
        .testsuites
        .into_iter()
        .flat_map(|suite| {
            let suite_name = suite.name;
            suite.testsuite.into_iter().map(move |test| {
                let status = test.status();
                ActualCase {
                    name: QualifiedName::new(suite_name.clone(), test.name),
                    status,
                    failure_messages: test.failures.iter().map(|f| split_failure(&f.failure)).collect(),
                }
            })
        })
        .collect()
}

/// Splits googletest's `"<file>:<line>\n<message>"` failure text.
///
/// The first line is only treated as a location when it is `unknown file` or
/// ends in `:<digits>`; otherwise the whole text is the message.
pub fn split_failure(raw: &str) -> ActualFailure {
    let (head, body) = raw.split_once('\n').unwrap_or((raw, ""));
    let head = head.trim_end();
    if head == "unknown file" {
        return ActualFailure {
            location: Some(FailureLocation::Unknown),
            message: body.to_string(),
        };
    }
    if let Some((file, line)) = head.rsplit_once(':') {
        if let Ok(line) = line.parse::<usize>() {
            if !file.is_empty() {
                return ActualFailure {
                    location: Some(FailureLocation::Known {
                        file: file.to_string(),
                        line,
                    }),
                    message: body.to_string(),
                };
            }
        }
    }
    ActualFailure::unlocated(raw)
}

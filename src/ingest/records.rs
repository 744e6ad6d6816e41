//! Flat per-test records, either as a JSON array or one JSON object per line.
//!
//! ```json
//! {"name": "TestOne::TestFailure", "status": "failed", "failures": ["Value of: true ..."]}
//! ```

use serde::Deserialize;

use crate::model::{ActualCase, ActualFailure, ActualStatus, QualifiedName};

#[derive(Debug, Deserialize)]
pub struct Record {
    pub name: QualifiedName,
    pub status: ActualStatus,
    #[serde(default)]
    pub failures: Vec<String>,
}

impl From<Record> for ActualCase {
    fn from(record: Record) -> Self {
        ActualCase {
            name: record.name,
            status: record.status,
            failure_messages: record.failures.into_iter().map(ActualFailure::unlocated).collect(),
        }
    }
}

/// Parses a JSON array of records.
pub fn parse_array(text: &str) -> Result<Vec<ActualCase>, serde_json::Error> {
    let records: Vec<Record> = serde_json::from_str(text)?;
    Ok(records.into_iter().map(ActualCase::from).collect())
}

/// Parses JSON Lines. Blank lines are skipped; a bad line is reported with its
/// 1-based number and does not stop the remaining lines from being read.
pub fn parse_lines(text: &str) -> (Vec<ActualCase>, Vec<String>) {
    let mut cases = Vec::new();
    let mut warnings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(line) {
            Ok(record) => cases.push(record.into()),
            Err(e) => warnings.push(format!("line {}: unreadable record ({})", idx + 1, e)),
        }
    }
    (cases, warnings)
}

// End-to-end verification over the fixture tree and recorded runs.
mod common;

use common::{fixture, name};
use gtest_oracle::ingest::RunFormat;
use gtest_oracle::model::ActualStatus;
use gtest_oracle::report::ExitStatus;
use gtest_oracle::{verify, MessageMatch, MismatchKind, VerifyConfig};

fn config(source: &str, run: &str) -> VerifyConfig {
    VerifyConfig {
        source: fixture(source),
        run_output: fixture(run),
        ..VerifyConfig::default()
    }
}

#[test]
fn agreeing_run_has_no_mismatches() {
    let verification = verify(&config("cpp", "runs/agreeing.json")).unwrap();
    assert!(verification.mismatches.is_empty(), "{:#?}", verification.mismatches);
    assert!(verification.warnings.is_empty());
    assert_eq!(verification.totals.expected, 14);
    assert_eq!(verification.totals.actual, 14);
    assert_eq!(verification.totals.matched, 14);
    assert_eq!(verification.exit_status(), ExitStatus::Agreement);
}

#[test]
fn strict_mode_agrees_when_annotations_are_complete() {
    let strict = VerifyConfig {
        message_match: MessageMatch::Strict,
        ..config("cpp", "runs/agreeing.json")
    };
    let verification = verify(&strict).unwrap();
    assert!(verification.mismatches.is_empty(), "{:#?}", verification.mismatches);
}

#[test]
fn disagreeing_run_is_classified_in_source_order() {
    let verification = verify(&config("cpp", "runs/disagreeing.json")).unwrap();
    let summary: Vec<_> = verification
        .mismatches
        .iter()
        .map(|m| (m.kind, m.name.as_ref().map(ToString::to_string).unwrap_or_default()))
        .collect();
    assert_eq!(
        summary,
        [
            (MismatchKind::StatusMismatch, "TestThree::TestFailure".to_string()),
            (MismatchKind::MessageMismatch, "TestOne::TestEQFailure".to_string()),
            (MismatchKind::MessageMismatch, "TestOne::TestExceptionFailure".to_string()),
            (MismatchKind::MissingActual, "TestOneMore::TestMultipleNamespaces".to_string()),
            (MismatchKind::UnexpectedActual, "Unexpected::Extra".to_string()),
        ]
    );

    let eq = &verification.mismatches[1];
    assert_eq!(
        eq.expected.as_deref(),
        Some("Expected equality of these values: a Which is: 0 b Which is: 1")
    );
    assert_eq!(
        eq.actual.as_deref(),
        Some("Expected equality of these values: a Which is: 0 b Which is: 2")
    );
    assert!(verification.mismatches[2].detail.contains("NOLINE"));
    assert_eq!(verification.exit_status(), ExitStatus::Mismatches);
    assert_eq!(verification.totals.matched, 10);
}

#[test]
fn invoked_tests_missing_from_a_truncated_run_are_crashed() {
    let with_list = VerifyConfig {
        invocations: Some(fixture("runs/invocations.txt")),
        format: RunFormat::JsonLines,
        ..config("cpp/subdirectory", "runs/crashed.jsonl")
    };
    let verification = verify(&with_list).unwrap();
    assert_eq!(verification.warnings.len(), 1, "{:?}", verification.warnings);
    assert_eq!(verification.mismatches.len(), 1);
    let crashed = &verification.mismatches[0];
    assert_eq!(crashed.kind, MismatchKind::StatusMismatch);
    assert_eq!(crashed.name, Some(name("TestThree::TestFailure")));
    assert_eq!(crashed.actual.as_deref(), Some(ActualStatus::Crashed.as_str()));

    // without the list the same test is simply missing
    let without_list = config("cpp/subdirectory", "runs/crashed.jsonl");
    let verification = verify(&without_list).unwrap();
    assert_eq!(verification.mismatches.len(), 1);
    assert_eq!(verification.mismatches[0].kind, MismatchKind::MissingActual);
}

#[test]
fn unreadable_run_output_is_an_error() {
    let err = verify(&config("cpp", "runs/does-not-exist.json")).unwrap_err();
    assert!(err.path().is_some());
}

#[test]
fn verification_is_deterministic() {
    let first = verify(&config("cpp", "runs/disagreeing.json")).unwrap();
    let second = verify(&config("cpp", "runs/disagreeing.json")).unwrap();
    assert_eq!(first.mismatches, second.mismatches);
}

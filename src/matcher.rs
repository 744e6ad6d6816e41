//! # Outcome Matching
//!
//! A pure function from (expected set, actual set) to an ordered list of
//! mismatches. An empty list means full agreement.
//!
//! Ordering is fixed so identical inputs give byte-identical reports:
//! mismatches follow the expected cases in source order, then
//! `unexpected-actual` entries follow the run output order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::mismatch::{Mismatch, MismatchKind};
use crate::model::{
    ActualCase, ActualFailure, ExpectedCase, ExpectedMessage, ExpectedStatus, FailureLocation,
    QualifiedName,
};
use crate::normalize::{normalize, MessageMatch};

/// Compares both sides and returns every disagreement.
pub fn match_outcomes(
    expected: &[ExpectedCase],
    actual: &[ActualCase],
    mode: MessageMatch,
) -> Vec<Mismatch> {
    let mut by_name: HashMap<&QualifiedName, &ActualCase> = HashMap::with_capacity(actual.len());
    for case in actual {
        by_name.entry(&case.name).or_insert(case);
    }

    let mut mismatches = Vec::new();
    for case in expected {
        match by_name.get(&case.name) {
            Some(actual) => compare_case(case, actual, mode, &mut mismatches),
            None => mismatches.push(
                Mismatch::new(
                    MismatchKind::MissingActual,
                    "declared in source but absent from the run output",
                )
                .named(case.name.clone())
                .at(case.source_span.clone())
                .values(Some(case.status.to_string()), None),
            ),
        }
    }

    let declared: HashSet<&QualifiedName> = expected.iter().map(|c| &c.name).collect();
    let mut reported = HashSet::new();
    for case in actual {
        if declared.contains(&case.name) || !reported.insert(&case.name) {
            continue;
        }
        mismatches.push(
            Mismatch::new(
                MismatchKind::UnexpectedActual,
                "reported by the run but not declared by any NODE annotation",
            )
            .named(case.name.clone())
            .values(None, Some(case.status.to_string())),
        );
    }

    debug!(
        expected = expected.len(),
        actual = actual.len(),
        mismatches = mismatches.len(),
        "matched outcomes"
    );
    mismatches
}

fn compare_case(
    expected: &ExpectedCase,
    actual: &ActualCase,
    mode: MessageMatch,
    out: &mut Vec<Mismatch>,
) {
    if !actual.status.agrees_with(expected.status) {
        out.push(
            Mismatch::new(
                MismatchKind::StatusMismatch,
                format!("expected {}, run reported {}", expected.status, actual.status),
            )
            .named(expected.name.clone())
            .at(expected.source_span.clone())
            .values(
                Some(expected.status.to_string()),
                Some(actual.status.to_string()),
            ),
        );
        return;
    }
    if expected.status != ExpectedStatus::Failed {
        return;
    }

    for (index, (message, failure)) in expected
        .messages
        .iter()
        .zip(&actual.failure_messages)
        .enumerate()
    {
        if let Some(detail) = compare_message(message, failure, mode) {
            out.push(
                Mismatch::new(
                    MismatchKind::MessageMismatch,
                    format!("failure #{}: {}", index + 1, detail),
                )
                .named(expected.name.clone())
                .at(message.origin.clone())
                .values(Some(message.text.clone()), Some(normalize(&failure.message))),
            );
        }
    }

    let (want, got) = (expected.messages.len(), actual.failure_messages.len());
    if want != got {
        out.push(
            Mismatch::new(
                MismatchKind::MessageMismatch,
                format!("expected {} failure message(s), run reported {}", want, got),
            )
            .named(expected.name.clone())
            .at(expected.source_span.clone())
            .values(Some(want.to_string()), Some(got.to_string())),
        );
    }
}

/// Returns why `failure` does not satisfy `message`, if it does not.
fn compare_message(
    message: &ExpectedMessage,
    failure: &ActualFailure,
    mode: MessageMatch,
) -> Option<String> {
    let actual_text = normalize(&failure.message);
    if !mode.accepts(&message.text, &actual_text) {
        let relation = match mode {
            MessageMatch::Substring => "not found in",
            MessageMatch::Strict => "differs from",
        };
        return Some(format!("expected text {} the reported message", relation));
    }
    match (&failure.location, message.anchored) {
        (Some(location @ FailureLocation::Known { .. }), false) => Some(format!(
            "expected an unanchored (NOLINE) failure, run reported it at {}",
            location
        )),
        (Some(FailureLocation::Unknown), true) => {
            Some("expected a failure tied to a source line, run reported 'unknown file'".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::model::{ActualStatus, SourceSpan};

    fn name(s: &str) -> QualifiedName {
        s.parse().unwrap()
    }

    fn span(line: usize) -> SourceSpan {
        SourceSpan::new(Arc::new(PathBuf::from("test_one.cpp")), line, line + 3)
    }

    fn expected(n: &str, status: ExpectedStatus, messages: &[&str]) -> ExpectedCase {
        ExpectedCase {
            name: name(n),
            status,
            messages: messages
                .iter()
                .map(|text| ExpectedMessage {
                    text: normalize(text),
                    anchored: true,
                    owner_override: None,
                    origin: SourceSpan::line(Arc::new(PathBuf::from("test_one.cpp")), 2),
                })
                .collect(),
            source_span: span(1),
        }
    }

    fn actual(n: &str, status: ActualStatus, failures: &[&str]) -> ActualCase {
        ActualCase {
            name: name(n),
            status,
            failure_messages: failures.iter().map(|f| ActualFailure::unlocated(*f)).collect(),
        }
    }

    #[test]
    fn reindented_equality_message_agrees() {
        let exp = [expected(
            "TestOne::TestEQFailure",
            ExpectedStatus::Failed,
            &["Expected equality of these values: a Which is: 0 b Which is: 1"],
        )];
        let act = [actual(
            "TestOne::TestEQFailure",
            ActualStatus::Failed,
            &["Expected equality of these values:\n  a\n    Which is: 0\n  b\n    Which is: 1"],
        )];
        assert!(match_outcomes(&exp, &act, MessageMatch::Substring).is_empty());
        assert!(match_outcomes(&exp, &act, MessageMatch::Strict).is_empty());
    }

    #[test]
    fn status_disagreement_is_one_status_mismatch() {
        let exp = [expected("TestThree::TestFailure", ExpectedStatus::Failed, &[])];
        let act = [actual("TestThree::TestFailure", ActualStatus::Passed, &[])];
        let out = match_outcomes(&exp, &act, MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MismatchKind::StatusMismatch);
        assert_eq!(out[0].expected.as_deref(), Some("failed"));
        assert_eq!(out[0].actual.as_deref(), Some("passed"));
    }

    #[test]
    fn crashed_is_not_coerced_to_failed() {
        let exp = [expected("A::B", ExpectedStatus::Failed, &[])];
        let act = [actual("A::B", ActualStatus::Crashed, &[])];
        let out = match_outcomes(&exp, &act, MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MismatchKind::StatusMismatch);
    }

    #[test]
    fn absent_actual_is_missing() {
        let exp = [expected("TestOneMore::TestMultipleNamespaces", ExpectedStatus::Passed, &[])];
        let out = match_outcomes(&exp, &[], MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MismatchKind::MissingActual);
        assert_eq!(out[0].name, Some(name("TestOneMore::TestMultipleNamespaces")));
    }

    #[test]
    fn undeclared_actual_is_unexpected() {
        let act = [actual("Extra::Case", ActualStatus::Passed, &[])];
        let out = match_outcomes(&[], &act, MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MismatchKind::UnexpectedActual);
        assert!(out[0].location.is_none());
    }

    #[test]
    fn messages_compare_positionally() {
        let exp = [expected(
            "TestOne::TestMultipleFailures",
            ExpectedStatus::Failed,
            &[
                "Value of: false Actual: false Expected: true",
                "Value of: true Actual: true Expected: false",
            ],
        )];
        let swapped = [actual(
            "TestOne::TestMultipleFailures",
            ActualStatus::Failed,
            &[
                "Value of: true\n  Actual: true\nExpected: false\n",
                "Value of: false\n  Actual: false\nExpected: true\n",
            ],
        )];
        let out = match_outcomes(&exp, &swapped, MessageMatch::Substring);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.kind == MismatchKind::MessageMismatch));
        assert!(out[0].detail.starts_with("failure #1"));
        assert!(out[1].detail.starts_with("failure #2"));
    }

    #[test]
    fn message_count_difference_is_a_message_mismatch() {
        let exp = [expected("A::B", ExpectedStatus::Failed, &["one", "two"])];
        let act = [actual("A::B", ActualStatus::Failed, &["one"])];
        let out = match_outcomes(&exp, &act, MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MismatchKind::MessageMismatch);
        assert_eq!(out[0].expected.as_deref(), Some("2"));
        assert_eq!(out[0].actual.as_deref(), Some("1"));
    }

    #[test]
    fn strict_mode_rejects_fragments() {
        let exp = [expected("A::B", ExpectedStatus::Failed, &["Actual: false"])];
        let act = [actual("A::B", ActualStatus::Failed, &["Value of: x\nActual: false"])];
        assert!(match_outcomes(&exp, &act, MessageMatch::Substring).is_empty());
        let strict = match_outcomes(&exp, &act, MessageMatch::Strict);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].detail.contains("differs from"));
    }

    #[test]
    fn messages_are_ignored_for_passing_and_skipped_cases() {
        let exp = [expected("A::B", ExpectedStatus::Skipped, &[])];
        let act = [actual("A::B", ActualStatus::Skipped, &["Skipped because why not"])];
        assert!(match_outcomes(&exp, &act, MessageMatch::Strict).is_empty());
    }

    #[test]
    fn anchoring_is_checked_when_location_is_known() {
        let mut exp = expected("TestOne::TestExceptionFailure", ExpectedStatus::Failed, &["oh no!"]);
        exp.messages[0].anchored = false;
        let located = ActualCase {
            name: name("TestOne::TestExceptionFailure"),
            status: ActualStatus::Failed,
            failure_messages: vec![ActualFailure {
                location: Some(FailureLocation::Known {
                    file: "test_one.cpp".into(),
                    line: 64,
                }),
                message: "oh no!".into(),
            }],
        };
        let out = match_outcomes(std::slice::from_ref(&exp), std::slice::from_ref(&located), MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert!(out[0].detail.contains("NOLINE"));

        let mut unknown = located.clone();
        unknown.failure_messages[0].location = Some(FailureLocation::Unknown);
        assert!(match_outcomes(std::slice::from_ref(&exp), &[unknown.clone()], MessageMatch::Substring).is_empty());

        exp.messages[0].anchored = true;
        let out = match_outcomes(&[exp], &[unknown], MessageMatch::Substring);
        assert_eq!(out.len(), 1);
        assert!(out[0].detail.contains("unknown file"));
    }

    #[test]
    fn actual_order_does_not_change_the_mismatch_set() {
        let exp = [
            expected("A::One", ExpectedStatus::Passed, &[]),
            expected("A::Two", ExpectedStatus::Failed, &["boom"]),
            expected("A::Three", ExpectedStatus::Skipped, &[]),
        ];
        let forward = vec![
            actual("A::One", ActualStatus::Failed, &["x"]),
            actual("A::Two", ActualStatus::Failed, &["bang"]),
            actual("A::Extra", ActualStatus::Passed, &[]),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let a = match_outcomes(&exp, &forward, MessageMatch::Substring);
        let b = match_outcomes(&exp, &backward, MessageMatch::Substring);
        assert_eq!(a, b);
        let kinds: Vec<_> = a.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            [
                MismatchKind::StatusMismatch,
                MismatchKind::MessageMismatch,
                MismatchKind::MissingActual,
                MismatchKind::UnexpectedActual,
            ]
        );
    }
}

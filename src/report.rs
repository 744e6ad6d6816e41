//! Handles all user-facing output of a verification.
//!
//! Two renderings of the same mismatch list:
//! - a human summary (colored when the terminal supports it), and
//! - a machine-readable stream with one JSON object per mismatch.
//!
//! Both use the same order: `malformed-annotation` entries first, since they
//! mean the expected set itself cannot be trusted, then everything else in
//! matcher order.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use difference::{Changeset, Difference};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode};
use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::mismatch::{Mismatch, MismatchKind, SourceExcerpt};

// ============================================================================
// EXIT STATUS
// ============================================================================

/// Process exit status of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Expected and actual outcomes agree.
    Agreement,
    /// At least one mismatch.
    Mismatches,
    /// Annotations are malformed (or the inputs could not be read).
    Malformed,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Agreement => 0,
            ExitStatus::Mismatches => 1,
            ExitStatus::Malformed => 2,
        }
    }

    pub fn from_mismatches(mismatches: &[Mismatch]) -> Self {
        if mismatches.iter().any(Mismatch::is_malformed) {
            ExitStatus::Malformed
        } else if mismatches.is_empty() {
            ExitStatus::Agreement
        } else {
            ExitStatus::Mismatches
        }
    }
}

// ============================================================================
// ORDERING AND COUNTS
// ============================================================================

/// Stable partition: malformed annotations first, the rest in their original order.
pub fn report_order(mismatches: &[Mismatch]) -> Vec<&Mismatch> {
    let (malformed, rest): (Vec<_>, Vec<_>) = mismatches.iter().partition(|m| m.is_malformed());
    malformed.into_iter().chain(rest).collect()
}

/// Counts per kind, in taxonomy order, omitting zero counts.
pub fn counts_by_kind(mismatches: &[Mismatch]) -> Vec<(MismatchKind, usize)> {
    let mut counts: BTreeMap<MismatchKind, usize> = BTreeMap::new();
    for m in mismatches {
        *counts.entry(m.kind).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Totals shown under the mismatch list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub files: usize,
    pub expected: usize,
    pub actual: usize,
    /// Expected cases with no mismatch attached to their name.
    pub matched: usize,
}

// ============================================================================
// HUMAN SUMMARY
// ============================================================================

/// Writes the human-readable report.
pub fn write_summary<W: WriteColor>(
    out: &mut W,
    mismatches: &[Mismatch],
    totals: &Totals,
    warnings: &[String],
) -> io::Result<()> {
    for warning in warnings {
        paint(out, Color::Yellow, false, "warning")?;
        writeln!(out, ": {}", warning)?;
    }
    if !warnings.is_empty() {
        writeln!(out)?;
    }

    for mismatch in report_order(mismatches) {
        write_mismatch(out, mismatch)?;
    }
    if !mismatches.is_empty() {
        writeln!(out)?;
    }

    writeln!(
        out,
        "Checked {} expected case(s) from {} file(s) against {} reported case(s).",
        totals.expected, totals.files, totals.actual
    )?;
    writeln!(out, "  {:<22} {}", "matched", totals.matched)?;
    for (kind, count) in counts_by_kind(mismatches) {
        writeln!(out, "  {:<22} {}", kind.as_str(), count)?;
    }

    match ExitStatus::from_mismatches(mismatches) {
        ExitStatus::Agreement => {
            paint(out, Color::Green, true, "OK")?;
            writeln!(out, ": all outcomes agree with their annotations")?;
        }
        ExitStatus::Mismatches => {
            paint(out, Color::Red, true, "FAIL")?;
            writeln!(out, ": {} mismatch(es)", mismatches.len())?;
        }
        ExitStatus::Malformed => {
            paint(out, Color::Red, true, "MALFORMED")?;
            writeln!(out, ": annotations must be fixed before results can be trusted")?;
        }
    }
    out.reset()
}

fn write_mismatch<W: WriteColor>(out: &mut W, mismatch: &Mismatch) -> io::Result<()> {
    let color = match mismatch.kind {
        MismatchKind::MalformedAnnotation | MismatchKind::DuplicateExpected => Color::Magenta,
        MismatchKind::UnexpectedActual => Color::Yellow,
        _ => Color::Red,
    };
    paint(out, color, true, mismatch.kind.as_str())?;
    if let Some(name) = &mismatch.name {
        write!(out, " {}", name)?;
    }
    if let Some(location) = &mismatch.location {
        write!(out, " [{}]", location)?;
    }
    writeln!(out, ": {}", mismatch.detail)?;

    if mismatch.kind == MismatchKind::MessageMismatch {
        if let (Some(expected), Some(actual)) = (&mismatch.expected, &mismatch.actual) {
            writeln!(out, "    expected: {}", expected)?;
            writeln!(out, "    actual:   {}", actual)?;
            write!(out, "    diff:     ")?;
            write_word_diff(out, expected, actual)?;
            writeln!(out)?;
        }
    }

    if let Some(excerpt) = &mismatch.excerpt {
        if let Some(snippet) = render_excerpt(mismatch, excerpt) {
            for line in snippet.lines() {
                writeln!(out, "    {}", line)?;
            }
        }
    }
    Ok(())
}

fn write_word_diff<W: WriteColor>(out: &mut W, expected: &str, actual: &str) -> io::Result<()> {
    let changeset = Changeset::new(expected, actual, " ");
    for (i, diff) in changeset.diffs.iter().enumerate() {
        if i > 0 {
            write!(out, " ")?;
        }
        match diff {
            Difference::Same(text) => {
                out.reset()?;
                write!(out, "{}", text)?;
            }
            Difference::Rem(text) => paint(out, Color::Red, false, &format!("[-{}-]", text))?,
            Difference::Add(text) => paint(out, Color::Green, false, &format!("{{+{}+}}", text))?,
        }
    }
    out.reset()
}

fn paint<W: WriteColor>(out: &mut W, color: Color, bold: bool, text: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

// ============================================================================
// SOURCE SNIPPETS
// ============================================================================

/// Adapter that lets miette draw a labelled snippet for a malformed annotation.
#[derive(Debug)]
struct AnnotationSnippet {
    source: Arc<NamedSource<String>>,
    offset: usize,
    len: usize,
    label: String,
}

impl fmt::Display for AnnotationSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl std::error::Error for AnnotationSnippet {}

impl Diagnostic for AnnotationSnippet {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.source.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.label.clone()),
            self.offset,
            self.len.max(1),
        ))))
    }
}

fn render_excerpt(mismatch: &Mismatch, excerpt: &SourceExcerpt) -> Option<String> {
    let snippet = AnnotationSnippet {
        source: excerpt.source.clone(),
        offset: excerpt.offset,
        len: excerpt.len,
        label: mismatch.kind.as_str().to_string(),
    };
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_context_lines(1);
    let mut rendered = String::new();
    handler.render_report(&mut rendered, &snippet).ok()?;
    Some(rendered)
}

// ============================================================================
// DIAGNOSTICS STREAM
// ============================================================================

/// One line of the machine-readable stream.
#[derive(Debug, Serialize)]
pub struct DiagnosticRecord<'a> {
    pub kind: MismatchKind,
    pub name: Option<String>,
    pub file: Option<String>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub expected: Option<&'a str>,
    pub actual: Option<&'a str>,
    pub detail: &'a str,
}

impl<'a> From<&'a Mismatch> for DiagnosticRecord<'a> {
    fn from(m: &'a Mismatch) -> Self {
        Self {
            kind: m.kind,
            name: m.name.as_ref().map(ToString::to_string),
            file: m.location.as_ref().map(|l| l.file.display().to_string()),
            start_line: m.location.as_ref().map(|l| l.start_line),
            end_line: m.location.as_ref().map(|l| l.end_line),
            expected: m.expected.as_deref(),
            actual: m.actual.as_deref(),
            detail: &m.detail,
        }
    }
}

/// Writes one JSON object per mismatch, in report order.
pub fn write_diagnostics<W: Write>(out: &mut W, mismatches: &[Mismatch]) -> io::Result<()> {
    for mismatch in report_order(mismatches) {
        serde_json::to_writer(&mut *out, &DiagnosticRecord::from(mismatch))?;
        writeln!(out)?;
    }
    out.flush()
}

//! Per-file annotation extraction as an explicit line state machine.
//!
//! States: [`State::Outside`], [`State::InsideNode`] and
//! [`State::InsideMessage`]. Each line is consumed left to right, so a single
//! line may open a node, capture a whole message and close the node again.
//! Errors never stop the scan; every problem in a file is reported in one pass.

use std::path::PathBuf;
use std::sync::Arc;

use miette::NamedSource;
use tracing::{debug, trace};

use super::grammar::{self, Found, Marker, MessageHeader};
use crate::mismatch::{Mismatch, SourceExcerpt};
use crate::model::{ExpectedCase, ExpectedMessage, ExpectedStatus, QualifiedName, SourceSpan};
use crate::normalize::normalize;

/// A message whose header names an owner other than the enclosing case.
/// Resolved once every file has been extracted.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub owner: QualifiedName,
    pub message: ExpectedMessage,
    pub excerpt: SourceExcerpt,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub cases: Vec<ExpectedCase>,
    pub redirects: Vec<Redirect>,
    pub malformed: Vec<Mismatch>,
}

#[derive(Debug)]
struct OpenNode {
    /// `None` when the header was malformed; the span is still tracked so its
    /// `NODEEND` is not reported a second time.
    header: Option<(QualifiedName, ExpectedStatus)>,
    start_line: usize,
    start_offset: usize,
    messages: Vec<ExpectedMessage>,
    /// Lines of helper `NODE:` markers opened inside this case.
    helpers: Vec<usize>,
}

#[derive(Debug)]
struct OpenMessage {
    /// `None` when the header was malformed or the block has no owner.
    target: Option<Target>,
    anchored: bool,
    start_line: usize,
    start_offset: usize,
    lines: Vec<String>,
}

#[derive(Debug)]
enum Target {
    Enclosing,
    Owner(QualifiedName),
}

#[derive(Debug)]
enum State {
    Outside,
    InsideNode(OpenNode),
    InsideMessage {
        message: OpenMessage,
        node: Option<OpenNode>,
    },
}

/// Line state machine over one file.
pub struct Extractor {
    file: Arc<PathBuf>,
    source: Arc<NamedSource<String>>,
    state: State,
    /// Helper markers opened outside of any case.
    outside_helpers: Vec<(usize, usize)>,
    /// Code of earlier lines whose statement has not ended yet, so a test
    /// macro whose arguments wrap still opens a case.
    statement: String,
    out: FileExtraction,
}

impl Extractor {
    pub fn new(file: impl Into<PathBuf>, content: &str) -> Self {
        let file = Arc::new(file.into());
        let source = Arc::new(NamedSource::new(
            file.display().to_string(),
            content.to_string(),
        ));
        Self {
            file,
            source,
            state: State::Outside,
            outside_helpers: Vec::new(),
            statement: String::new(),
            out: FileExtraction::default(),
        }
    }

    /// Scans `content` (the same text given to [`Extractor::new`]).
    pub fn run(mut self, content: &str) -> FileExtraction {
        let mut offset = 0;
        let mut last_line = 0;
        for (idx, raw) in content.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            last_line = idx + 1;
            let in_message = matches!(self.state, State::InsideMessage { .. });
            self.scan_line(line, idx + 1, offset);
            self.carry_statement(line, in_message);
            offset += raw.len();
        }
        self.finish(last_line);
        debug!(
            file = %self.file.display(),
            cases = self.out.cases.len(),
            redirects = self.out.redirects.len(),
            malformed = self.out.malformed.len(),
            "extracted annotations"
        );
        self.out
    }

    fn scan_line(&mut self, line: &str, line_no: usize, line_offset: usize) {
        let mut cursor = 0;
        while cursor <= line.len() {
            let rest = &line[cursor..];
            let state = std::mem::replace(&mut self.state, State::Outside);
            match state {
                State::InsideMessage { mut message, node } => match grammar::comment_close(rest) {
                    Some(close) => {
                        message.lines.push(rest[..close].to_string());
                        cursor += close + grammar::COMMENT_CLOSE.len();
                        self.state = self.close_message(message, node);
                    }
                    None => {
                        message.lines.push(rest.to_string());
                        self.state = State::InsideMessage { message, node };
                        return;
                    }
                },
                other => {
                    self.state = other;
                    let Some(found) = grammar::next_marker(rest) else {
                        return;
                    };
                    let at = cursor + found.at;
                    cursor += found.end;
                    self.on_marker(found, line, at, line_no, line_offset);
                }
            }
        }
    }

    fn carry_statement(&mut self, line: &str, in_message: bool) {
        let code = if in_message {
            match grammar::comment_close(line) {
                Some(close) => &line[close + grammar::COMMENT_CLOSE.len()..],
                None => return,
            }
        } else {
            line
        };
        let code = grammar::code_part(code);
        if code.trim_start().starts_with('#') {
            self.statement.clear();
            return;
        }
        self.statement.push_str(code);
        self.statement.push(' ');
        self.statement = grammar::statement_tail(&self.statement).to_string();
    }

    fn on_marker(
        &mut self,
        found: Found<Marker<'_>>,
        line: &str,
        at: usize,
        line_no: usize,
        line_offset: usize,
    ) {
        match found.marker {
            Marker::Node(header) => self.on_node(header, &line[..at], line_no, line_offset, line.len()),
            Marker::NodeEnd => self.on_node_end(line_no, line_offset, line.len()),
            Marker::Message(header) if grammar::opens_block_comment(&line[..at]) => {
                self.on_message(header, line_no, line_offset, line.len())
            }
            Marker::Message(_) => self.malformed(
                "MESSAGE tag outside a /* */ block comment",
                line_no,
                line_no,
                line_offset,
                line.len(),
            ),
        }
    }

    fn on_node(
        &mut self,
        header: &str,
        code_before: &str,
        line_no: usize,
        line_offset: usize,
        line_len: usize,
    ) {
        let statement = format!("{}{}", self.statement, code_before);
        if !grammar::invokes_test_macro(&statement) {
            trace!(line = line_no, "helper NODE marker");
            match &mut self.state {
                State::InsideNode(node) => node.helpers.push(line_no),
                _ => self.outside_helpers.push((line_no, line_offset)),
            }
            return;
        }

        if let State::InsideNode(open) = std::mem::replace(&mut self.state, State::Outside) {
            self.report_unterminated(&open, line_no.saturating_sub(1).max(open.start_line));
        }

        let parsed = match grammar::parse_node_header(header) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.malformed(e.to_string(), line_no, line_no, line_offset, line_len);
                None
            }
        };
        self.state = State::InsideNode(OpenNode {
            header: parsed,
            start_line: line_no,
            start_offset: line_offset,
            messages: Vec::new(),
            helpers: Vec::new(),
        });
    }

    fn on_node_end(&mut self, line_no: usize, line_offset: usize, line_len: usize) {
        match std::mem::replace(&mut self.state, State::Outside) {
            State::InsideNode(mut node) => {
                if node.helpers.pop().is_some() {
                    self.state = State::InsideNode(node);
                    return;
                }
                self.close_node(node, line_no);
            }
            other => {
                self.state = other;
                if self.outside_helpers.pop().is_none() {
                    self.malformed(
                        "NODEEND without a matching NODE marker",
                        line_no,
                        line_no,
                        line_offset,
                        line_len,
                    );
                }
            }
        }
    }

    fn on_message(&mut self, header: &str, line_no: usize, line_offset: usize, line_len: usize) {
        let node = match std::mem::replace(&mut self.state, State::Outside) {
            State::InsideNode(node) => Some(node),
            _ => None,
        };

        let (target, anchored) = match grammar::parse_message_header(header) {
            Ok(MessageHeader::Plain) => (Some(Target::Enclosing), true),
            Ok(MessageHeader::Unanchored) => (Some(Target::Enclosing), false),
            Ok(MessageHeader::Owner(owner)) => (Some(Target::Owner(owner)), true),
            Err(detail) => {
                self.malformed(detail, line_no, line_no, line_offset, line_len);
                (None, true)
            }
        };

        let target = match target {
            Some(Target::Enclosing) if node.is_none() => {
                self.malformed(
                    "MESSAGE block outside any NODE span and without an owner",
                    line_no,
                    line_no,
                    line_offset,
                    line_len,
                );
                None
            }
            other => other,
        };

        self.state = State::InsideMessage {
            message: OpenMessage {
                target,
                anchored,
                start_line: line_no,
                start_offset: line_offset,
                lines: Vec::new(),
            },
            node,
        };
    }

    fn close_message(&mut self, message: OpenMessage, node: Option<OpenNode>) -> State {
        let text = normalize(&message.lines.join("\n"));
        let origin = SourceSpan::line(self.file.clone(), message.start_line);
        let excerpt = self.excerpt_at(message.start_offset, 0);
        let enclosing = node
            .as_ref()
            .and_then(|n| n.header.as_ref())
            .map(|(name, _)| name.clone());

        let mut node = node;
        match message.target {
            None => {}
            Some(Target::Owner(owner)) if Some(&owner) != enclosing.as_ref() => {
                self.out.redirects.push(Redirect {
                    owner: owner.clone(),
                    message: ExpectedMessage {
                        text,
                        anchored: message.anchored,
                        owner_override: Some(owner),
                        origin,
                    },
                    excerpt,
                });
            }
            Some(_) => {
                if let Some(node) = node.as_mut() {
                    node.messages.push(ExpectedMessage {
                        text,
                        anchored: message.anchored,
                        owner_override: None,
                        origin,
                    });
                }
            }
        }

        match node {
            Some(node) => State::InsideNode(node),
            None => State::Outside,
        }
    }

    fn close_node(&mut self, node: OpenNode, end_line: usize) {
        let Some((name, status)) = node.header else {
            return;
        };
        let span = SourceSpan::new(self.file.clone(), node.start_line, end_line);
        if status != ExpectedStatus::Failed && !node.messages.is_empty() {
            self.out.malformed.push(
                Mismatch::malformed(
                    format!(
                        "case declared {} carries {} MESSAGE block(s)",
                        status,
                        node.messages.len()
                    ),
                    span.clone(),
                )
                .named(name.clone())
                .with_excerpt(self.excerpt_at(node.start_offset, 0)),
            );
        }
        trace!(case = %name, %status, "closed NODE");
        self.out.cases.push(ExpectedCase {
            name,
            status,
            messages: node.messages,
            source_span: span,
        });
    }

    fn finish(&mut self, last_line: usize) {
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Outside => {}
            State::InsideNode(node) => self.report_unterminated(&node, last_line),
            State::InsideMessage { message, node } => {
                let mut mismatch = Mismatch::malformed(
                    "unterminated MESSAGE block (no closing '*/')",
                    SourceSpan::new(self.file.clone(), message.start_line, last_line),
                )
                .with_excerpt(self.excerpt_at(message.start_offset, 0));
                if let Some((name, _)) = node.and_then(|n| n.header) {
                    mismatch = mismatch.named(name);
                }
                self.out.malformed.push(mismatch);
            }
        }
        for (line, offset) in std::mem::take(&mut self.outside_helpers) {
            self.malformed(
                "helper NODE marker without a matching NODEEND",
                line,
                last_line,
                offset,
                0,
            );
        }
    }

    fn report_unterminated(&mut self, node: &OpenNode, end_line: usize) {
        let mut mismatch = Mismatch::malformed(
            "unterminated NODE (no matching NODEEND)",
            SourceSpan::new(self.file.clone(), node.start_line, end_line),
        )
        .with_excerpt(self.excerpt_at(node.start_offset, 0));
        if let Some((name, _)) = &node.header {
            mismatch = mismatch.named(name.clone());
        }
        self.out.malformed.push(mismatch);
    }

    fn malformed(
        &mut self,
        detail: impl Into<String>,
        start_line: usize,
        end_line: usize,
        offset: usize,
        len: usize,
    ) {
        let excerpt = self.excerpt_at(offset, len);
        self.out.malformed.push(
            Mismatch::malformed(
                detail,
                SourceSpan::new(self.file.clone(), start_line, end_line),
            )
            .with_excerpt(excerpt),
        );
    }

    fn excerpt_at(&self, offset: usize, len: usize) -> SourceExcerpt {
        SourceExcerpt {
            source: self.source.clone(),
            offset,
            len,
        }
    }
}

/// Extracts annotations from one file's text.
pub fn extract_file(file: impl Into<PathBuf>, content: &str) -> FileExtraction {
    Extractor::new(file, content).run(content)
}

//! Operational errors for the verifier.
//!
//! # Overview
//!
//! Problems with the *content* being verified (bad annotations, disagreeing
//! outcomes) are never errors: they are [`crate::Mismatch`] values. This module
//! covers everything else, i.e. the cases where the verifier cannot do its job
//! at all: a path that cannot be read, a diagnostics file that cannot be
//! written, an invocation list that is not text.
//!
//! # Construction
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Io, "cannot read '{}'", path.display())`
//!
//! - **Use `err_io!` to wrap a `std::io::Error` with the path it concerns.**
//!   - `err_io!(path, e)`
//!
//! - **Attach help with [`OracleError::with_help`].**

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Minimal context carried by every error.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// File the error concerns, if any.
    pub path: Option<PathBuf>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context.
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with only a path.
    pub fn with_path(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            help: None,
        }
    }
}

/// Unified error type for operational failures.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl OracleError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            OracleError::Io { ctx, .. } => ctx,
            OracleError::Internal { ctx, .. } => ctx,
        }
    }

    fn get_ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            OracleError::Io { ctx, .. } => ctx,
            OracleError::Internal { ctx, .. } => ctx,
        }
    }

    /// Attaches a help message shown under the diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.get_ctx_mut().help = Some(help.into());
        self
    }

    /// The path the error concerns, when known.
    pub fn path(&self) -> Option<&Path> {
        self.get_ctx().path.as_deref()
    }

    fn code_suffix(&self) -> &'static str {
        match self {
            OracleError::Io { .. } => "io",
            OracleError::Internal { .. } => "internal",
        }
    }
}

impl Diagnostic for OracleError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("gtest_oracle::{}", self.code_suffix())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }
}

/// Constructs an `OracleError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::OracleError::$variant {
            message: format!($msg $(, $arg)*),
            ctx: $crate::errors::ErrorContext::none(),
            source: None,
        }
    };
}

/// Wraps an I/O error together with the path it occurred on.
#[macro_export]
macro_rules! err_io {
    ($path:expr, $err:expr) => {
        $crate::OracleError::Io {
            message: format!("'{}': {}", $path.display(), $err),
            ctx: $crate::errors::ErrorContext::with_path($path),
            source: Some(Box::new($err)),
        }
    };
}

#[cfg(test)]
mod tests {
    use miette::Report;

    use super::*;

    #[test]
    fn io_error_keeps_path_and_help() {
        let path = Path::new("missing/run.json");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = err_io!(path, io).with_help("pass the file written by --gtest_output=json");
        assert_eq!(err.path(), Some(path));
        let rendered = format!("{:?}", Report::new(err));
        assert!(rendered.contains("missing/run.json"));
        assert!(rendered.contains("gtest_oracle::io"));
        assert!(rendered.contains("--gtest_output=json"));
    }

    #[test]
    fn message_only_error_formats_arguments() {
        let err = err_msg!(Internal, "expected {} lines, got {}", 3, 1);
        assert_eq!(err.to_string(), "Internal error: expected 3 lines, got 1");
        assert!(err.path().is_none());
    }
}

//! Output streams for the CLI.
//!
//! stdout carries the report, stderr carries logs, errors and (by default)
//! the diagnostics stream.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use termcolor::{ColorChoice, StandardStream};

use super::args::ColorMode;
use crate::{err_io, OracleError};

impl ColorMode {
    /// Resolves the mode for a stream; `Auto` only colors terminals.
    pub fn choice(self, stream: atty::Stream) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(stream) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

pub fn stdout(mode: ColorMode) -> StandardStream {
    StandardStream::stdout(mode.choice(atty::Stream::Stdout))
}

/// Opens the diagnostics destination: the given file, or stderr.
pub fn diagnostics_sink(path: Option<&Path>) -> Result<Box<dyn Write>, OracleError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| err_io!(path, e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stderr())),
    }
}

/// Prints an operational error with its miette rendering.
pub fn print_error(error: OracleError) {
    eprintln!("{:?}", miette::Report::new(error));
}

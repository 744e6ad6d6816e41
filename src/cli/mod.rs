//! The gtest-oracle Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Every command returns a process exit code:
//! `0` agreement, `1` mismatches, `2` malformed annotations or an operational
//! error.

use std::path::Path;

use clap::Parser;
use serde::Serialize;
use tracing::debug;

use crate::annotations::Extraction;
use crate::cli::args::{ColorMode, Command, OracleArgs};
use crate::discovery::extract_tree;
use crate::mismatch::Mismatch;
use crate::model::ExpectedCase;
use crate::report::{write_diagnostics, write_summary, ExitStatus};
use crate::verify::{verify, VerifyConfig};
use crate::{err_io, err_msg, OracleError};

pub mod args;
pub mod logging;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> i32 {
    let args = OracleArgs::parse();
    let ansi = args.color.choice(atty::Stream::Stderr) != termcolor::ColorChoice::Never;
    logging::init_logging(args.verbose, ansi);
    debug!(?args, "parsed arguments");

    let result = match &args.command {
        Command::Verify(verify_args) => handle_verify(
            &VerifyConfig::from(verify_args),
            verify_args.diagnostics.as_deref(),
            args.color,
        ),
        Command::Extract { source } => handle_extract(source),
    };

    match result {
        Ok(status) => status.code(),
        Err(e) => {
            output::print_error(e);
            ExitStatus::Malformed.code()
        }
    }
}

/// Handles the `verify` subcommand.
fn handle_verify(
    config: &VerifyConfig,
    diagnostics: Option<&Path>,
    color: ColorMode,
) -> Result<ExitStatus, OracleError> {
    let verification = verify(config)?;

    let mut sink = output::diagnostics_sink(diagnostics)?;
    let sink_path = diagnostics.unwrap_or_else(|| Path::new("<stderr>"));
    write_diagnostics(&mut sink, &verification.mismatches).map_err(|e| err_io!(sink_path, e))?;

    let mut stdout = output::stdout(color);
    write_summary(
        &mut stdout,
        &verification.mismatches,
        &verification.totals,
        &verification.warnings,
    )
    .map_err(|e| err_io!(Path::new("<stdout>"), e))?;

    Ok(verification.exit_status())
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    files: usize,
    cases: &'a [ExpectedCase],
    problems: &'a [Mismatch],
}

/// Handles the `extract` subcommand.
fn handle_extract(source: &Path) -> Result<ExitStatus, OracleError> {
    let Extraction {
        files,
        cases,
        problems,
    } = extract_tree(source)?;
    let rendered = serde_json::to_string_pretty(&ExtractOutput {
        files,
        cases: &cases,
        problems: &problems,
    })
    .map_err(|e| err_msg!(Internal, "cannot serialize extraction: {}", e))?;
    println!("{}", rendered);

    Ok(if problems.iter().any(Mismatch::is_malformed) {
        ExitStatus::Malformed
    } else {
        ExitStatus::Agreement
    })
}

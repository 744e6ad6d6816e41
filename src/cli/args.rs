//! Defines the command-line arguments and subcommands.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::ingest::RunFormat;
use crate::normalize::MessageMatch;
use crate::verify::VerifyConfig;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "gtest-oracle",
    version,
    about = "Cross-checks annotated googletest sources against the outcome of a test run."
)]
pub struct OracleArgs {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// When to color the report.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare the annotated expectations with a test run's output.
    Verify(VerifyArgs),
    /// Print the expected outcomes declared in annotated sources as JSON.
    Extract {
        /// Annotated source file or directory.
        source: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Annotated source file or directory.
    pub source: PathBuf,

    /// Output written by the test run.
    pub run_output: PathBuf,

    /// Tests the run was asked to execute (--gtest_list_tests output or
    /// one qualified name per line). Unreported names become `crashed`.
    #[arg(long, value_name = "FILE")]
    pub invocations: Option<PathBuf>,

    /// Serialization of the run output.
    #[arg(long, value_enum, default_value_t = RunFormat::Auto)]
    pub format: RunFormat,

    /// How expected message text is compared with reported text.
    #[arg(
        long,
        value_enum,
        env = "GTEST_ORACLE_MESSAGE_MATCH",
        default_value_t = MessageMatch::Substring
    )]
    pub message_match: MessageMatch,

    /// Write the JSON-lines diagnostics stream here instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Color when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl From<&VerifyArgs> for VerifyConfig {
    fn from(args: &VerifyArgs) -> Self {
        VerifyConfig {
            source: args.source.clone(),
            run_output: args.run_output.clone(),
            invocations: args.invocations.clone(),
            format: args.format,
            message_match: args.message_match,
        }
    }
}

//! Annotation-driven verification of googletest runs.
//!
//! Test sources declare their expected outcome in comments (`NODE:`,
//! `NODEEND`, `MESSAGE:`). This crate extracts those declarations, ingests
//! what a test run actually reported, and classifies every disagreement.
//!
//! ```text
//! sources ──► annotations ──┐
//!                           ├──► matcher ──► report
//! run output ──► ingest ────┘
//! ```

pub use crate::errors::{ErrorContext, OracleError};
pub use crate::mismatch::{Mismatch, MismatchKind};
pub use crate::normalize::MessageMatch;
pub use crate::verify::{verify, Verification, VerifyConfig};

pub mod annotations;
pub mod cli;
pub mod discovery;
pub mod errors;
pub mod ingest;
pub mod matcher;
pub mod mismatch;
pub mod model;
pub mod normalize;
pub mod report;
pub mod verify;

//! Process exit codes, one per failure kind.
//!
//! Codes start at 10 to stay clear of clap's usage error (2).

use std::process::ExitCode;

use dissector_core::ErrorKind;

pub const NOT_FOUND: u8 = 10;
pub const UNREADABLE: u8 = 11;
pub const MALFORMED_METADATA: u8 = 12;
pub const INVALID_BUNDLE_FORMAT: u8 = 13;
pub const TRUNCATED_INPUT: u8 = 14;
pub const CORRUPT_BUNDLE: u8 = 15;

/// Exit status for a failure kind.
pub fn code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::NotFound => NOT_FOUND,
        ErrorKind::Unreadable => UNREADABLE,
        ErrorKind::MalformedMetadata => MALFORMED_METADATA,
        ErrorKind::InvalidBundleFormat => INVALID_BUNDLE_FORMAT,
        ErrorKind::TruncatedInput => TRUNCATED_INPUT,
        ErrorKind::CorruptBundle => CORRUPT_BUNDLE,
    }
}

/// Exit status for the first failure, or success if there was none.
pub fn status(first_failure: Option<ErrorKind>) -> ExitCode {
    first_failure.map_or(ExitCode::SUCCESS, |kind| ExitCode::from(code(kind)))
}

//! Error types for the splicing engine.

use thiserror::Error;

/// Errors that abort a splice run.
///
/// The engine never retries: every error is fatal to the current invocation
/// and any partially written output should be discarded by the caller.
#[derive(Error, Debug)]
pub enum SpliceError {
    /// The registry was empty when the splice was started.
    #[error("no objects to export")]
    NoObjects,

    /// The configuration cannot produce a valid program.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing to the output sink failed.
    #[error("failed to write spliced output: {0}")]
    Sink(#[from] std::io::Error),
}

/// Result type for splicing operations.
pub type Result<T> = std::result::Result<T, SpliceError>;

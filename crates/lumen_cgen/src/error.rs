//! Error types for C code generation.

use std::path::PathBuf;
use thiserror::Error;

/// An error surfaced at the file-write boundary of the generator.
///
/// The traversal itself is total on valid inputs; malformed ASTs are
/// programmer errors and abort instead.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;

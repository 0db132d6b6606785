use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a formula or running a batch.
///
/// Contradictions found during the search are not errors; they only drive backtracking.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: malformed token {token:?}")]
    Malformed { line: usize, token: String },

    #[error("missing 'p cnf' line before clauses")]
    MissingHeader,

    #[error("{what} mismatch: declared {declared}, found {found}")]
    SizeMismatch {
        what: &'static str,
        declared: usize,
        found: usize,
    },
}

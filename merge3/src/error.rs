use thiserror::Error;

///
/// All fatal ways a merge job can fail (design §7). Non-fatal conditions - header reorder
/// conflicts and row-level conflicts - are never raised as `MatcherError`; they are accumulated
/// as diagnostics and conflict blocks respectively and never abort the merge (see
/// `merge::driver` and `merge::rowmerge`).
///
#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Malformed row at line {line} of {path}: {reason}")]
    MalformedRow { path: String, line: usize, reason: String },

    #[error("Duplicate key '{key}' at line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error("The primary key column '{key}' is not present in the header of {path}")]
    MissingKeyColumn { key: String, path: String },

    #[error("CSV file had no header row")]
    HeaderEmpty,

    #[error("Duplicate column name '{header}' in a file header")]
    DuplicateColumn { header: String },

    #[error("Internal invariant violated in the merge driver: {reason}")]
    InternalInvariant { reason: String },

    #[error("Invalid configuration")]
    ConfigError(#[from] core::error::Error),

    #[error(transparent)]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

use thiserror::Error;

// ---------------------------------------------------------------------------
// ArchiveError – everything that can go wrong loading or querying an archive
// ---------------------------------------------------------------------------

/// Errors raised while loading an archive or answering queries against it.
///
/// Loading either succeeds completely or fails completely: on any parse
/// error no partial archive is returned.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("reading archive file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing archive JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "task {task}: observable '{observable}': mean has {mean_len} entries \
         but error has {error_len}"
    )]
    MeanErrorMismatch {
        task: usize,
        observable: String,
        mean_len: usize,
        error_len: usize,
    },

    #[error("task {task}: observable '{observable}': empty mean")]
    EmptyObservable { task: usize, observable: String },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown observable '{0}'")]
    UnknownObservable(String),

    #[error("parameter '{0}': selected values are not mutually orderable")]
    IncomparableTypes(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

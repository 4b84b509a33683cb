use thiserror::Error;

/// Fatal conversion failures. Anything recoverable (unknown block name,
/// missing translation entry, failed decompression probe) is logged and
/// the pipeline continues instead of constructing one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed tagged-binary container: {0}")]
    MalformedContainer(String),

    #[error("unrecognised schematic dialect: {0}")]
    UnknownDialect(String),

    #[error("cell count does not match declared dimensions: {0}")]
    DimensionMismatch(String),

    #[error("unsupported field encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation table error: {0}")]
    Table(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

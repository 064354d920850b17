use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Record text without a usable `id` token, or an array body that is not `[...]`.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The collection file itself is not a `[...]` array.
    #[error("corrupt collection file {path}: {reason}")]
    CorruptCollection { path: String, reason: String },

    #[error("no record with id {id} in {collection}")]
    NotFound { collection: String, id: String },

    #[error("{operation} is not supported on {collection}")]
    Unsupported {
        collection: &'static str,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

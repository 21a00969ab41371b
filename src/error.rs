use thiserror::Error;

/// Rejection of a malformed composite file identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdentifierError {
    #[error("message id {0} is negative")]
    NegativeMessageId(i64),

    #[error("file token {0:?} contains the ':' separator")]
    TokenContainsSeparator(String),

    #[error("file token is empty")]
    EmptyToken,

    #[error("file id {0:?} does not start with a message id")]
    MissingMessageId(String),
}

/// Errors surfaced by the metadata store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("invalid file id: {0}")]
    InvalidIdentifier(#[from] InvalidIdentifierError),

    #[error("invalid file record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// True for failures of the backing database rather than of the caller's input.
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

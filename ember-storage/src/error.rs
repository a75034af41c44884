use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("write error: {reason}")]
    WriteError { reason: String },

    #[error("read error: {reason}")]
    ReadError { reason: String },

    #[error("sqlite error: {reason}")]
    SqliteError { reason: String },

    #[error("serialization error: {reason}")]
    SerializationError { reason: String },

    #[error("deserialization error in {key}: {reason}")]
    DeserializationError { key: String, reason: String },

    #[error("batch error: {reason}")]
    BatchError { reason: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::SqliteError {
            reason: err.to_string(),
        }
    }
}

use thiserror::Error;

/// Errors that can occur in the node.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum NodeError {
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    #[error("genesis error: {reason}")]
    GenesisError { reason: String },

    #[error("account file error: {reason}")]
    AccountError { reason: String },

    #[error("storage error: {0}")]
    StorageError(#[from] ember_storage::error::StorageError),

    #[error("vm error: {0}")]
    VmError(#[from] ember_vm::error::VmError),

    #[error("{0}")]
    TypeError(#[from] ember_types::error::EmberError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

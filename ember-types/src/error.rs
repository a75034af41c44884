use thiserror::Error;

/// Errors shared by the type and crypto layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmberError {
    // ─── Amount Errors ───────────────────────────────────────────────────────
    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("arithmetic overflow in {op}")]
    Overflow { op: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal scale {decimal} exceeds maximum {max}")]
    ScaleTooLarge { decimal: u32, max: u32 },

    // ─── Account Errors ──────────────────────────────────────────────────────
    #[error("invalid account id {id:?}: {reason}")]
    InvalidAccountId { id: String, reason: String },

    // ─── Crypto Errors ───────────────────────────────────────────────────────
    #[error("unknown signing algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial { reason: String },

    #[error("invalid signature: signer {signer_index}")]
    InvalidSignature { signer_index: usize },

    #[error("signing failed: {reason}")]
    SigningError { reason: String },

    // ─── Encoding Errors ─────────────────────────────────────────────────────
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },
}

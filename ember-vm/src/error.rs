use ember_storage::error::StorageError;
use ember_types::error::EmberError;
use ember_types::fixed::Fixed;
use ember_types::primitives::{AccountId, ContractId};
use thiserror::Error;

/// Errors raised while dispatching and executing contract operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("invalid argument at position {position}: {reason}")]
    InvalidArgumentEncoding { position: usize, reason: String },

    #[error("invalid pledge amount: {reason}")]
    InvalidPledgeAmount { reason: String },

    #[error("pledge of {remaining} is below the minimum of {minimum}")]
    PledgeBelowMinimum { remaining: Fixed, minimum: Fixed },

    #[error("cannot unpledge: {account} has no prior pledge")]
    NoPriorPledge { account: AccountId },

    #[error("change of gas rate failed for {account}: current {current}, delta {delta}")]
    InvalidRateTransition {
        account: AccountId,
        current: Fixed,
        delta: Fixed,
    },

    #[error("change of gas limit failed for {account}: current {current}, delta {delta}")]
    InvalidLimitTransition {
        account: AccountId,
        current: Fixed,
        delta: Fixed,
    },

    #[error("permission denied: {account}@{permission}")]
    PermissionDenied {
        account: AccountId,
        permission: String,
    },

    /// A nested token call failed. `ledger_mutated` is set when the gas
    /// ledger had already been written, so only discarding the enclosing
    /// transaction restores consistency.
    #[error("token transfer failed (ledger mutated: {ledger_mutated}): {reason}")]
    TransferFailed { ledger_mutated: bool, reason: String },

    #[error("abi not found: {contract}.{name}")]
    AbiNotFound { contract: ContractId, name: String },

    #[error("contract not found: {contract}")]
    ContractNotFound { contract: ContractId },

    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded { depth: usize, max: usize },

    #[error("re-entrancy detected: {contract} is already on the call stack")]
    ReentrancyDetected { contract: ContractId },

    #[error("insufficient balance of {account}: has {balance}, needs {required}")]
    InsufficientBalance {
        account: AccountId,
        balance: Fixed,
        required: Fixed,
    },

    #[error("insufficient gas of {account}: has {available}, needs {required}")]
    InsufficientGas {
        account: AccountId,
        available: Fixed,
        required: Fixed,
    },

    #[error("gas limit exceeded: used {used} of {limit}")]
    GasLimitExceeded { used: i64, limit: i64 },

    #[error("invalid account id {id}: {reason}")]
    InvalidAccountId { id: String, reason: String },

    #[error("invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    #[error("arithmetic error: {0}")]
    Arithmetic(EmberError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<EmberError> for VmError {
    fn from(err: EmberError) -> Self {
        match err {
            EmberError::InvalidAccountId { id, reason } => VmError::InvalidAccountId { id, reason },
            other => VmError::Arithmetic(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_error_is_lifted() {
        let err: VmError = EmberError::InvalidAccountId {
            id: "bob".into(),
            reason: "too short".into(),
        }
        .into();
        assert!(matches!(err, VmError::InvalidAccountId { ref id, .. } if id == "bob"));

        let err: VmError = EmberError::DivisionByZero.into();
        assert!(matches!(err, VmError::Arithmetic(EmberError::DivisionByZero)));
    }

    #[test]
    fn test_display_messages() {
        let err = VmError::PledgeBelowMinimum {
            remaining: "5".parse().unwrap(),
            minimum: "10".parse().unwrap(),
        };
        assert_eq!(err.to_string(), "pledge of 5 is below the minimum of 10");

        let err = VmError::TransferFailed {
            ledger_mutated: true,
            reason: "boom".into(),
        };
        assert!(err.to_string().contains("ledger mutated: true"));
    }
}

use ember_types::primitives::{AccountId, Hash, Timestamp};

/// Typed facts about the transaction being executed, fixed for its whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Block time in nanoseconds; every time-dependent computation uses it.
    pub time: Timestamp,
    /// Account paying for the transaction.
    pub publisher: AccountId,
    pub tx_hash: Hash,
}

impl ExecutionContext {
    pub fn new(time: Timestamp, publisher: impl Into<AccountId>, tx_hash: Hash) -> Self {
        Self {
            time,
            publisher: publisher.into(),
            tx_hash,
        }
    }

    /// Short hex form of the transaction hash, for log lines.
    pub fn short_hash(&self) -> String {
        hex::encode(&self.tx_hash[..8])
    }
}

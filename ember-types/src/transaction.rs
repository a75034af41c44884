use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TX_EXPIRATION;
use crate::primitives::{AccountId, Algorithm, ContractId, Hash, Timestamp};

/// A single contract invocation inside a transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Action {
    /// Target contract.
    pub contract: ContractId,
    /// Exposed operation name, e.g. `PledgeGas`.
    pub action_name: String,
    /// JSON array of positional arguments.
    pub data: String,
}

impl Action {
    pub fn new(
        contract: impl Into<ContractId>,
        action_name: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            contract: contract.into(),
            action_name: action_name.into(),
            data: data.into(),
        }
    }
}

/// A signature over [`Transaction::signing_data`].
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TxSignature {
    pub algorithm: Algorithm,
    pub pubkey: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A transaction submitted for execution.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Transaction {
    /// Creation time (nanoseconds).
    pub time: Timestamp,
    /// The transaction is rejected after this time (nanoseconds).
    pub expiration: Timestamp,
    /// Maximum gas the publisher agrees to pay, in whole gas units.
    pub gas_limit: i64,
    /// Account charged for the transaction's gas.
    pub publisher: AccountId,
    pub actions: Vec<Action>,
    pub signatures: Vec<TxSignature>,
}

fn put_str(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u32).to_le_bytes());
    data.extend_from_slice(s.as_bytes());
}

impl Transaction {
    /// Create an unsigned transaction expiring after the default lifetime.
    pub fn new(
        publisher: impl Into<AccountId>,
        actions: Vec<Action>,
        time: Timestamp,
        gas_limit: i64,
    ) -> Self {
        Self {
            time,
            expiration: time.saturating_add(DEFAULT_TX_EXPIRATION),
            gas_limit,
            publisher: publisher.into(),
            actions,
            signatures: Vec::new(),
        }
    }

    /// Compute the data that signers sign: every field except signatures.
    pub fn signing_data(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&self.time.to_le_bytes());
        data.extend_from_slice(&self.expiration.to_le_bytes());
        data.extend_from_slice(&self.gas_limit.to_le_bytes());
        put_str(&mut data, &self.publisher);
        data.extend_from_slice(&(self.actions.len() as u32).to_le_bytes());
        for action in &self.actions {
            put_str(&mut data, &action.contract);
            put_str(&mut data, &action.action_name);
            put_str(&mut data, &action.data);
        }
        data
    }

    /// Transaction hash: BLAKE3 over the signing data followed by every
    /// signature.
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.signing_data());
        for sig in &self.signatures {
            hasher.update(sig.algorithm.as_str().as_bytes());
            hasher.update(&sig.pubkey);
            hasher.update(&sig.signature);
        }
        *hasher.finalize().as_bytes()
    }
}

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::fixed::Fixed;
use crate::primitives::Timestamp;

/// Tokens credited to an account but not spendable before `release_time`.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct FreezeRecord {
    /// Amount that becomes spendable on release.
    pub amount: Fixed,
    /// Nanosecond timestamp at which the amount is released.
    pub release_time: Timestamp,
}

impl FreezeRecord {
    /// Whether the record has matured at `now`.
    pub fn is_released(&self, now: Timestamp) -> bool {
        now >= self.release_time
    }
}

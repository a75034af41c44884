use serde::{Deserialize, Serialize};

use crate::fixed::Fixed;
use crate::primitives::Timestamp;

/// Snapshot of one account's gas ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasInfo {
    /// Tokens currently locked for gas.
    pub pledge: Fixed,
    /// Gas accrued per second.
    pub rate: Fixed,
    /// Maximum gas the account may hold.
    pub limit: Fixed,
    /// Gas currently available.
    pub stock: Fixed,
    /// Nanosecond timestamp of the last refresh; 0 if never pledged.
    pub last_update_time: Timestamp,
}

impl GasInfo {
    /// Whether the account has ever pledged.
    pub fn is_initialized(&self) -> bool {
        self.last_update_time != 0
    }
}

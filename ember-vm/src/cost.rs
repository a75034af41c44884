use std::ops::{Add, AddAssign};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// ─── Cost Constants ─────────────────────────────────────────────────────────

/// CPU charged per validation layer of an operation.
pub const COMMON_OP_CPU: i64 = 10;

/// Base CPU of a contract call, before arguments and the callee's own cost.
pub const CALL_CPU: i64 = 100;

/// Looking up the executing contract's identity.
pub const CONTRACT_NAME_COST: Cost = Cost::new(0, 0, COMMON_OP_CPU);

/// One permission check against the transaction's signers.
pub const REQUIRE_AUTH_COST: Cost = Cost::new(0, 0, 2 * COMMON_OP_CPU);

/// One pledge engine step (refresh plus ledger writes).
pub const PLEDGE_FOR_GAS_COST: Cost = Cost::new(0, 0, 500);

/// An immediate token transfer.
pub const TRANSFER_COST: Cost = Cost::new(0, 0, 300);

/// A frozen token transfer; the data part pays for the stored freeze record.
pub const TRANSFER_FREEZE_COST: Cost = Cost::new(24, 0, 300);

/// A balance query.
pub const BALANCE_OF_COST: Cost = Cost::new(0, 0, 50);

/// Resources consumed by an operation: stored bytes, transferred bytes, and
/// computation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Cost {
    pub data: i64,
    pub net: i64,
    pub cpu: i64,
}

impl Cost {
    pub const fn new(data: i64, net: i64, cpu: i64) -> Self {
        Self { data, net, cpu }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Gas units billed to the publisher for this cost.
    pub fn to_gas(&self) -> i64 {
        self.cpu.saturating_add(self.net)
    }

    /// Cost of a contract call carrying `args_len` bytes of arguments.
    pub fn call(args_len: usize) -> Self {
        Self::new(0, i64::try_from(args_len).unwrap_or(i64::MAX), CALL_CPU)
    }
}

/// Cost charged for passing `layers` validation steps, whether or not the
/// step fails.
pub const fn common_error_cost(layers: i64) -> Cost {
    Cost::new(0, 0, COMMON_OP_CPU * layers)
}

impl AddAssign for Cost {
    fn add_assign(&mut self, other: Cost) {
        self.data = self.data.saturating_add(other.data);
        self.net = self.net.saturating_add(other.net);
        self.cpu = self.cpu.saturating_add(other.cpu);
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(mut self, other: Cost) -> Cost {
        self += other;
        self
    }
}

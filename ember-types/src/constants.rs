use crate::fixed::Fixed;
use crate::primitives::Timestamp;

// ─── Token Parameters ────────────────────────────────────────────────────────

/// Number of fractional digits of every token amount crossing the contract
/// boundary.
pub const AMOUNT_DECIMALS: u32 = 8;

/// One whole token in smallest units (10^8).
pub const TOKEN_RATIO: i64 = 100_000_000;

/// Symbol of the native token moved by pledge and unpledge.
pub const NATIVE_TOKEN: &str = "ember";

// ─── Native Contracts ────────────────────────────────────────────────────────

/// The contract that owns pledged tokens and the gas ledger.
pub const GAS_CONTRACT_ID: &str = "gas.ember";

/// The fungible token contract the gas contract calls into.
pub const TOKEN_CONTRACT_ID: &str = "token.ember";

// ─── Gas Economics ───────────────────────────────────────────────────────────
//
// Each pledged token yields GAS_IMMEDIATE_REWARD_RATIO gas at once, then gas
// accrues at GAS_INCREASE_RATE per token per second until the stock reaches
// GAS_LIMIT_RATIO per token, which takes GAS_FULFILL_SECONDS from empty.
// Spending gas below the limit resumes accrual.

const RAW: i128 = TOKEN_RATIO as i128;

/// Every account with a non-zero pledge must keep at least this much pledged.
pub const GAS_MIN_PLEDGE_IN_TOKENS: i64 = 10;

/// [`GAS_MIN_PLEDGE_IN_TOKENS`] as a fixed-point amount.
pub const GAS_MIN_PLEDGE: Fixed =
    Fixed::from_raw(GAS_MIN_PLEDGE_IN_TOKENS as i128 * RAW, AMOUNT_DECIMALS);

/// Gas granted immediately per pledged token.
pub const GAS_IMMEDIATE_REWARD_RATIO: Fixed = Fixed::from_raw(300 * RAW, AMOUNT_DECIMALS);

/// Maximum gas stock per pledged token.
pub const GAS_LIMIT_RATIO: Fixed = Fixed::from_raw(900 * RAW, AMOUNT_DECIMALS);

/// Time for an empty stock to refill to the limit (3 days).
pub const GAS_FULFILL_SECONDS: i64 = 3 * 24 * 3600;

/// Gas accrued per pledged token per second:
/// `(GAS_LIMIT_RATIO - GAS_IMMEDIATE_REWARD_RATIO) / GAS_FULFILL_SECONDS`,
/// truncated at 8 fractional digits.
pub const GAS_INCREASE_RATE: Fixed = Fixed::from_raw(
    (900 * RAW - 300 * RAW) / GAS_FULFILL_SECONDS as i128,
    AMOUNT_DECIMALS,
);

/// Unpledged tokens stay frozen this long before they can be spent (3 days).
pub const UNPLEDGE_FREEZE_SECONDS: i64 = 3 * 24 * 3600;

/// Smallest amount a single pledge or unpledge may move.
pub const MIN_PLEDGE_AMOUNT: Fixed = Fixed::from_raw(RAW, AMOUNT_DECIMALS);

// ─── Time ────────────────────────────────────────────────────────────────────

pub const NANOS_PER_SECOND: Timestamp = 1_000_000_000;

/// Default lifetime of a signed transaction (90 seconds).
pub const DEFAULT_TX_EXPIRATION: Timestamp = 90 * NANOS_PER_SECOND;

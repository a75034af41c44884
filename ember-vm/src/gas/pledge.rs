use ember_storage::gas_store::GasLedger;
use ember_storage::traits::KvStore;
use ember_types::constants::{
    AMOUNT_DECIMALS, GAS_IMMEDIATE_REWARD_RATIO, GAS_INCREASE_RATE, GAS_LIMIT_RATIO,
    GAS_MIN_PLEDGE,
};
use ember_types::fixed::Fixed;
use ember_types::gas::GasInfo;
use ember_types::primitives::Timestamp;
use tracing::info;

use crate::error::VmError;
use crate::gas::refresh::refresh_gas;

/// Validate a pledge (`amount > 0`) or unpledge (`amount < 0`) against the
/// stored entry without writing anything. Returns the resulting total pledge.
///
/// Every non-zero resulting pledge must reach [`GAS_MIN_PLEDGE`]; an unpledge
/// may only bring the pledge to exactly zero below that.
pub fn check_pledge<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    amount: &Fixed,
) -> Result<Fixed, VmError> {
    if amount.is_zero() {
        return Err(VmError::InvalidPledgeAmount {
            reason: "amount must not be zero".to_string(),
        });
    }
    let pledged = ledger.pledge(account)?;
    if amount.is_negative() && (ledger.update_time(account)? == 0 || pledged.is_zero()) {
        return Err(VmError::NoPriorPledge {
            account: account.to_string(),
        });
    }
    let remaining = pledged.add(amount)?;
    if !remaining.is_zero() && remaining < GAS_MIN_PLEDGE {
        return Err(VmError::PledgeBelowMinimum {
            remaining,
            minimum: GAS_MIN_PLEDGE,
        });
    }
    Ok(remaining)
}

/// Change `account`'s pledge by `amount` at time `now` and return the new
/// entry.
///
/// Rate and limit are recomputed from the resulting total pledge; the
/// transition is still validated against the stored values so a corrupted
/// entry is reported instead of overwritten. Pledging adds
/// `amount * GAS_IMMEDIATE_REWARD_RATIO` to the stock, unpledging never
/// changes it beyond clamping to the new limit. A full unpledge zeroes rate,
/// limit and stock and keeps the entry.
pub fn pledge<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    amount: &Fixed,
    now: Timestamp,
) -> Result<GasInfo, VmError> {
    let total = check_pledge(ledger, account, amount)?;
    let rate = total.multiply(&GAS_INCREASE_RATE)?;
    let limit = total.multiply(&GAS_LIMIT_RATIO)?;
    let gas_delta = if amount.is_positive() {
        amount.multiply(&GAS_IMMEDIATE_REWARD_RATIO)?
    } else {
        Fixed::zero(AMOUNT_DECIMALS)
    };

    let entry = if ledger.update_time(account)? == 0 {
        GasInfo {
            pledge: total,
            rate,
            limit,
            stock: gas_delta.min(limit),
            last_update_time: now,
        }
    } else {
        let stock = refresh_gas(ledger, account, now)?;
        let last_update_time = ledger.update_time(account)?;
        if total.is_zero() {
            let zero = Fixed::zero(AMOUNT_DECIMALS);
            GasInfo {
                pledge: zero,
                rate: zero,
                limit: zero,
                stock: zero,
                last_update_time,
            }
        } else {
            check_transitions(ledger, account, amount)?;
            GasInfo {
                pledge: total,
                rate,
                limit,
                stock: stock.add(&gas_delta)?.min(limit),
                last_update_time,
            }
        }
    };

    ledger.set_pledge(account, &entry.pledge)?;
    ledger.set_rate(account, &entry.rate)?;
    ledger.set_limit(account, &entry.limit)?;
    ledger.set_stock(account, &entry.stock)?;
    ledger.set_update_time(account, entry.last_update_time)?;

    info!(
        account,
        amount = %amount,
        pledge = %entry.pledge,
        rate = %entry.rate,
        limit = %entry.limit,
        stock = %entry.stock,
        "gas pledge changed"
    );
    Ok(entry)
}

/// The stored rate and limit moved by `amount`'s deltas must stay positive.
fn check_transitions<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    amount: &Fixed,
) -> Result<(), VmError> {
    let current = ledger.rate(account)?;
    let delta = amount.multiply(&GAS_INCREASE_RATE)?;
    if !current.add(&delta)?.is_positive() {
        return Err(VmError::InvalidRateTransition {
            account: account.to_string(),
            current,
            delta,
        });
    }
    let current = ledger.limit(account)?;
    let delta = amount.multiply(&GAS_LIMIT_RATIO)?;
    if !current.add(&delta)?.is_positive() {
        return Err(VmError::InvalidLimitTransition {
            account: account.to_string(),
            current,
            delta,
        });
    }
    Ok(())
}

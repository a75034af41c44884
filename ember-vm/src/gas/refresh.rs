use ember_storage::gas_store::GasLedger;
use ember_storage::traits::KvStore;
use ember_types::constants::NANOS_PER_SECOND;
use ember_types::error::EmberError;
use ember_types::fixed::Fixed;
use ember_types::gas::GasInfo;
use ember_types::primitives::Timestamp;
use tracing::trace;

use crate::error::VmError;

/// Apply accrual since `info.last_update_time` to an in-memory snapshot.
///
/// `stock` grows by `rate` per elapsed second and is clamped to `limit`.
/// Accrual is computed on nanoseconds with a single truncation, so splitting
/// an interval never yields more than refreshing once. A never-pledged entry
/// and a clock at or before the last update are left unchanged.
pub fn accrue(info: &GasInfo, now: Timestamp) -> Result<GasInfo, VmError> {
    if !info.is_initialized() || now <= info.last_update_time {
        return Ok(info.clone());
    }
    let elapsed = i128::from(now) - i128::from(info.last_update_time);
    let grown = info
        .stock
        .add(&info.rate.mul_ratio(elapsed, i128::from(NANOS_PER_SECOND))?)?;
    Ok(GasInfo {
        stock: grown.min(info.limit),
        last_update_time: now,
        ..info.clone()
    })
}

/// Bring `account`'s stored stock up to `now` and return it.
pub fn refresh_gas<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    now: Timestamp,
) -> Result<Fixed, VmError> {
    let info = ledger.load(account)?;
    let refreshed = accrue(&info, now)?;
    if refreshed.last_update_time != info.last_update_time {
        ledger.set_stock(account, &refreshed.stock)?;
        ledger.set_update_time(account, refreshed.last_update_time)?;
        trace!(account, stock = %refreshed.stock, now, "gas refreshed");
    }
    Ok(refreshed.stock)
}

/// Refresh, then debit `amount` gas from `account`'s stock.
/// Returns the remaining stock.
pub fn pay_gas<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    amount: &Fixed,
    now: Timestamp,
) -> Result<Fixed, VmError> {
    if amount.is_negative() {
        return Err(VmError::Arithmetic(EmberError::InvalidAmount {
            reason: format!("cannot pay negative gas {amount}"),
        }));
    }
    let stock = refresh_gas(ledger, account, now)?;
    if stock < *amount {
        return Err(VmError::InsufficientGas {
            account: account.to_string(),
            available: stock,
            required: *amount,
        });
    }
    let remaining = stock.sub(amount)?;
    ledger.set_stock(account, &remaining)?;
    Ok(remaining)
}

/// Read-only view of `account`'s gas entry as of `now`.
pub fn gas_info<S: KvStore>(
    ledger: &GasLedger<S>,
    account: &str,
    now: Timestamp,
) -> Result<GasInfo, VmError> {
    accrue(&ledger.load(account)?, now)
}

//! The `gas.ember` native contract: `PledgeGas` and `UnpledgeGas`.

use ember_types::account::validate_account_id;
use ember_types::constants::{
    AMOUNT_DECIMALS, GAS_CONTRACT_ID, MIN_PLEDGE_AMOUNT, NANOS_PER_SECOND, NATIVE_TOKEN,
    TOKEN_CONTRACT_ID, UNPLEDGE_FREEZE_SECONDS,
};
use ember_types::error::EmberError;
use ember_types::fixed::Fixed;
use ember_types::primitives::AccountId;
use tracing::{info, warn};

use crate::abi::{encode_values, Abi, AbiArgs, AbiSet, ArgType, Args, Value};
use crate::cost::{common_error_cost, Cost, PLEDGE_FOR_GAS_COST};
use crate::error::VmError;
use crate::gas::pledge::{check_pledge, pledge};
use crate::host::Host;

pub const CONTRACT_ID: &str = GAS_CONTRACT_ID;

/// Permission an account must grant to move its tokens.
pub const TRANSFER_PERMISSION: &str = "transfer";

const STRING3: &[ArgType] = &[ArgType::String, ArgType::String, ArgType::String];

/// Arguments of `PledgeGas`: who pays, who receives the gas, how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PledgeGasArgs {
    pub payer: AccountId,
    pub gas_user: AccountId,
    pub amount: String,
}

impl AbiArgs for PledgeGasArgs {
    const TYPES: &'static [ArgType] = STRING3;

    fn from_args(args: &mut Args) -> Result<Self, VmError> {
        Ok(Self {
            payer: args.string()?,
            gas_user: args.string()?,
            amount: args.string()?,
        })
    }
}

/// Arguments of `UnpledgeGas`: whose pledge shrinks, who gets the frozen
/// tokens, how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpledgeGasArgs {
    pub gas_user: AccountId,
    pub receiver: AccountId,
    pub amount: String,
}

impl AbiArgs for UnpledgeGasArgs {
    const TYPES: &'static [ArgType] = STRING3;

    fn from_args(args: &mut Args) -> Result<Self, VmError> {
        Ok(Self {
            gas_user: args.string()?,
            receiver: args.string()?,
            amount: args.string()?,
        })
    }
}

pub fn abis() -> AbiSet {
    AbiSet::new()
        .with(Abi::new("constructor", constructor))
        .with(Abi::new("init", init))
        .with(Abi::new("PledgeGas", pledge_gas))
        .with(Abi::new("UnpledgeGas", unpledge_gas))
}

fn constructor(_: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
    *cost += common_error_cost(1);
    Ok(Vec::new())
}

fn init(_: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
    *cost += common_error_cost(1);
    Ok(Vec::new())
}

/// Parse a pledge/unpledge amount: a positive decimal with at most 8
/// fractional digits, no smaller than [`MIN_PLEDGE_AMOUNT`].
pub fn parse_pledge_amount(raw: &str) -> Result<Fixed, VmError> {
    let amount = Fixed::parse(raw, AMOUNT_DECIMALS).map_err(|e| VmError::InvalidPledgeAmount {
        reason: format!("{raw:?}: {e}"),
    })?;
    if !amount.is_positive() {
        return Err(VmError::InvalidPledgeAmount {
            reason: format!("{raw:?} is not positive"),
        });
    }
    if amount < MIN_PLEDGE_AMOUNT {
        return Err(VmError::InvalidPledgeAmount {
            reason: format!("{amount} is below the minimum of {MIN_PLEDGE_AMOUNT}"),
        });
    }
    Ok(amount)
}

fn require_transfer_auth(host: &Host, cost: &mut Cost, account: &str) -> Result<(), VmError> {
    let (authorized, c) = host.require_auth(account, TRANSFER_PERMISSION);
    *cost += c;
    if !authorized {
        return Err(VmError::PermissionDenied {
            account: account.to_string(),
            permission: TRANSFER_PERMISSION.to_string(),
        });
    }
    Ok(())
}

/// Move `amount` from the payer to this contract, then pledge it for the gas
/// user. Everything that can be checked without writing is checked before
/// the transfer, so a failure leaves no state behind.
fn pledge_gas(
    host: &mut Host,
    cost: &mut Cost,
    args: PledgeGasArgs,
) -> Result<Vec<Value>, VmError> {
    *cost += common_error_cost(2);
    validate_account_id(&args.gas_user)?;
    require_transfer_auth(host, cost, &args.payer)?;

    let parsed = parse_pledge_amount(&args.amount);
    *cost += common_error_cost(1);
    let amount = parsed?;
    check_pledge(&host.gas_ledger(), &args.gas_user, &amount)?;

    let (contract, c) = host.contract_name();
    *cost += c;
    let call_args = encode_values(&[
        Value::String(NATIVE_TOKEN.to_string()),
        Value::String(args.payer.clone()),
        Value::String(contract),
        Value::String(amount.to_string()),
    ]);
    let (result, c) = host.call(TOKEN_CONTRACT_ID, "transfer", &call_args);
    *cost += c;
    result.map_err(|e| VmError::TransferFailed {
        ledger_mutated: false,
        reason: e.to_string(),
    })?;

    let result = pledge(&host.gas_ledger(), &args.gas_user, &amount, host.current_time());
    *cost += PLEDGE_FOR_GAS_COST;
    result?;
    info!(payer = %args.payer, gas_user = %args.gas_user, amount = %amount, "PledgeGas");
    Ok(Vec::new())
}

/// Shrink the gas user's pledge, then send the amount back to the receiver
/// as a transfer frozen for [`UNPLEDGE_FREEZE_SECONDS`].
///
/// The ledger is written before the frozen transfer. If that transfer fails
/// the error is `TransferFailed { ledger_mutated: true }` and only discarding
/// the enclosing transaction restores consistency.
fn unpledge_gas(
    host: &mut Host,
    cost: &mut Cost,
    args: UnpledgeGasArgs,
) -> Result<Vec<Value>, VmError> {
    *cost += common_error_cost(2);
    validate_account_id(&args.gas_user)?;
    validate_account_id(&args.receiver)?;
    require_transfer_auth(host, cost, &args.gas_user)?;

    let parsed = parse_pledge_amount(&args.amount);
    *cost += common_error_cost(1);
    let amount = parsed?;

    let now = host.current_time();
    let result = pledge(&host.gas_ledger(), &args.gas_user, &amount.neg()?, now);
    *cost += PLEDGE_FOR_GAS_COST;
    result?;

    let (contract, c) = host.contract_name();
    *cost += c;
    let release_time = UNPLEDGE_FREEZE_SECONDS
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|freeze| now.checked_add(freeze))
        .ok_or(EmberError::Overflow {
            op: "release time",
        })?;
    let call_args = encode_values(&[
        Value::String(NATIVE_TOKEN.to_string()),
        Value::String(contract),
        Value::String(args.receiver.clone()),
        Value::String(amount.to_string()),
        Value::Number(release_time),
    ]);
    let (result, c) = host.call_with_auth(TOKEN_CONTRACT_ID, "transferFreeze", &call_args);
    *cost += c;
    if let Err(e) = result {
        warn!(gas_user = %args.gas_user, error = %e, "frozen transfer failed after unpledge");
        return Err(VmError::TransferFailed {
            ledger_mutated: true,
            reason: e.to_string(),
        });
    }
    info!(
        gas_user = %args.gas_user,
        receiver = %args.receiver,
        amount = %amount,
        release_time,
        "UnpledgeGas"
    );
    Ok(Vec::new())
}

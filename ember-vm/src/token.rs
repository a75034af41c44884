//! The `token.ember` native contract: balances, immediate transfers, and
//! frozen transfers that mature at a release time.
//!
//! Matured freeze records are credited lazily, whenever the owner's balance
//! is touched.

use ember_storage::token_store::TokenStore;
use ember_storage::traits::KvStore;
use ember_types::account::validate_account_id;
use ember_types::constants::{AMOUNT_DECIMALS, TOKEN_CONTRACT_ID};
use ember_types::fixed::Fixed;
use ember_types::primitives::{AccountId, Timestamp};
use ember_types::token::FreezeRecord;
use tracing::debug;

use crate::abi::{Abi, AbiArgs, AbiSet, ArgType, Args, Value};
use crate::cost::{Cost, BALANCE_OF_COST, TRANSFER_COST, TRANSFER_FREEZE_COST};
use crate::error::VmError;
use crate::gas::contract::TRANSFER_PERMISSION;
use crate::host::Host;

pub const CONTRACT_ID: &str = TOKEN_CONTRACT_ID;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub token: String,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: String,
}

impl AbiArgs for TransferArgs {
    const TYPES: &'static [ArgType] = &[
        ArgType::String,
        ArgType::String,
        ArgType::String,
        ArgType::String,
    ];

    fn from_args(args: &mut Args) -> Result<Self, VmError> {
        Ok(Self {
            token: args.string()?,
            from: args.string()?,
            to: args.string()?,
            amount: args.string()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFreezeArgs {
    pub token: String,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: String,
    /// Nanosecond timestamp at which `to` may spend the amount.
    pub release_time: Timestamp,
}

impl AbiArgs for TransferFreezeArgs {
    const TYPES: &'static [ArgType] = &[
        ArgType::String,
        ArgType::String,
        ArgType::String,
        ArgType::String,
        ArgType::Number,
    ];

    fn from_args(args: &mut Args) -> Result<Self, VmError> {
        Ok(Self {
            token: args.string()?,
            from: args.string()?,
            to: args.string()?,
            amount: args.string()?,
            release_time: args.number()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceOfArgs {
    pub token: String,
    pub owner: AccountId,
}

impl AbiArgs for BalanceOfArgs {
    const TYPES: &'static [ArgType] = &[ArgType::String, ArgType::String];

    fn from_args(args: &mut Args) -> Result<Self, VmError> {
        Ok(Self {
            token: args.string()?,
            owner: args.string()?,
        })
    }
}

pub fn abis() -> AbiSet {
    AbiSet::new()
        .with(Abi::new("transfer", transfer))
        .with(Abi::new("transferFreeze", transfer_freeze))
        .with(Abi::new("balanceOf", balance_of))
}

/// Credit matured freezes of `owner` and return the resulting balance.
pub fn release_matured<S: KvStore>(
    tokens: &TokenStore<S>,
    token: &str,
    owner: &str,
    now: Timestamp,
) -> Result<Fixed, VmError> {
    let released = tokens.take_released(token, owner, now)?;
    let mut balance = tokens.balance(token, owner)?;
    if !released.is_empty() {
        for record in &released {
            balance = balance.add(&record.amount)?;
        }
        tokens.set_balance(token, owner, &balance)?;
        debug!(token, owner, count = released.len(), balance = %balance, "freezes released");
    }
    Ok(balance)
}

/// Balance `owner` could spend at `now`, counting matured freezes, without
/// writing.
pub fn spendable_balance<S: KvStore>(
    tokens: &TokenStore<S>,
    token: &str,
    owner: &str,
    now: Timestamp,
) -> Result<Fixed, VmError> {
    let mut balance = tokens.balance(token, owner)?;
    for record in tokens.freezes(token, owner)? {
        if record.is_released(now) {
            balance = balance.add(&record.amount)?;
        }
    }
    Ok(balance)
}

/// Amount still frozen for `owner` at `now`.
pub fn frozen_balance<S: KvStore>(
    tokens: &TokenStore<S>,
    token: &str,
    owner: &str,
    now: Timestamp,
) -> Result<Fixed, VmError> {
    let mut frozen = Fixed::zero(AMOUNT_DECIMALS);
    for record in tokens.freezes(token, owner)? {
        if !record.is_released(now) {
            frozen = frozen.add(&record.amount)?;
        }
    }
    Ok(frozen)
}

fn debit<S: KvStore>(
    tokens: &TokenStore<S>,
    token: &str,
    owner: &str,
    amount: &Fixed,
    now: Timestamp,
) -> Result<(), VmError> {
    let balance = release_matured(tokens, token, owner, now)?;
    if balance < *amount {
        return Err(VmError::InsufficientBalance {
            account: owner.to_string(),
            balance,
            required: *amount,
        });
    }
    tokens.set_balance(token, owner, &balance.sub(amount)?)?;
    Ok(())
}

/// Balance keys are `token:owner` joined by `:`, so an owner must be a
/// registered contract or a well-formed account name.
fn check_holder(host: &Host, id: &str) -> Result<(), VmError> {
    if host.is_contract(id) {
        return Ok(());
    }
    validate_account_id(id)?;
    Ok(())
}

fn authorize_sender(host: &Host, cost: &mut Cost, from: &str) -> Result<(), VmError> {
    let (authorized, c) = host.require_auth(from, TRANSFER_PERMISSION);
    *cost += c;
    if !authorized {
        return Err(VmError::PermissionDenied {
            account: from.to_string(),
            permission: TRANSFER_PERMISSION.to_string(),
        });
    }
    Ok(())
}

fn transfer(host: &mut Host, cost: &mut Cost, args: TransferArgs) -> Result<Vec<Value>, VmError> {
    *cost += TRANSFER_COST;
    check_holder(host, &args.from)?;
    check_holder(host, &args.to)?;
    let amount = Fixed::parse_positive(&args.amount, AMOUNT_DECIMALS)?;
    authorize_sender(host, cost, &args.from)?;

    let now = host.current_time();
    let tokens = host.token_store();
    debit(&tokens, &args.token, &args.from, &amount, now)?;
    let balance = release_matured(&tokens, &args.token, &args.to, now)?;
    tokens.set_balance(&args.token, &args.to, &balance.add(&amount)?)?;
    debug!(token = %args.token, from = %args.from, to = %args.to, amount = %amount, "transfer");
    Ok(Vec::new())
}

fn transfer_freeze(
    host: &mut Host,
    cost: &mut Cost,
    args: TransferFreezeArgs,
) -> Result<Vec<Value>, VmError> {
    *cost += TRANSFER_FREEZE_COST;
    check_holder(host, &args.from)?;
    check_holder(host, &args.to)?;
    let amount = Fixed::parse_positive(&args.amount, AMOUNT_DECIMALS)?;
    authorize_sender(host, cost, &args.from)?;

    let now = host.current_time();
    let tokens = host.token_store();
    debit(&tokens, &args.token, &args.from, &amount, now)?;
    tokens.push_freeze(
        &args.token,
        &args.to,
        FreezeRecord {
            amount,
            release_time: args.release_time,
        },
    )?;
    debug!(
        token = %args.token,
        from = %args.from,
        to = %args.to,
        amount = %amount,
        release_time = args.release_time,
        "transferFreeze"
    );
    Ok(Vec::new())
}

fn balance_of(
    host: &mut Host,
    cost: &mut Cost,
    args: BalanceOfArgs,
) -> Result<Vec<Value>, VmError> {
    *cost += BALANCE_OF_COST;
    check_holder(host, &args.owner)?;
    let now = host.current_time();
    let balance = release_matured(&host.token_store(), &args.token, &args.owner, now)?;
    Ok(vec![Value::String(balance.to_string())])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ember_storage::auth_store::AuthStore;
    use ember_storage::memory::MemoryStore;
    use ember_types::auth::AccountAuth;
    use ember_types::primitives::Algorithm;

    use super::*;
    use crate::abi::ContractRegistry;
    use crate::context::ExecutionContext;
    use crate::host::SharedStore;

    const ALICE_KEY: [u8; 32] = [1; 32];

    fn amount(s: &str) -> Fixed {
        s.parse().unwrap()
    }

    fn setup(now: Timestamp) -> (SharedStore, Host) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        AuthStore::new(Arc::clone(&store))
            .save("alice", &AccountAuth::single_key(Algorithm::Ed25519, ALICE_KEY.to_vec()))
            .unwrap();
        TokenStore::new(Arc::clone(&store))
            .set_balance("ember", "alice", &amount("100"))
            .unwrap();
        let host = Host::new(
            Arc::clone(&store),
            Arc::new(ContractRegistry::with_natives()),
            ExecutionContext::new(now, "alice", [0; 32]),
            vec![(Algorithm::Ed25519, ALICE_KEY.to_vec())],
        );
        (store, host)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (store, mut host) = setup(1_000);
        let (result, cost) =
            host.call(CONTRACT_ID, "transfer", r#"["ember","alice","bobby","12.5"]"#);
        result.unwrap();
        assert!(cost.cpu >= TRANSFER_COST.cpu);

        let tokens = TokenStore::new(store);
        assert_eq!(tokens.balance("ember", "alice").unwrap(), amount("87.5"));
        assert_eq!(tokens.balance("ember", "bobby").unwrap(), amount("12.5"));
    }

    #[test]
    fn test_transfer_requires_sender_auth() {
        let (store, mut host) = setup(1_000);
        TokenStore::new(Arc::clone(&store))
            .set_balance("ember", "bobby", &amount("5"))
            .unwrap();
        let (result, _) = host.call(CONTRACT_ID, "transfer", r#"["ember","bobby","alice","1"]"#);
        assert!(matches!(
            result,
            Err(VmError::PermissionDenied { account, .. }) if account == "bobby"
        ));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (store, mut host) = setup(1_000);
        let (result, _) =
            host.call(CONTRACT_ID, "transfer", r#"["ember","alice","bobby","100.1"]"#);
        assert!(matches!(result, Err(VmError::InsufficientBalance { .. })));
        assert_eq!(
            TokenStore::new(store).balance("ember", "alice").unwrap(),
            amount("100")
        );
    }

    #[test]
    fn test_transfer_rejects_bad_amount() {
        let (_, mut host) = setup(1_000);
        for bad in ["0", "-1", "x", "0.000000001"] {
            let args = format!(r#"["ember","alice","bobby","{bad}"]"#);
            assert!(host.call(CONTRACT_ID, "transfer", &args).0.is_err(), "{bad}");
        }
    }

    #[test]
    fn test_freeze_released_lazily() {
        let (store, mut host) = setup(1_000);
        let (result, _) = host.call(
            CONTRACT_ID,
            "transferFreeze",
            r#"["ember","alice","bobby","30",5000]"#,
        );
        result.unwrap();

        let tokens = TokenStore::new(Arc::clone(&store));
        assert_eq!(tokens.balance("ember", "alice").unwrap(), amount("70"));
        assert!(tokens.balance("ember", "bobby").unwrap().is_zero());
        assert_eq!(frozen_balance(&tokens, "ember", "bobby", 4_999).unwrap(), amount("30"));
        assert!(spendable_balance(&tokens, "ember", "bobby", 4_999).unwrap().is_zero());
        assert_eq!(spendable_balance(&tokens, "ember", "bobby", 5_000).unwrap(), amount("30"));

        // Still frozen at the host's time.
        let (result, _) = host.call(CONTRACT_ID, "balanceOf", r#"["ember","bobby"]"#);
        assert_eq!(result.unwrap(), vec![Value::String("0".into())]);

        assert_eq!(release_matured(&tokens, "ember", "bobby", 5_000).unwrap(), amount("30"));
        assert!(tokens.freezes("ember", "bobby").unwrap().is_empty());
        assert_eq!(tokens.balance("ember", "bobby").unwrap(), amount("30"));
    }

    #[test]
    fn test_holder_names_cannot_alias_keys() {
        let (store, mut host) = setup(1_000);
        for args in [
            r#"["ember","alice","x:y","1"]"#,
            r#"["ember","alice","Bobby","1"]"#,
            r#"["ember","a:b","alice","1"]"#,
        ] {
            let (result, _) = host.call(CONTRACT_ID, "transfer", args);
            assert!(
                matches!(result, Err(VmError::InvalidAccountId { .. })),
                "{args}"
            );
        }
        let (result, _) = host.call(
            CONTRACT_ID,
            "transferFreeze",
            r#"["ember","alice","x:y","1",5000]"#,
        );
        assert!(matches!(result, Err(VmError::InvalidAccountId { .. })));
        let (result, _) = host.call(CONTRACT_ID, "balanceOf", r#"["ember:x","y:z"]"#);
        assert!(matches!(result, Err(VmError::InvalidAccountId { .. })));

        let tokens = TokenStore::new(store);
        assert_eq!(tokens.balance("ember", "alice").unwrap(), amount("100"));
        assert!(tokens.balance("ember:x", "y").unwrap().is_zero());
    }

    #[test]
    fn test_contract_can_hold_tokens() {
        let (store, mut host) = setup(1_000);
        let (result, _) = host.call(
            CONTRACT_ID,
            "transfer",
            r#"["ember","alice","gas.ember","10"]"#,
        );
        result.unwrap();
        assert_eq!(
            TokenStore::new(store).balance("ember", "gas.ember").unwrap(),
            amount("10")
        );
    }

    #[test]
    fn test_freeze_requires_number_release_time() {
        let (_, mut host) = setup(1_000);
        let (result, _) = host.call(
            CONTRACT_ID,
            "transferFreeze",
            r#"["ember","alice","bobby","30","5000"]"#,
        );
        assert!(matches!(
            result,
            Err(VmError::InvalidArgumentEncoding { position: 4, .. })
        ));
    }
}

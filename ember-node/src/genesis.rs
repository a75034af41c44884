use std::collections::BTreeSet;
use std::sync::Arc;

use ember_storage::auth_store::AuthStore;
use ember_storage::codec::{make_key, put_value};
use ember_storage::gas_store::GasLedger;
use ember_storage::overlay::OverlayStore;
use ember_storage::token_store::TokenStore;
use ember_storage::traits::{BatchWriter, KvStore};
use ember_types::account::validate_account_id;
use ember_types::auth::AccountAuth;
use ember_types::constants::{AMOUNT_DECIMALS, GAS_CONTRACT_ID, NATIVE_TOKEN};
use ember_types::fixed::Fixed;
use ember_vm::gas::pledge;
use tracing::info;

use crate::config::{GenesisAccount, GenesisConfig};
use crate::error::NodeError;

fn genesis_marker() -> Vec<u8> {
    make_key(b"meta", &["genesis"])
}

/// Whether genesis has already been applied to `store`.
pub fn is_initialized<S: KvStore>(store: &S) -> Result<bool, NodeError> {
    Ok(store.exists(&genesis_marker())?)
}

/// Seed permissions, balances and pledges for every genesis account.
///
/// All writes land in one batch; a bad entry leaves the store untouched.
/// Returns the number of accounts created.
pub fn apply_genesis<S: BatchWriter + 'static>(
    store: &Arc<S>,
    genesis: &GenesisConfig,
) -> Result<usize, NodeError> {
    if is_initialized(store)? {
        return Err(genesis_error("state is already initialized"));
    }

    let overlay = Arc::new(OverlayStore::new(Arc::clone(store)));
    let auths = AuthStore::new(Arc::clone(&overlay));
    let tokens = TokenStore::new(Arc::clone(&overlay));
    let ledger = GasLedger::new(Arc::clone(&overlay));

    let mut seen = BTreeSet::new();
    let mut locked = Fixed::zero(AMOUNT_DECIMALS);
    for account in &genesis.accounts {
        check_account(account, genesis)?;
        if !seen.insert(account.id.as_str()) {
            return Err(genesis_error(&format!("duplicate account '{}'", account.id)));
        }
        let pubkey = hex::decode(&account.pubkey).map_err(|e| {
            genesis_error(&format!("public key of '{}' is not hex: {e}", account.id))
        })?;

        auths.save(&account.id, &AccountAuth::single_key(account.algorithm, pubkey))?;
        tokens.set_balance(NATIVE_TOKEN, &account.id, &account.balance.sub(&account.pledge)?)?;
        if !account.pledge.is_zero() {
            pledge(&ledger, &account.id, &account.pledge, genesis.time)?;
            locked = locked.add(&account.pledge)?;
        }
        info!(
            account = %account.id,
            balance = %account.balance,
            pledge = %account.pledge,
            "genesis account"
        );
    }

    let contract_balance = tokens.balance(NATIVE_TOKEN, GAS_CONTRACT_ID)?.add(&locked)?;
    tokens.set_balance(NATIVE_TOKEN, GAS_CONTRACT_ID, &contract_balance)?;
    put_value(overlay.as_ref(), &genesis_marker(), &genesis.time)?;
    overlay.commit()?;

    info!(accounts = genesis.accounts.len(), locked = %locked, "genesis applied");
    Ok(genesis.accounts.len())
}

fn check_account(account: &GenesisAccount, genesis: &GenesisConfig) -> Result<(), NodeError> {
    validate_account_id(&account.id)?;
    if account.balance.is_negative() || account.pledge.is_negative() {
        return Err(genesis_error(&format!(
            "'{}' has a negative allocation",
            account.id
        )));
    }
    if account.balance < account.pledge {
        return Err(genesis_error(&format!(
            "'{}' pledges {} out of a balance of {}",
            account.id, account.pledge, account.balance
        )));
    }
    if !account.pledge.is_zero() && genesis.time <= 0 {
        return Err(genesis_error("genesis time must be positive when pledging"));
    }
    Ok(())
}

fn genesis_error(reason: &str) -> NodeError {
    NodeError::GenesisError {
        reason: reason.to_string(),
    }
}

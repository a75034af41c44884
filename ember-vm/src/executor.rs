use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};
use ember_crypto::keys::verify;
use ember_storage::auth_store::AuthStore;
use ember_storage::codec::{get_value, make_key, put_value};
use ember_storage::gas_store::GasLedger;
use ember_storage::overlay::OverlayStore;
use ember_storage::token_store::TokenStore;
use ember_storage::traits::BatchWriter;
use ember_types::auth::ACTIVE_PERMISSION;
use ember_types::constants::AMOUNT_DECIMALS;
use ember_types::fixed::Fixed;
use ember_types::gas::GasInfo;
use ember_types::primitives::{Algorithm, Hash, Timestamp};
use ember_types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::abi::{encode_values, ContractRegistry};
use crate::context::ExecutionContext;
use crate::cost::Cost;
use crate::error::VmError;
use crate::gas::{gas_info, pay_gas};
use crate::host::{Host, SharedStore};
use crate::token;

const RECEIPT_PREFIX: &[u8] = b"receipt:";

#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum TxStatus {
    Success,
    Failed { reason: String },
}

/// Outcome of one executed transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TxReceipt {
    pub tx_hash: Hash,
    pub status: TxStatus,
    /// Everything consumed up to completion or the failing step.
    pub cost: Cost,
    /// Gas debited from the publisher, capped at the transaction's gas limit.
    pub gas_used: i64,
    /// JSON-encoded results of each action; empty on failure.
    pub returns: Vec<String>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// Runs transactions against a store with all-or-nothing semantics.
///
/// Actions execute inside an [`OverlayStore`]. On success the overlay, the
/// gas payment, and the receipt commit as one batch; on any failure the
/// overlay is discarded and only the gas payment and receipt are committed.
/// Failed transactions are charged for the cost they accumulated.
pub struct Executor<S: BatchWriter + 'static> {
    store: Arc<S>,
    registry: Arc<ContractRegistry>,
}

impl<S: BatchWriter + 'static> Executor<S> {
    /// An executor with the native gas and token contracts.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_registry(store, Arc::new(ContractRegistry::with_natives()))
    }

    pub fn with_registry(store: Arc<S>, registry: Arc<ContractRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stateless and authority checks that must pass before anything runs.
    /// Returns the verified signers.
    pub fn verify(
        &self,
        tx: &Transaction,
        now: Timestamp,
    ) -> Result<Vec<(Algorithm, Vec<u8>)>, VmError> {
        let invalid = |reason: String| VmError::InvalidTransaction { reason };
        if tx.gas_limit <= 0 {
            return Err(invalid(format!("gas limit must be positive, got {}", tx.gas_limit)));
        }
        if now > tx.expiration {
            return Err(invalid(format!("expired at {}", tx.expiration)));
        }
        if tx.actions.is_empty() {
            return Err(invalid("no actions".to_string()));
        }
        if tx.signatures.is_empty() {
            return Err(invalid("unsigned".to_string()));
        }

        let message = tx.signing_data();
        let mut signers = Vec::with_capacity(tx.signatures.len());
        for (i, sig) in tx.signatures.iter().enumerate() {
            verify(sig.algorithm, &message, &sig.signature, &sig.pubkey)
                .map_err(|e| invalid(format!("signature {i}: {e}")))?;
            signers.push((sig.algorithm, sig.pubkey.clone()));
        }

        let authorized = AuthStore::new(Arc::clone(&self.store))
            .load(&tx.publisher)?
            .is_some_and(|auth| auth.authorizes(ACTIVE_PERMISSION, &signers));
        if !authorized {
            return Err(VmError::PermissionDenied {
                account: tx.publisher.clone(),
                permission: ACTIVE_PERMISSION.to_string(),
            });
        }
        Ok(signers)
    }

    /// Execute `tx` at block time `now`.
    ///
    /// `Err` means the transaction was rejected before running: nothing is
    /// written and nothing is charged. Execution failures produce a receipt
    /// with [`TxStatus::Failed`].
    pub fn execute(&self, tx: &Transaction, now: Timestamp) -> Result<TxReceipt, VmError> {
        let signers = self.verify(tx, now)?;
        let tx_hash = tx.hash();
        if self.receipt(&tx_hash)?.is_some() {
            return Err(VmError::InvalidTransaction {
                reason: format!("{} already executed", hex::encode(tx_hash)),
            });
        }

        let required = Fixed::from_int(tx.gas_limit, AMOUNT_DECIMALS)?;
        let available = self.gas_info(&tx.publisher, now)?.stock;
        if available < required {
            return Err(VmError::InsufficientGas {
                account: tx.publisher.clone(),
                available,
                required,
            });
        }

        let ctx = ExecutionContext::new(now, tx.publisher.clone(), tx_hash);
        let short_hash = ctx.short_hash();
        let overlay = Arc::new(OverlayStore::new(Arc::clone(&self.store)));
        let shared: SharedStore = overlay.clone();
        let mut host = Host::new(shared, Arc::clone(&self.registry), ctx, signers);

        let mut cost = Cost::zero();
        let mut returns = Vec::with_capacity(tx.actions.len());
        let mut outcome = Ok(());
        for action in &tx.actions {
            let (result, c) = host.call(&action.contract, &action.action_name, &action.data);
            cost += c;
            match result {
                Ok(values) => returns.push(encode_values(&values)),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
            if cost.to_gas() > tx.gas_limit {
                outcome = Err(VmError::GasLimitExceeded {
                    used: cost.to_gas(),
                    limit: tx.gas_limit,
                });
                break;
            }
        }

        let gas_used = cost.to_gas().min(tx.gas_limit);
        let payment = Fixed::from_int(gas_used, AMOUNT_DECIMALS)?;
        if outcome.is_ok() {
            // Paid inside the overlay so that a transaction which shrank its
            // own stock below the bill fails like any other.
            let ledger = GasLedger::new(overlay.clone());
            if let Err(e) = pay_gas(&ledger, &tx.publisher, &payment, now) {
                outcome = Err(e);
            }
        }

        let status = match outcome {
            Ok(()) => TxStatus::Success,
            Err(e) => {
                overlay.discard()?;
                pay_gas(&GasLedger::new(overlay.clone()), &tx.publisher, &payment, now)?;
                returns.clear();
                if matches!(
                    e,
                    VmError::TransferFailed {
                        ledger_mutated: true,
                        ..
                    }
                ) {
                    warn!(tx = %short_hash, "discarding ledger writes made before a failed transfer");
                }
                warn!(tx = %short_hash, error = %e, gas_used, "transaction failed");
                TxStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let receipt = TxReceipt {
            tx_hash,
            status,
            cost,
            gas_used,
            returns,
        };
        put_value(overlay.as_ref(), &receipt_key(&tx_hash), &receipt)?;
        let writes = overlay.commit()?;
        info!(
            tx = %short_hash,
            publisher = %tx.publisher,
            success = receipt.is_success(),
            gas_used,
            writes,
            "transaction executed"
        );
        Ok(receipt)
    }

    /// Receipt of a previously executed transaction.
    pub fn receipt(&self, tx_hash: &Hash) -> Result<Option<TxReceipt>, VmError> {
        Ok(get_value(self.store.as_ref(), &receipt_key(tx_hash))?)
    }

    /// Refreshed view of an account's gas at `now`, without writing.
    pub fn gas_info(&self, account: &str, now: Timestamp) -> Result<GasInfo, VmError> {
        gas_info(&GasLedger::new(Arc::clone(&self.store)), account, now)
    }

    /// Spendable token balance at `now`, counting matured freezes.
    pub fn balance(&self, token: &str, owner: &str, now: Timestamp) -> Result<Fixed, VmError> {
        token::spendable_balance(&TokenStore::new(Arc::clone(&self.store)), token, owner, now)
    }

    /// Token amount still frozen at `now`.
    pub fn frozen_balance(
        &self,
        token: &str,
        owner: &str,
        now: Timestamp,
    ) -> Result<Fixed, VmError> {
        token::frozen_balance(&TokenStore::new(Arc::clone(&self.store)), token, owner, now)
    }
}

fn receipt_key(tx_hash: &Hash) -> Vec<u8> {
    make_key(RECEIPT_PREFIX, &[&hex::encode(tx_hash)])
}

#[cfg(test)]
mod tests {
    use ember_crypto::account::Account;
    use ember_storage::memory::MemoryStore;
    use ember_types::auth::AccountAuth;
    use ember_types::constants::NANOS_PER_SECOND;
    use ember_types::transaction::Action;

    use super::*;
    use crate::gas::pledge;

    const NOW: Timestamp = 1_700_000_000 * NANOS_PER_SECOND;

    fn setup() -> (Executor<MemoryStore>, Account) {
        let store = Arc::new(MemoryStore::new());
        let alice = Account::generate("alice", Algorithm::Ed25519);
        AuthStore::new(Arc::clone(&store))
            .save(
                "alice",
                &AccountAuth::single_key(alice.algorithm(), alice.public_key().unwrap()),
            )
            .unwrap();
        pledge(
            &GasLedger::new(Arc::clone(&store)),
            "alice",
            &"100".parse().unwrap(),
            NOW,
        )
        .unwrap();
        (Executor::new(store), alice)
    }

    fn balance_query(alice: &Account, time: Timestamp) -> Transaction {
        let tx = Transaction::new(
            "alice",
            vec![Action::new("token.ember", "balanceOf", r#"["ember","alice"]"#)],
            time,
            1_000,
        );
        alice.sign(&tx).unwrap()
    }

    #[test]
    fn test_successful_tx_charges_gas_and_stores_receipt() {
        let (executor, alice) = setup();
        let tx = balance_query(&alice, NOW);
        let receipt = executor.execute(&tx, NOW).unwrap();

        assert!(receipt.is_success());
        assert_eq!(receipt.returns, vec![r#"["0"]"#.to_string()]);
        assert!(receipt.gas_used > 0);
        assert_eq!(receipt.gas_used, receipt.cost.to_gas());

        let stock = executor.gas_info("alice", NOW).unwrap().stock;
        assert_eq!(
            stock,
            Fixed::from_int(30_000 - receipt.gas_used, AMOUNT_DECIMALS).unwrap()
        );
        assert_eq!(executor.receipt(&tx.hash()).unwrap(), Some(receipt));
    }

    #[test]
    fn test_replay_rejected() {
        let (executor, alice) = setup();
        let tx = balance_query(&alice, NOW);
        executor.execute(&tx, NOW).unwrap();
        assert!(matches!(
            executor.execute(&tx, NOW),
            Err(VmError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn test_rejections_write_nothing() {
        let (executor, alice) = setup();
        let before = executor.gas_info("alice", NOW).unwrap();

        let unsigned = Transaction::new("alice", vec![], NOW, 1_000);
        assert!(executor.execute(&unsigned, NOW).is_err());

        let expired = balance_query(&alice, NOW - 100 * NANOS_PER_SECOND);
        assert!(matches!(
            executor.execute(&expired, NOW),
            Err(VmError::InvalidTransaction { .. })
        ));

        let mallory = Account::generate("alice", Algorithm::Ed25519);
        let forged = balance_query(&mallory, NOW);
        assert!(matches!(
            executor.execute(&forged, NOW),
            Err(VmError::PermissionDenied { .. })
        ));

        let mut tampered = balance_query(&alice, NOW);
        tampered.gas_limit += 1;
        assert!(matches!(
            executor.execute(&tampered, NOW),
            Err(VmError::InvalidTransaction { .. })
        ));

        let greedy = alice
            .sign(&Transaction::new(
                "alice",
                vec![Action::new("token.ember", "balanceOf", r#"["ember","alice"]"#)],
                NOW,
                1_000_000,
            ))
            .unwrap();
        assert!(matches!(
            executor.execute(&greedy, NOW),
            Err(VmError::InsufficientGas { .. })
        ));

        assert_eq!(executor.gas_info("alice", NOW).unwrap(), before);
    }

    #[test]
    fn test_failed_action_discards_state_but_charges() {
        let (executor, alice) = setup();
        let tx = alice
            .sign(&Transaction::new(
                "alice",
                vec![
                    Action::new("token.ember", "balanceOf", r#"["ember","alice"]"#),
                    Action::new("token.ember", "transfer", r#"["ember","alice","bobby","1"]"#),
                ],
                NOW,
                1_000,
            ))
            .unwrap();
        let receipt = executor.execute(&tx, NOW).unwrap();

        assert!(matches!(
            receipt.status,
            TxStatus::Failed { ref reason } if reason.contains("insufficient balance")
        ));
        assert!(receipt.returns.is_empty());
        assert!(receipt.gas_used > 0);
        let stock = executor.gas_info("alice", NOW).unwrap().stock;
        assert_eq!(
            stock,
            Fixed::from_int(30_000 - receipt.gas_used, AMOUNT_DECIMALS).unwrap()
        );
    }

    #[test]
    fn test_gas_limit_exceeded() {
        let (executor, alice) = setup();
        let tx = alice
            .sign(&Transaction::new(
                "alice",
                vec![Action::new("token.ember", "balanceOf", r#"["ember","alice"]"#)],
                NOW,
                10,
            ))
            .unwrap();
        let receipt = executor.execute(&tx, NOW).unwrap();
        assert!(!receipt.is_success());
        assert_eq!(receipt.gas_used, 10);
    }
}

use ember_types::constants::AMOUNT_DECIMALS;
use ember_types::fixed::Fixed;
use ember_types::primitives::Timestamp;
use ember_types::token::FreezeRecord;

use crate::codec::{get_value, make_key, put_value};
use crate::error::StorageError;
use crate::traits::KvStore;

const BALANCE_PREFIX: &[u8] = b"token:balance:";
const FREEZE_PREFIX: &[u8] = b"token:freeze:";

/// Token balances and pending freeze records, keyed by (token, owner).
pub struct TokenStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Spendable balance; zero when absent.
    pub fn balance(&self, token: &str, owner: &str) -> Result<Fixed, StorageError> {
        Ok(get_value(&self.store, &make_key(BALANCE_PREFIX, &[token, owner]))?
            .unwrap_or(Fixed::zero(AMOUNT_DECIMALS)))
    }

    pub fn set_balance(&self, token: &str, owner: &str, value: &Fixed) -> Result<(), StorageError> {
        put_value(&self.store, &make_key(BALANCE_PREFIX, &[token, owner]), value)
    }

    /// Pending freeze records in insertion order.
    pub fn freezes(&self, token: &str, owner: &str) -> Result<Vec<FreezeRecord>, StorageError> {
        Ok(get_value(&self.store, &make_key(FREEZE_PREFIX, &[token, owner]))?.unwrap_or_default())
    }

    pub fn set_freezes(
        &self,
        token: &str,
        owner: &str,
        records: &[FreezeRecord],
    ) -> Result<(), StorageError> {
        let key = make_key(FREEZE_PREFIX, &[token, owner]);
        if records.is_empty() {
            return self.store.delete(&key);
        }
        put_value(&self.store, &key, &records.to_vec())
    }

    pub fn push_freeze(
        &self,
        token: &str,
        owner: &str,
        record: FreezeRecord,
    ) -> Result<(), StorageError> {
        let mut records = self.freezes(token, owner)?;
        records.push(record);
        self.set_freezes(token, owner, &records)
    }

    /// Split pending freezes into those released at `now` and those still
    /// frozen. The store keeps only the latter; callers credit the former.
    pub fn take_released(
        &self,
        token: &str,
        owner: &str,
        now: Timestamp,
    ) -> Result<Vec<FreezeRecord>, StorageError> {
        let (released, pending): (Vec<_>, Vec<_>) = self
            .freezes(token, owner)?
            .into_iter()
            .partition(|r| r.is_released(now));
        if !released.is_empty() {
            self.set_freezes(token, owner, &pending)?;
        }
        Ok(released)
    }
}

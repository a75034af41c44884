use ember_types::constants::AMOUNT_DECIMALS;
use ember_types::fixed::Fixed;
use ember_types::gas::GasInfo;
use ember_types::primitives::Timestamp;

use crate::codec::{get_value, make_key, put_value};
use crate::error::StorageError;
use crate::traits::KvStore;

const PLEDGE_PREFIX: &[u8] = b"gas:pledge:";
const RATE_PREFIX: &[u8] = b"gas:rate:";
const LIMIT_PREFIX: &[u8] = b"gas:limit:";
const STOCK_PREFIX: &[u8] = b"gas:stock:";
const UPDATE_TIME_PREFIX: &[u8] = b"gas:time:";

/// Per-account gas fields, one key per field.
///
/// Pure accessors: no field is validated against another here. Missing
/// values read as zero, so an account that never pledged has a zeroed entry
/// with `update_time == 0`.
pub struct GasLedger<S: KvStore> {
    store: S,
}

impl<S: KvStore> GasLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn get_fixed(&self, prefix: &[u8], account: &str) -> Result<Fixed, StorageError> {
        Ok(get_value(&self.store, &make_key(prefix, &[account]))?
            .unwrap_or(Fixed::zero(AMOUNT_DECIMALS)))
    }

    fn set_fixed(&self, prefix: &[u8], account: &str, value: &Fixed) -> Result<(), StorageError> {
        put_value(&self.store, &make_key(prefix, &[account]), value)
    }

    pub fn pledge(&self, account: &str) -> Result<Fixed, StorageError> {
        self.get_fixed(PLEDGE_PREFIX, account)
    }

    pub fn set_pledge(&self, account: &str, value: &Fixed) -> Result<(), StorageError> {
        self.set_fixed(PLEDGE_PREFIX, account, value)
    }

    pub fn rate(&self, account: &str) -> Result<Fixed, StorageError> {
        self.get_fixed(RATE_PREFIX, account)
    }

    pub fn set_rate(&self, account: &str, value: &Fixed) -> Result<(), StorageError> {
        self.set_fixed(RATE_PREFIX, account, value)
    }

    pub fn limit(&self, account: &str) -> Result<Fixed, StorageError> {
        self.get_fixed(LIMIT_PREFIX, account)
    }

    pub fn set_limit(&self, account: &str, value: &Fixed) -> Result<(), StorageError> {
        self.set_fixed(LIMIT_PREFIX, account, value)
    }

    pub fn stock(&self, account: &str) -> Result<Fixed, StorageError> {
        self.get_fixed(STOCK_PREFIX, account)
    }

    pub fn set_stock(&self, account: &str, value: &Fixed) -> Result<(), StorageError> {
        self.set_fixed(STOCK_PREFIX, account, value)
    }

    /// Nanosecond timestamp of the last refresh, 0 if never pledged.
    pub fn update_time(&self, account: &str) -> Result<Timestamp, StorageError> {
        Ok(get_value(&self.store, &make_key(UPDATE_TIME_PREFIX, &[account]))?.unwrap_or(0))
    }

    pub fn set_update_time(&self, account: &str, time: Timestamp) -> Result<(), StorageError> {
        put_value(&self.store, &make_key(UPDATE_TIME_PREFIX, &[account]), &time)
    }

    /// All five fields as stored, without refreshing.
    pub fn load(&self, account: &str) -> Result<GasInfo, StorageError> {
        Ok(GasInfo {
            pledge: self.pledge(account)?,
            rate: self.rate(account)?,
            limit: self.limit(account)?,
            stock: self.stock(account)?,
            last_update_time: self.update_time(account)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn amount(s: &str) -> Fixed {
        s.parse().unwrap()
    }

    #[test]
    fn test_unknown_account_reads_zero() {
        let ledger = GasLedger::new(MemoryStore::new());
        let info = ledger.load("alice").unwrap();
        assert!(info.pledge.is_zero());
        assert!(info.rate.is_zero());
        assert!(info.limit.is_zero());
        assert!(info.stock.is_zero());
        assert_eq!(info.last_update_time, 0);
        assert!(!info.is_initialized());
    }

    #[test]
    fn test_fields_are_independent() {
        let ledger = GasLedger::new(MemoryStore::new());
        ledger.set_pledge("alice", &amount("10")).unwrap();
        ledger.set_rate("alice", &amount("0.0231481")).unwrap();
        ledger.set_limit("alice", &amount("9000")).unwrap();
        ledger.set_stock("alice", &amount("3000")).unwrap();
        ledger.set_update_time("alice", 1_000).unwrap();

        let info = ledger.load("alice").unwrap();
        assert_eq!(info.pledge, amount("10"));
        assert_eq!(info.rate, amount("0.0231481"));
        assert_eq!(info.limit, amount("9000"));
        assert_eq!(info.stock, amount("3000"));
        assert_eq!(info.last_update_time, 1_000);

        // Other accounts unaffected.
        assert!(ledger.pledge("bobby").unwrap().is_zero());
    }

    #[test]
    fn test_no_validation_between_fields() {
        let ledger = GasLedger::new(MemoryStore::new());
        ledger.set_stock("alice", &amount("50")).unwrap();
        ledger.set_limit("alice", &amount("1")).unwrap();
        assert_eq!(ledger.stock("alice").unwrap(), amount("50"));
    }
}

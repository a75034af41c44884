use ember_types::auth::AccountAuth;

use crate::codec::{get_value, make_key, put_value};
use crate::error::StorageError;
use crate::traits::KvStore;

const AUTH_PREFIX: &[u8] = b"auth:";

/// Account permission records.
pub struct AuthStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> AuthStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load(&self, account: &str) -> Result<Option<AccountAuth>, StorageError> {
        get_value(&self.store, &make_key(AUTH_PREFIX, &[account]))
    }

    pub fn save(&self, account: &str, auth: &AccountAuth) -> Result<(), StorageError> {
        put_value(&self.store, &make_key(AUTH_PREFIX, &[account]), auth)
    }

    pub fn exists(&self, account: &str) -> Result<bool, StorageError> {
        self.store.exists(&make_key(AUTH_PREFIX, &[account]))
    }
}

#[cfg(test)]
mod tests {
    use ember_types::primitives::Algorithm;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_save_and_load() {
        let auths = AuthStore::new(MemoryStore::new());
        assert!(auths.load("alice").unwrap().is_none());
        assert!(!auths.exists("alice").unwrap());

        let auth = AccountAuth::single_key(Algorithm::Secp256k1, vec![2; 33]);
        auths.save("alice", &auth).unwrap();
        assert!(auths.exists("alice").unwrap());
        assert_eq!(auths.load("alice").unwrap(), Some(auth));
    }
}

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::primitives::Algorithm;

/// Permission consulted when the requested one is not defined.
pub const ACTIVE_PERMISSION: &str = "active";

/// Permission that satisfies every request.
pub const OWNER_PERMISSION: &str = "owner";

/// A public key allowed to contribute to a permission.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct KeyEntry {
    pub algorithm: Algorithm,
    pub pubkey: Vec<u8>,
    pub weight: u32,
}

/// Weighted key set; satisfied when signing keys reach `threshold`.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Permission {
    pub threshold: u32,
    pub keys: Vec<KeyEntry>,
}

impl Permission {
    /// One key of weight 1, threshold 1.
    pub fn single(algorithm: Algorithm, pubkey: Vec<u8>) -> Self {
        Self {
            threshold: 1,
            keys: vec![KeyEntry {
                algorithm,
                pubkey,
                weight: 1,
            }],
        }
    }

    /// Whether the given verified signers carry enough weight.
    pub fn is_satisfied_by(&self, signers: &[(Algorithm, Vec<u8>)]) -> bool {
        let weight: u64 = self
            .keys
            .iter()
            .filter(|k| {
                signers
                    .iter()
                    .any(|(algo, pk)| *algo == k.algorithm && *pk == k.pubkey)
            })
            .map(|k| u64::from(k.weight))
            .sum();
        weight >= u64::from(self.threshold)
    }
}

/// Named permissions of one account.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct AccountAuth {
    pub permissions: BTreeMap<String, Permission>,
}

impl AccountAuth {
    /// An account controlled by one key through both `owner` and `active`.
    pub fn single_key(algorithm: Algorithm, pubkey: Vec<u8>) -> Self {
        let permission = Permission::single(algorithm, pubkey);
        let mut permissions = BTreeMap::new();
        permissions.insert(OWNER_PERMISSION.to_string(), permission.clone());
        permissions.insert(ACTIVE_PERMISSION.to_string(), permission);
        Self { permissions }
    }

    /// Resolve `name`, falling back to `active` when it is not defined.
    pub fn permission(&self, name: &str) -> Option<&Permission> {
        self.permissions
            .get(name)
            .or_else(|| self.permissions.get(ACTIVE_PERMISSION))
    }

    /// Whether `signers` hold `name` (directly, via the `active` fallback,
    /// or via `owner`).
    pub fn authorizes(&self, name: &str, signers: &[(Algorithm, Vec<u8>)]) -> bool {
        if self
            .permission(name)
            .is_some_and(|p| p.is_satisfied_by(signers))
        {
            return true;
        }
        self.permissions
            .get(OWNER_PERMISSION)
            .is_some_and(|p| p.is_satisfied_by(signers))
    }
}

//! Borsh helpers shared by the typed stores.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::StorageError;
use crate::traits::KvStore;

/// Build a key by joining a prefix and string components with `:`.
pub fn make_key(prefix: &[u8], parts: &[&str]) -> Vec<u8> {
    let len = prefix.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(prefix);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(b':');
        }
        key.extend_from_slice(part.as_bytes());
    }
    key
}

pub fn put_value<S, T>(store: &S, key: &[u8], value: &T) -> Result<(), StorageError>
where
    S: KvStore + ?Sized,
    T: BorshSerialize,
{
    let bytes = borsh::to_vec(value).map_err(|e| StorageError::SerializationError {
        reason: e.to_string(),
    })?;
    store.put(key, &bytes)
}

pub fn get_value<S, T>(store: &S, key: &[u8]) -> Result<Option<T>, StorageError>
where
    S: KvStore + ?Sized,
    T: BorshDeserialize,
{
    match store.get(key)? {
        Some(bytes) => T::try_from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::DeserializationError {
                key: String::from_utf8_lossy(key).into_owned(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

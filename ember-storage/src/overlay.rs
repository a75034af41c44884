use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StorageError;
use crate::traits::{BatchOp, BatchWriter, KvStore};

type Pending = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// A write buffer over another store.
///
/// Reads see buffered writes first and fall through to the inner store.
/// Nothing reaches the inner store until [`commit`](OverlayStore::commit),
/// which applies every buffered write as one batch; [`discard`](OverlayStore::discard)
/// drops them. A deleted key is buffered as `None` so it shadows the inner value.
pub struct OverlayStore<S: KvStore> {
    inner: S,
    pending: RwLock<Pending>,
}

impl<S: KvStore> OverlayStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of buffered writes (puts and deletes).
    pub fn pending_len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }

    /// Drop every buffered write.
    pub fn discard(&self) -> Result<(), StorageError> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Pending>, StorageError> {
        self.pending.read().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Pending>, StorageError> {
        self.pending.write().map_err(|e| StorageError::WriteError {
            reason: e.to_string(),
        })
    }
}

impl<S: BatchWriter> OverlayStore<S> {
    /// Apply buffered writes to the inner store atomically and clear the buffer.
    pub fn commit(&self) -> Result<usize, StorageError> {
        let mut pending = self.write()?;
        let ops: Vec<BatchOp> = std::mem::take(&mut *pending)
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOp::Put { key, value },
                None => BatchOp::Delete { key },
            })
            .collect();
        let count = ops.len();
        if count > 0 {
            self.inner.write_batch(ops)?;
        }
        Ok(count)
    }
}

impl<S: KvStore> KvStore for OverlayStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(buffered) = self.read()?.get(key) {
            return Ok(buffered.clone());
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.write()?.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.write()?.insert(key.to_vec(), None);
        Ok(())
    }
}

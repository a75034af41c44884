use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::traits::{BatchOp, BatchWriter, KvStore};

const UPSERT: &str = "INSERT OR REPLACE INTO state (key, value) VALUES (?1, ?2)";
const REMOVE: &str = "DELETE FROM state WHERE key = ?1";

/// SQLite-backed key-value store over a single `state` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::init(Connection::open(path)?)
    }

    /// A private in-memory database, mostly for tests.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             CREATE TABLE IF NOT EXISTS state (key BLOB PRIMARY KEY, value BLOB NOT NULL);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM state WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.lock()?.execute(UPSERT, params![key, value])?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.lock()?.execute(REMOVE, params![key])?;
        Ok(())
    }
}

impl BatchWriter for SqliteStore {
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    tx.execute(UPSERT, params![key, value])?;
                }
                BatchOp::Delete { key } => {
                    tx.execute(REMOVE, params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_crud() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(b"gas:rate:alice", b"v1").unwrap();
        store.put(b"gas:rate:alice", b"v2").unwrap();
        assert_eq!(store.get(b"gas:rate:alice").unwrap(), Some(b"v2".to_vec()));
        assert!(store.exists(b"gas:rate:alice").unwrap());

        store.delete(b"gas:rate:alice").unwrap();
        assert_eq!(store.get(b"gas:rate:alice").unwrap(), None);
        store.delete(b"gas:rate:alice").unwrap();
    }

    #[test]
    fn test_batch_is_applied() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(b"old", b"x").unwrap();
        store
            .write_batch(vec![
                BatchOp::Put {
                    key: b"new".to_vec(),
                    value: b"y".to_vec(),
                },
                BatchOp::Delete {
                    key: b"old".to_vec(),
                },
            ])
            .unwrap();
        assert_eq!(store.get(b"new").unwrap(), Some(b"y".to_vec()));
        assert!(!store.exists(b"old").unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(b"gas:pledge:alice", b"10").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(b"gas:pledge:alice").unwrap(), Some(b"10".to_vec()));
    }
}

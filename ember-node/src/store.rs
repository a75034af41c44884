use std::path::Path;
use std::sync::Arc;

use ember_storage::memory::MemoryStore;
use ember_storage::sqlite::SqliteStore;
use ember_storage::traits::BatchWriter;
use tracing::info;

use crate::config::StorageConfig;
use crate::error::NodeError;

/// Backend chosen at runtime from the storage configuration.
pub type NodeStore = Box<dyn BatchWriter>;

/// Open the configured backend, creating the sqlite file's directory if needed.
pub fn open_store(config: &StorageConfig) -> Result<Arc<NodeStore>, NodeError> {
    let store: NodeStore = match config.db_type.as_str() {
        "memory" => Box::new(MemoryStore::new()),
        "sqlite" => {
            let path = Path::new(&config.path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Box::new(SqliteStore::open(path)?)
        }
        other => {
            return Err(NodeError::ConfigError {
                reason: format!("unknown storage backend '{other}'"),
            })
        }
    };
    info!(db_type = %config.db_type, path = %config.path, "opened state store");
    Ok(Arc::new(store))
}

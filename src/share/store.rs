//! Share record storage trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::types::SharedTweetRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("duplicate id: {0}")]
    Duplicate(String),
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Insert-once, point-lookup storage for shared results.
///
/// Records are immutable once inserted; there is no update or delete.
pub trait ShareStore: Send + Sync {
    fn insert(&self, record: &SharedTweetRecord) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Option<SharedTweetRecord>, StoreError>;
}

/// `HashMap`-backed store for tests and throwaway servers.
#[derive(Default)]
pub struct MemoryShareStore {
    records: Mutex<HashMap<String, SharedTweetRecord>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ShareStore for MemoryShareStore {
    fn insert(&self, record: &SharedTweetRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SharedTweetRecord>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(records.get(id).cloned())
    }
}

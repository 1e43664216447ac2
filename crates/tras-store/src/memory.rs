use std::collections::HashMap;
use std::sync::Mutex;

use tras_models::AlertRecord;

use crate::error::StoreError;
use crate::store::AlertStore;

/// Non-durable alert store for tests and dry runs.
#[derive(Default)]
pub struct MemoryAlertStore {
    records: Mutex<HashMap<String, AlertRecord>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, AlertRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store mutex poisoned: {e}")))
    }
}

impl AlertStore for MemoryAlertStore {
    fn exists(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.records()?.contains_key(fingerprint))
    }

    fn put(&self, record: &AlertRecord) -> Result<bool, StoreError> {
        let mut records = self.records()?;
        if records.contains_key(&record.signal_fingerprint) {
            return Ok(false);
        }
        records.insert(record.signal_fingerprint.clone(), record.clone());
        Ok(true)
    }

    fn get(&self, fingerprint: &str) -> Result<Option<AlertRecord>, StoreError> {
        Ok(self.records()?.get(fingerprint).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records()?.len())
    }
}

use tras_models::AlertRecord;

use crate::error::StoreError;

/// Durable key-value history of fired alerts, keyed by signal fingerprint.
///
/// Records are append-only: once a fingerprint is stored it is never
/// overwritten or removed. Implementations must be safe to share between
/// the monitor and the daemon behind an `Arc`.
pub trait AlertStore: Send + Sync {
    /// Whether a record exists for `fingerprint`.
    fn exists(&self, fingerprint: &str) -> Result<bool, StoreError>;

    /// Store `record` under its fingerprint if no record exists yet.
    /// Returns `true` when the record was inserted, `false` when one was
    /// already present (the existing record is left untouched).
    fn put(&self, record: &AlertRecord) -> Result<bool, StoreError>;

    /// Look up the stored record for `fingerprint`.
    fn get(&self, fingerprint: &str) -> Result<Option<AlertRecord>, StoreError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

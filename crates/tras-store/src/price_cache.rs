use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;

/// Rates for one base currency: quote code to units of quote per one base.
pub type RateTable = Arc<HashMap<String, Decimal>>;

/// Short-lived cache of reference rate tables, keyed by base currency code.
///
/// One fetch serves every instrument priced off the same base until the
/// TTL lapses, so a poll over many signals costs one feed request.
pub struct PriceCache {
    inner: Cache<String, RateTable>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(64).time_to_live(ttl).build(),
        }
    }

    pub async fn get(&self, base: &str) -> Option<RateTable> {
        self.inner.get(base).await
    }

    pub async fn insert(&self, base: &str, rates: RateTable) {
        self.inner.insert(base.to_string(), rates).await;
    }

    pub async fn invalidate(&self, base: &str) {
        self.inner.invalidate(base).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

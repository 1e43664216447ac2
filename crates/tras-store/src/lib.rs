pub mod error;
pub mod memory;
pub mod price_cache;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryAlertStore;
pub use price_cache::{PriceCache, RateTable};
pub use sqlite::SqliteAlertStore;
pub use store::AlertStore;

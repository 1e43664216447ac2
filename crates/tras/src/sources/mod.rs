pub mod documents;
pub mod frankfurter;

use async_trait::async_trait;
use tras_models::SourceDocument;

use crate::error::SourceError;

/// Supplier of the market commentary each analysis run starts from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_latest(&self) -> Result<Vec<SourceDocument>, SourceError>;
}

pub use documents::DirectorySource;
pub use frankfurter::FrankfurterSource;

use async_trait::async_trait;
use tras_models::{Instrument, PriceTick};

use crate::error::PriceError;

/// Live quote feed.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_price(&self, instrument: &Instrument) -> Result<PriceTick, PriceError>;
}

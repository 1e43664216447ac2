use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use tras_models::{Instrument, PriceTick};
use tras_monitor::{PriceError, PriceSource};
use tras_store::{PriceCache, RateTable};

use crate::config::PriceFeedConfig;
use crate::error::TrasError;

/// Reference rates are published against the euro.
const REFERENCE: &str = "EUR";

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, Decimal>,
}

/// Daily reference rates from a Frankfurter-style `/latest` endpoint.
///
/// One request fetches every rate against EUR; other pairs are derived
/// from it. The table is cached so a poll over many instruments costs one
/// request per TTL.
pub struct FrankfurterSource {
    client: reqwest::Client,
    base_url: String,
    cache: PriceCache,
}

impl FrankfurterSource {
    pub fn new(config: &PriceFeedConfig, cache_ttl: Duration) -> Result<Self, TrasError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: PriceCache::new(cache_ttl),
        })
    }

    async fn reference_rates(&self) -> Result<RateTable, PriceError> {
        if let Some(rates) = self.cache.get(REFERENCE).await {
            return Ok(rates);
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("from", REFERENCE)])
            .send()
            .await
            .map_err(|e| PriceError::Feed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Feed(format!("HTTP {status}")));
        }
        let latest: LatestRates = response
            .json()
            .await
            .map_err(|e| PriceError::Feed(format!("bad response body: {e}")))?;

        debug!(rates = latest.rates.len(), "Fetched reference rates");
        let table: RateTable = Arc::new(latest.rates);
        self.cache.insert(REFERENCE, Arc::clone(&table)).await;
        Ok(table)
    }
}

#[async_trait]
impl PriceSource for FrankfurterSource {
    fn name(&self) -> &str {
        "frankfurter"
    }

    async fn get_price(&self, instrument: &Instrument) -> Result<PriceTick, PriceError> {
        if matches!(instrument.base(), "XAU" | "XAG") || matches!(instrument.quote(), "XAU" | "XAG")
        {
            return Err(PriceError::Unsupported(instrument.clone()));
        }
        let rates = self.reference_rates().await?;
        let mid = cross_rate(instrument, &rates)?;
        Ok(PriceTick::mid(instrument.clone(), mid, Utc::now()))
    }
}

/// Price of `instrument` from a table of EUR-based rates.
///
/// `EUR/x` reads the table directly, `x/EUR` inverts it, and any other
/// pair is `(EUR/quote) / (EUR/base)`.
pub fn cross_rate(instrument: &Instrument, eur_rates: &HashMap<String, Decimal>) -> Result<Decimal, PriceError> {
    let rate = |code: &str| -> Result<Decimal, PriceError> {
        match eur_rates.get(code) {
            Some(r) if *r > Decimal::ZERO => Ok(*r),
            _ => Err(PriceError::Missing(instrument.clone())),
        }
    };

    let price = match (instrument.base(), instrument.quote()) {
        (REFERENCE, quote) => rate(quote)?,
        (base, REFERENCE) => Decimal::ONE / rate(base)?,
        (base, quote) => rate(quote)? / rate(base)?,
    };
    Ok(price.round_dp(instrument.price_scale()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates() -> HashMap<String, Decimal> {
        HashMap::from([
            ("USD".to_string(), dec!(1.0850)),
            ("JPY".to_string(), dec!(162.40)),
            ("GBP".to_string(), dec!(0.8550)),
        ])
    }

    fn pair(s: &str) -> Instrument {
        s.parse().unwrap()
    }

    #[test]
    fn direct_rate() {
        assert_eq!(cross_rate(&pair("EURUSD"), &rates()).unwrap(), dec!(1.0850));
    }

    #[test]
    fn inverted_rate() {
        // 1 / 0.8550 = 1.169590...
        assert_eq!(cross_rate(&pair("GBPEUR"), &rates()).unwrap(), dec!(1.16959));
    }

    #[test]
    fn cross_rates() {
        // 162.40 / 1.0850 = 149.677...
        assert_eq!(cross_rate(&pair("USDJPY"), &rates()).unwrap(), dec!(149.677));
        // 1.0850 / 0.8550 = 1.269005...
        assert_eq!(cross_rate(&pair("GBPUSD"), &rates()).unwrap(), dec!(1.26901));
    }

    #[test]
    fn missing_code() {
        let err = cross_rate(&pair("USDCHF"), &rates()).unwrap_err();
        assert_eq!(err, PriceError::Missing(pair("USDCHF")));
    }

    #[tokio::test]
    async fn metals_are_unsupported() {
        let source = FrankfurterSource::new(&PriceFeedConfig::default(), Duration::from_secs(60)).unwrap();
        let err = source.get_price(&pair("XAUUSD")).await.unwrap_err();
        assert!(matches!(err, PriceError::Unsupported(_)));
    }
}

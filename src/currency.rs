//! Currency Rate Service
//! Mission: Fetch exchange rates and convert vehicle prices

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Thin client over the exchange-rate API.
pub struct CurrencyService {
    client: Client,
    base_url: String,
}

impl CurrencyService {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("autolot-backend/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    /// Fetch the rate table for a base currency.
    pub async fn rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let url = format!("{}/{}", self.base_url, base);
        debug!(%url, "fetching exchange rates");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("exchange rate request failed")?;

        if !resp.status().is_success() {
            bail!("exchange rate API returned {}", resp.status());
        }

        let body: RatesResponse = resp
            .json()
            .await
            .context("malformed exchange rate response")?;

        Ok(body.rates)
    }

    /// Currency codes the upstream supports (keys of the default base table).
    pub async fn available_currencies(&self) -> Result<Vec<String>> {
        let rates = self.rates(DEFAULT_BASE_CURRENCY).await?;
        let mut currencies: Vec<String> = rates.into_keys().collect();
        currencies.sort();
        Ok(currencies)
    }
}

/// Round to cents, the precision the price columns carry.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

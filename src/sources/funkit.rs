use super::PriceSource;
use crate::types::TokenInfo;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Funkit asset API: ERC-20 lookup by chain and symbol, unit price by
/// chain and contract address.
pub struct Funkit {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Erc20AssetInfo {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetPriceInfo {
    #[serde(default)]
    unit_price: Option<f64>,
}

impl Funkit {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Result<Self> {
        let base_url = Url::parse(base_url).context("parsing Funkit base URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Funkit base URL {} cannot carry a path", base_url);
        }
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Funkit base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn address_url(&self, chain_id: &str, symbol: &str) -> Result<Url> {
        self.endpoint(&["asset", "erc20", chain_id, symbol])
    }

    fn price_url(&self, chain_id: &str, address: &str) -> Result<Url> {
        self.endpoint(&["asset", "erc20", "price", chain_id, address])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Funkit {} request failed", what))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Funkit {} HTTP {}: {}", what, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("Funkit {} parse failed", what))
    }
}

#[async_trait]
impl PriceSource for Funkit {
    fn name(&self) -> &str {
        "funkit"
    }

    async fn resolve_address(&self, chain_id: &str, symbol: &str) -> Result<TokenInfo> {
        let url = self.address_url(chain_id, symbol)?;
        let asset: Erc20AssetInfo = self.get_json(url, "asset").await?;

        Ok(TokenInfo {
            address: asset.address.unwrap_or_default(),
            symbol: symbol.to_string(),
            chain_id: chain_id.to_string(),
        })
    }

    async fn resolve_price(&self, chain_id: &str, address: &str) -> Result<Option<f64>> {
        let url = self.price_url(chain_id, address)?;
        let info: AssetPriceInfo = self.get_json(url, "price").await?;
        Ok(info.unit_price)
    }
}

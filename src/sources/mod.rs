pub mod funkit;

use crate::config::{Config, FailurePolicy, TokenConfig};
use crate::types::{sanitize_price, PriceInfo, Token, TokenInfo, TokenPriceMap};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Remote service that resolves a token to a contract address on a chain,
/// and an address to a USD unit price.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;
    async fn resolve_address(&self, chain_id: &str, symbol: &str) -> Result<TokenInfo>;
    /// `Ok(None)` when the service answers but has no price for the address.
    async fn resolve_price(&self, chain_id: &str, address: &str) -> Result<Option<f64>>;
}

/// Two-step lookup: address first, then price by address. An empty address
/// short-circuits to an unknown price.
pub async fn token_price(
    source: &dyn PriceSource,
    token: Token,
    cfg: &TokenConfig,
) -> Result<PriceInfo> {
    let info = source
        .resolve_address(&cfg.chain_id, &cfg.symbol)
        .await
        .with_context(|| format!("{}: resolving {} address", source.name(), token))?;

    if info.address.is_empty() {
        debug!("{}: no address for {} on chain {}", source.name(), token, cfg.chain_id);
        return Ok(PriceInfo {
            price: None,
            symbol: cfg.symbol.clone(),
        });
    }

    let price = source
        .resolve_price(&info.chain_id, &info.address)
        .await
        .with_context(|| format!("{}: resolving {} price", source.name(), token))?;

    Ok(PriceInfo {
        price: sanitize_price(price),
        symbol: cfg.symbol.clone(),
    })
}

async fn lookup(source: &dyn PriceSource, token: Token, config: &Config) -> Result<Option<f64>> {
    let cfg = config.token(token)?;
    Ok(token_price(source, token, cfg).await?.price)
}

/// Look up every token concurrently and collect the results into a price map.
///
/// Under [`FailurePolicy::Isolate`] a failed lookup is logged and recorded as
/// an unknown price. Under [`FailurePolicy::AbortBatch`] the first failure
/// fails the whole batch.
pub async fn token_prices(
    source: &dyn PriceSource,
    tokens: &BTreeSet<Token>,
    config: &Config,
) -> Result<TokenPriceMap> {
    match config.failure_policy {
        FailurePolicy::Isolate => {
            let results = join_all(
                tokens
                    .iter()
                    .map(|&token| async move { (token, lookup(source, token, config).await) }),
            )
            .await;

            let prices = results
                .into_iter()
                .map(|(token, result)| match result {
                    Ok(price) => (token, price),
                    Err(e) => {
                        warn!("price for {} unavailable: {:#}", token, e);
                        (token, None)
                    }
                })
                .collect();
            Ok(prices)
        }
        FailurePolicy::AbortBatch => {
            let results = try_join_all(tokens.iter().map(|&token| async move {
                lookup(source, token, config)
                    .await
                    .map(|price| (token, price))
            }))
            .await?;
            Ok(results.into_iter().collect())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeSource;
    use super::*;

    fn set(tokens: &[Token]) -> BTreeSet<Token> {
        tokens.iter().copied().collect()
    }

    #[tokio::test]
    async fn two_step_lookup_returns_price() {
        let source = FakeSource::with_prices(&[("USDC", 1.0)]);
        let cfg = Config::default();
        let info = token_price(&source, Token::Usdc, cfg.token(Token::Usdc).unwrap())
            .await
            .unwrap();
        assert_eq!(info.price, Some(1.0));
        assert_eq!(info.symbol, "USDC");
        assert_eq!(source.address_calls(), 1);
        assert_eq!(source.price_calls(), 1);
    }

    #[tokio::test]
    async fn empty_address_skips_price_lookup() {
        let source = FakeSource::with_prices(&[("USDC", 1.0)]);
        source.empty_address.lock().unwrap().insert("USDC".into());
        let cfg = Config::default();
        let info = token_price(&source, Token::Usdc, cfg.token(Token::Usdc).unwrap())
            .await
            .unwrap();
        assert_eq!(info.price, None);
        assert_eq!(source.price_calls(), 0);
    }

    #[tokio::test]
    async fn missing_or_non_positive_price_is_unknown() {
        let source = FakeSource::with_prices(&[("ETH", 0.0), ("WBTC", -3.0)]);
        source.set_price("USDT", None);
        let prices = token_prices(
            &source,
            &set(&[Token::Eth, Token::Wbtc, Token::Usdt]),
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(prices.get(&Token::Eth), Some(&None));
        assert_eq!(prices.get(&Token::Wbtc), Some(&None));
        assert_eq!(prices.get(&Token::Usdt), Some(&None));
    }

    #[tokio::test]
    async fn isolated_failures_do_not_affect_siblings() {
        let source = FakeSource::with_prices(&[("USDC", 1.0), ("ETH", 2500.0), ("WBTC", 60000.0)]);
        source.fail_address_for("ETH");
        source.fail_price_for("WBTC");
        let prices = token_prices(
            &source,
            &set(&[Token::Usdc, Token::Eth, Token::Wbtc]),
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(prices.get(&Token::Usdc), Some(&Some(1.0)));
        assert_eq!(prices.get(&Token::Eth), Some(&None));
        assert_eq!(prices.get(&Token::Wbtc), Some(&None));
    }

    #[tokio::test]
    async fn abort_batch_policy_fails_whole_batch() {
        let source = FakeSource::with_prices(&[("USDC", 1.0), ("ETH", 2500.0)]);
        source.fail_price_for("ETH");
        let cfg = Config {
            failure_policy: FailurePolicy::AbortBatch,
            ..Config::default()
        };
        let err = token_prices(&source, &set(&[Token::Usdc, Token::Eth]), &cfg)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("ETH"), "{:#}", err);
    }

    #[tokio::test]
    async fn abort_batch_policy_succeeds_without_failures() {
        let source = FakeSource::with_prices(&[("USDC", 1.0), ("ETH", 2500.0)]);
        let cfg = Config {
            failure_policy: FailurePolicy::AbortBatch,
            ..Config::default()
        };
        let prices = token_prices(&source, &set(&[Token::Usdc, Token::Eth]), &cfg)
            .await
            .unwrap();
        assert_eq!(prices.get(&Token::Eth), Some(&Some(2500.0)));
    }

    #[tokio::test]
    async fn empty_set_makes_no_calls() {
        let source = FakeSource::default();
        let prices = token_prices(&source, &BTreeSet::new(), &Config::default())
            .await
            .unwrap();
        assert!(prices.is_empty());
        assert_eq!(source.address_calls(), 0);
    }
}

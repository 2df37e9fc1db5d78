use crate::config::Config;
use crate::sources::{self, PriceSource};
use crate::types::{FetchState, PriceInfo, PriceSnapshot, Token, TokenPriceMap};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Owns the price map and fetch state for a set of tokens of interest.
///
/// Readers only ever see [`PriceSnapshot`] copies. Batches are numbered; a
/// batch that settles after a newer one has started is discarded. Each batch
/// runs on its own task, so it settles even if the caller stops waiting.
pub struct PricePipeline {
    source: Arc<dyn PriceSource>,
    config: Arc<Config>,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    prices: TokenPriceMap,
    state: FetchState,
    tokens: BTreeSet<Token>,
    generation: u64,
}

impl PricePipeline {
    pub fn new(source: Arc<dyn PriceSource>, config: Config) -> Self {
        Self {
            source,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn snapshot(&self) -> PriceSnapshot {
        let inner = self.inner.lock().await;
        PriceSnapshot {
            prices: inner.prices.clone(),
            state: inner.state.clone(),
        }
    }

    /// Fetch prices for the unique tokens in `tokens` and merge them into the
    /// price map. An empty request does nothing.
    pub async fn request_prices<I>(&self, tokens: I)
    where
        I: IntoIterator<Item = Token>,
    {
        let unique: BTreeSet<Token> = tokens.into_iter().collect();
        if unique.is_empty() {
            debug!("no tokens requested; skipping fetch");
            return;
        }

        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.tokens = unique.clone();
            inner.state.is_loading = true;
            inner.state.error = None;
            inner.generation
        };

        info!(
            "fetching {} price(s) from {} (batch {})",
            unique.len(),
            self.source.name(),
            generation
        );

        let source = self.source.clone();
        let config = self.config.clone();
        let inner = self.inner.clone();
        let batch = tokio::spawn(async move {
            let result = sources::token_prices(source.as_ref(), &unique, &config).await;
            settle(&inner, generation, unique.len(), result).await;
        });

        if let Err(e) = batch.await {
            warn!("batch {} task failed: {}", generation, e);
            let err = Err(anyhow::anyhow!("price fetch task failed: {}", e));
            settle(&self.inner, generation, 0, err).await;
        }
    }

    /// Re-issue the most recent non-empty request.
    pub async fn refetch(&self) {
        let tokens = self.tokens().await;
        self.request_prices(tokens).await;
    }

    /// Refresh a single token outside the batch. Failures are logged only.
    pub async fn refetch_token(&self, token: Token) {
        match self.single_price(token).await {
            Ok(info) => {
                self.inner.lock().await.prices.insert(token, info.price);
                info!("refreshed {} price: {:?}", token, info.price);
            }
            Err(e) => warn!("error fetching price for {}: {:#}", token, e),
        }
    }

    async fn single_price(&self, token: Token) -> Result<PriceInfo> {
        let cfg = self.config.token(token)?;
        sources::token_price(self.source.as_ref(), token, cfg).await
    }

    /// Tokens of the most recent non-empty request.
    pub async fn tokens(&self) -> BTreeSet<Token> {
        self.inner.lock().await.tokens.clone()
    }
}

/// Apply a finished batch, unless a newer batch has started since.
async fn settle(
    inner: &Mutex<Inner>,
    generation: u64,
    requested: usize,
    result: Result<TokenPriceMap>,
) {
    let mut inner = inner.lock().await;
    if inner.generation != generation {
        debug!(
            "discarding batch {}; batch {} superseded it",
            generation, inner.generation
        );
        return;
    }
    if !inner.state.is_loading {
        return;
    }

    inner.state.is_loading = false;
    match result {
        Ok(prices) => {
            let known = prices.values().filter(|p| p.is_some()).count();
            inner.prices.extend(prices);
            inner.state.last_fetched = Some(Utc::now());
            info!(
                "batch {} settled: {}/{} price(s) available",
                generation, known, requested
            );
        }
        Err(e) => {
            warn!("batch {} failed: {:#}", generation, e);
            inner.state.error = Some(format!("{:#}", e));
        }
    }
}

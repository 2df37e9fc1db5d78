use crate::types::Token;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_API_BASE_URL: &str = "https://api.fun.xyz/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_tokens")]
    pub tokens: BTreeMap<Token, TokenConfig>,
    #[serde(default)]
    pub amount: AmountBounds,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Where a token lives: the chain to resolve its contract address on, and
/// the symbol to look it up by.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenConfig {
    pub chain_id: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AmountBounds {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max_amount")]
    pub max: f64,
    #[serde(default = "default_max_decimals")]
    pub max_decimals: usize,
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_max_amount(),
            max_decimals: default_max_decimals(),
        }
    }
}

/// How a single token's lookup failure affects the rest of its batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The failing token's price becomes unknown; siblings are unaffected.
    #[default]
    Isolate,
    /// Any failure fails the whole batch.
    AbortBatch,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_max_amount() -> f64 {
    1e12
}

fn default_max_decimals() -> usize {
    8
}

fn default_tokens() -> BTreeMap<Token, TokenConfig> {
    [
        (Token::Usdc, "1"),
        (Token::Usdt, "137"),
        (Token::Eth, "8453"),
        (Token::Wbtc, "1"),
    ]
    .into_iter()
    .map(|(token, chain_id)| {
        (
            token,
            TokenConfig {
                chain_id: chain_id.to_string(),
                symbol: token.symbol().to_string(),
            },
        )
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            tokens: default_tokens(),
            amount: AmountBounds::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("{} not found; using built-in defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            anyhow::bail!("api_base_url must not be empty");
        }

        for token in Token::ALL {
            let Some(cfg) = self.tokens.get(&token) else {
                anyhow::bail!("token {} has no chain configuration", token);
            };
            if cfg.chain_id.trim().is_empty() {
                anyhow::bail!("token {} has an empty chain_id", token);
            }
            if cfg.symbol.trim().is_empty() {
                anyhow::bail!("token {} has an empty symbol", token);
            }
        }

        let AmountBounds { min, max, .. } = self.amount;
        if !min.is_finite() || !max.is_finite() {
            anyhow::bail!("amount bounds must be finite (min {}, max {})", min, max);
        }
        if min < 0.0 {
            anyhow::bail!("amount.min must not be negative (got {})", min);
        }
        if min > max {
            anyhow::bail!("amount.min {} is greater than amount.max {}", min, max);
        }
        Ok(())
    }

    /// Chain configuration for `token`. Validation guarantees every token is present.
    pub fn token(&self, token: Token) -> Result<&TokenConfig> {
        self.tokens
            .get(&token)
            .with_context(|| format!("token {} has no chain configuration", token))
    }
}

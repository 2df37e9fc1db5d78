use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed set of tokens the explorer knows how to price.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    #[default]
    Usdc,
    Usdt,
    Eth,
    Wbtc,
}

impl Token {
    pub const ALL: [Token; 4] = [Token::Usdc, Token::Usdt, Token::Eth, Token::Wbtc];

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Usdc => "USDC",
            Token::Usdt => "USDT",
            Token::Eth => "ETH",
            Token::Wbtc => "WBTC",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Token {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::ALL
            .into_iter()
            .find(|t| t.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown token '{}' (expected one of USDC, USDT, ETH, WBTC)",
                    s
                )
            })
    }
}

/// Result of the address lookup for a token on its configured chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub chain_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub price: Option<f64>,
    pub symbol: String,
}

/// `None` means the price is unknown or unavailable. Only tokens requested
/// at least once have an entry.
pub type TokenPriceMap = BTreeMap<Token, Option<f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_fetched: Option<DateTime<Utc>>,
}

/// Point-in-time copy of the pipeline state handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub prices: TokenPriceMap,
    #[serde(flatten)]
    pub state: FetchState,
}

impl PriceSnapshot {
    pub fn price(&self, token: Token) -> Option<f64> {
        self.prices.get(&token).copied().flatten()
    }
}

/// Positive finite prices pass through; everything else is "unknown".
pub fn sanitize_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

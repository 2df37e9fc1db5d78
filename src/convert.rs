use crate::types::{sanitize_price, PriceSnapshot, Token};
use serde::{Serialize, Serializer};

/// Token quantity bought by a USD amount, or `Unavailable` without a usable price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Quantity(f64),
    Unavailable,
}

impl Serialize for Conversion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.quantity().serialize(serializer)
    }
}

impl Conversion {
    pub fn quantity(&self) -> Option<f64> {
        match self {
            Conversion::Quantity(q) => Some(*q),
            Conversion::Unavailable => None,
        }
    }
}

pub fn convert(usd_amount: f64, price: Option<f64>) -> Conversion {
    match sanitize_price(price) {
        Some(price) => Conversion::Quantity(usd_amount / price),
        None => Conversion::Unavailable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapQuote {
    pub usd_amount: f64,
    pub source: Token,
    pub target: Token,
    pub source_price: Option<f64>,
    pub target_price: Option<f64>,
    pub source_amount: Conversion,
    pub target_amount: Conversion,
}

impl SwapQuote {
    pub fn new(usd_amount: f64, source: Token, target: Token, snapshot: &PriceSnapshot) -> Self {
        let source_price = snapshot.price(source);
        let target_price = snapshot.price(target);
        Self {
            usd_amount,
            source,
            target,
            source_price,
            target_price,
            source_amount: convert(usd_amount, source_price),
            target_amount: convert(usd_amount, target_price),
        }
    }
}

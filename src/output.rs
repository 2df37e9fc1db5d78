use crate::convert::{Conversion, SwapQuote};
use crate::types::{PriceSnapshot, Token};
use anyhow::{Context, Result};
use serde::Serialize;

const UNAVAILABLE: &str = "—";

fn format_price(price: Option<f64>) -> String {
    price
        .map(|p| format!("${:.2}", p))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn format_quantity(amount: Conversion) -> String {
    amount
        .quantity()
        .map(|q| format!("{:.6}", q))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn print_status(snapshot: &PriceSnapshot) {
    if snapshot.state.is_loading {
        println!("Loading...");
    }
    if let Some(err) = &snapshot.state.error {
        println!("Error: {}", err);
    }
    let fetched = snapshot
        .state
        .last_fetched
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("Last fetched: {}", fetched);
}

pub fn print_quote(quote: &SwapQuote, snapshot: &PriceSnapshot) {
    println!("\nUSD amount: ${:.2}", quote.usd_amount);
    println!(
        "\n{:<8} {:<8} {:<18} {}",
        "Side", "Token", "Unit price (USD)", "Quantity"
    );
    println!("{}", "-".repeat(52));
    let rows = [
        ("from", quote.source, quote.source_price, quote.source_amount),
        ("to", quote.target, quote.target_price, quote.target_amount),
    ];
    for (side, token, price, amount) in rows {
        println!(
            "{:<8} {:<8} {:<18} ≈ {} {}",
            side,
            token,
            format_price(price),
            format_quantity(amount),
            token
        );
    }
    println!();
    print_status(snapshot);
}

pub fn print_prices(snapshot: &PriceSnapshot) {
    println!("\n{:<8} {}", "Token", "Unit price (USD)");
    println!("{}", "-".repeat(28));
    for token in Token::ALL {
        if snapshot.prices.contains_key(&token) {
            println!("{:<8} {}", token, format_price(snapshot.price(token)));
        }
    }
    println!();
    print_status(snapshot);
}

/// JSON document printed by `--output json`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub quote: &'a SwapQuote,
    pub snapshot: &'a PriceSnapshot,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{}", json);
    Ok(())
}

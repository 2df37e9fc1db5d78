use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use token_price_explorer::amount::AmountInput;
use token_price_explorer::config::Config;
use token_price_explorer::convert::SwapQuote;
use token_price_explorer::output;
use token_price_explorer::pipeline::PricePipeline;
use token_price_explorer::sources::funkit::Funkit;
use token_price_explorer::sources::PriceSource;
use token_price_explorer::types::Token;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "token-price-explorer",
    about = "Fetch token USD prices and convert a USD amount into token quantities"
)]
struct Args {
    /// Path to config YAML file (built-in defaults when omitted and config.yaml is absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token to swap from
    #[arg(long, default_value = "USDC")]
    from: Token,

    /// Token to swap to
    #[arg(long, default_value = "ETH")]
    to: Token,

    /// USD amount to convert
    #[arg(short, long, default_value = "100")]
    amount: String,

    /// Output format: "table" (default) or "json"
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Fetch prices for every known token, not only --from and --to
    #[arg(long)]
    all: bool,

    /// Refresh one token's price again after the batch fetch
    #[arg(long)]
    refetch_token: Option<Token>,

    /// How many times to retry a failed batch
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_PATH))
            .with_context(|| format!("loading config from {}", DEFAULT_CONFIG_PATH))?,
    };

    let mut amount = AmountInput::new(cfg.amount, 0.0);
    let usd_amount = amount
        .edit(&args.amount)
        .with_context(|| format!("invalid --amount '{}'", args.amount))?;

    let api_key = std::env::var("FUNKIT_API_KEY").context("FUNKIT_API_KEY not set")?;
    let client = reqwest::Client::builder()
        .user_agent("token-price-explorer/0.1")
        .build()
        .context("building HTTP client")?;

    let funkit = Funkit::new(client, &cfg.api_base_url, api_key)
        .with_context(|| format!("invalid api_base_url '{}'", cfg.api_base_url))?;
    let source: Arc<dyn PriceSource> = Arc::new(funkit);
    info!("Using price source {} at {}", source.name(), cfg.api_base_url);
    let pipeline = PricePipeline::new(source, cfg);

    let tokens = if args.all {
        Token::ALL.to_vec()
    } else {
        vec![args.from, args.to]
    };
    pipeline.request_prices(tokens).await;

    let mut attempt = 0;
    while let Some(err) = pipeline.snapshot().await.state.error {
        if attempt >= args.retries {
            break;
        }
        attempt += 1;
        let tokens: Vec<String> = pipeline
            .tokens()
            .await
            .iter()
            .map(Token::to_string)
            .collect();
        warn!(
            "price fetch for {} failed ({}); retrying {}/{}",
            tokens.join(", "),
            err,
            attempt,
            args.retries
        );
        pipeline.refetch().await;
    }

    if let Some(token) = args.refetch_token {
        pipeline.refetch_token(token).await;
    }

    let snapshot = pipeline.snapshot().await;
    let quote = SwapQuote::new(usd_amount, args.from, args.to, &snapshot);

    match args.output.as_str() {
        "json" => {
            output::print_json(&output::Report {
                quote: &quote,
                snapshot: &snapshot,
            })?;
        }
        _ => {
            if args.all {
                output::print_prices(&snapshot);
            }
            output::print_quote(&quote, &snapshot);
        }
    }

    Ok(())
}

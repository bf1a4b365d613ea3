//! Swapdesk - Trade Execution & Account Ledger Engine
//!
//! Driver binary: quotes, prices, wallet generation and balance lookups
//! against the configured cluster.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use swapdesk::adapters::cli::{BalanceCmd, CliApp, Command, PriceCmd, QuoteCmd, WalletCmd};
use swapdesk::adapters::jupiter::{JupiterClient, JupiterConfig, QuoteRequest};
use swapdesk::adapters::market_data::{
    BirdeyeSource, CoingeckoSource, DexQuoteSource, TokenDirectory,
};
use swapdesk::adapters::solana::{is_valid_pubkey, Network, SolanaRpc, WalletManager};
use swapdesk::config::{load_config_or_default, Config};
use swapdesk::domain::{format_token_amount, impact_warning, to_raw_units};
use swapdesk::market::{MarketService, TokenInfo};
use swapdesk::ports::{ChainPort, DexPort, PriceSource, TokenDirectoryPort};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = load_config_or_default(&app.config).context("Failed to load configuration")?;
    init_logging(app.verbose, app.debug, &config);

    match app.command {
        Command::Quote(cmd) => quote_command(cmd, &config).await,
        Command::Price(cmd) => price_command(cmd, &config).await,
        Command::Wallet(cmd) => wallet_command(cmd),
        Command::Balance(cmd) => balance_command(cmd, &config).await,
    }
}

fn init_logging(verbose: bool, debug: bool, config: &Config) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new(config.logging.level.clone())
    };

    fmt().with_env_filter(filter).init();
}

/// Everything the read-only commands need, wired over one RPC connection.
struct Services {
    chain: Arc<dyn ChainPort>,
    dex: Arc<dyn DexPort>,
    market: Arc<MarketService>,
}

fn build_services(config: &Config) -> Result<Services> {
    let network = Network::parse(&config.solana.network).unwrap_or(Network::Mainnet);
    let chain: Arc<dyn ChainPort> = Arc::new(SolanaRpc::new(config.solana.get_rpc_url(), network));

    let jupiter_config = JupiterConfig {
        api_base_url: config.jupiter.get_api_url(),
        api_key: config.jupiter.get_api_key(),
        timeout: Duration::from_secs(config.jupiter.timeout_secs),
        max_retries: config.jupiter.max_retries,
    };
    let dex: Arc<dyn DexPort> = Arc::new(
        JupiterClient::with_config(jupiter_config, Arc::clone(&chain))
            .context("Failed to create Jupiter client")?,
    );

    let directory = Arc::new(
        TokenDirectory::new(config.market.token_directory_url.clone())
            .context("Failed to create token directory client")?,
    );
    let coingecko = Arc::new(
        CoingeckoSource::new(config.market.coingecko_url.clone())
            .context("Failed to create CoinGecko client")?,
    );
    let birdeye = Arc::new(
        BirdeyeSource::new(
            config.market.birdeye_url.clone(),
            config.market.get_birdeye_api_key(),
        )
        .context("Failed to create Birdeye client")?,
    );
    let dex_quote = Arc::new(DexQuoteSource::new(
        Arc::clone(&dex),
        Arc::clone(&directory),
        Arc::clone(&coingecko),
    ));

    let sources: Vec<Arc<dyn PriceSource>> = vec![birdeye, coingecko, dex_quote];
    let market = Arc::new(MarketService::with_ttl(
        directory as Arc<dyn TokenDirectoryPort>,
        sources,
        Duration::from_secs(config.market.cache_ttl_secs),
    ));

    Ok(Services { chain, dex, market })
}

/// Accepts either a mint address or a verified-list symbol.
async fn resolve_token(market: &MarketService, token: &str) -> Result<TokenInfo> {
    if is_valid_pubkey(token) {
        return Ok(market.token_info(token).await);
    }
    match market.token_by_symbol(token).await {
        Some(info) => Ok(info),
        None => bail!("Unknown token '{}': not a mint address or a verified symbol", token),
    }
}

async fn quote_command(cmd: QuoteCmd, config: &Config) -> Result<()> {
    let services = build_services(config)?;

    let input = resolve_token(&services.market, &cmd.input_token).await?;
    let output = resolve_token(&services.market, &cmd.output_token).await?;

    let amount = Decimal::try_from(cmd.amount).context("Invalid amount")?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be positive");
    }
    let raw_amount = to_raw_units(amount, input.decimals)
        .with_context(|| format!("Amount {} is out of range for {}", cmd.amount, input.symbol))?;

    let request = QuoteRequest::new(
        input.address.clone(),
        output.address.clone(),
        raw_amount,
        cmd.slippage,
    );
    let quote = match services.dex.get_quote(&request).await {
        Some(quote) => quote,
        None => bail!("No quote available for this pair right now. Try again later."),
    };

    println!(
        "Quote: {} {} -> {} {}",
        cmd.amount,
        input.symbol,
        format_token_amount(quote.output_amount(), output.decimals),
        output.symbol
    );
    println!(
        "Minimum received: {} {}",
        format_token_amount(quote.min_output_amount(), output.decimals),
        output.symbol
    );
    println!("Price impact: {:.2}%", quote.price_impact());
    println!("Route: {}", quote.route_labels().join(" -> "));
    if let Some(pct) = impact_warning(quote.price_impact()) {
        println!("WARNING: price impact {:.2}% exceeds the 5% warning threshold", pct);
    }

    Ok(())
}

async fn price_command(cmd: PriceCmd, config: &Config) -> Result<()> {
    let services = build_services(config)?;
    let token = resolve_token(&services.market, &cmd.token).await?;

    match services.market.token_price(&token.address).await {
        Some(price) => println!("{} ({}): ${:.6}", token.symbol, token.address, price),
        None => bail!("No price available for {} right now", token.symbol),
    }

    Ok(())
}

fn wallet_command(cmd: WalletCmd) -> Result<()> {
    let wallet = WalletManager::new_random();

    if cmd.quiet {
        println!("{} {}", wallet.public_key(), wallet.export_base58());
        return Ok(());
    }

    println!("Generated a new wallet keypair.");
    println!();
    println!("Address:     {}", wallet.public_key());
    println!("Private key: {}", wallet.export_base58());
    println!();
    println!("Store the private key somewhere safe; it is not saved anywhere.");

    Ok(())
}

async fn balance_command(cmd: BalanceCmd, config: &Config) -> Result<()> {
    if !is_valid_pubkey(&cmd.address) {
        bail!("'{}' is not a valid Solana address", cmd.address);
    }

    let services = build_services(config)?;

    let lamports = services.chain.sol_balance(&cmd.address).await;
    println!(
        "SOL balance: {} lamports ({:.4} SOL)",
        lamports,
        lamports as f64 / 1e9
    );

    if let Some(mint) = cmd.token {
        if !is_valid_pubkey(&mint) {
            bail!("'{}' is not a valid mint address", mint);
        }
        let token = services.market.token_info(&mint).await;
        let held = services.chain.token_balance(&cmd.address, &mint).await;
        println!(
            "{} balance: {}",
            token.symbol,
            format_token_amount(held.amount, held.decimals)
        );
    }

    Ok(())
}

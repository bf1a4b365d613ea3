//! Trade Engine
//!
//! The orchestrator behind every buy and sell: resolves the user and wallet,
//! checks balances, fetches a quote, surfaces the price impact, executes the
//! swap through the DEX port, and records the outcome in the ledger.
//!
//! A trade moves through `Requested -> Quoted -> AwaitingConfirmation ->
//! Executing -> Recorded`. The preview step stops at `AwaitingConfirmation`;
//! execution is a separate call that re-quotes, because market conditions move
//! between preview and confirm. Users with `auto_confirm` enabled skip the
//! confirmation stop.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    default_settings, display_amount, impact_warning, lamports_to_sol, sol_to_lamports,
    NewTokenBalance, NewTransaction, TradeSide, TradingSettings, TransactionPatch,
    TransactionRecord, TransactionStatus, User, UserWallet, SOL_MINT,
};
use crate::market::{MarketService, TokenInfo};
use crate::ports::chain::{ChainPort, ConfirmationStatus};
use crate::ports::dex::{DexPort, SwapParams};
use crate::ports::store::{LedgerStore, StoreError};

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("User {0} is not registered")]
    UserNotFound(String),
    #[error("No wallet attached to this account. Create or import one first.")]
    NoWallet,
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Sell percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(Decimal),
    #[error("Insufficient SOL balance: need {required} SOL, have {available} SOL")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
    #[error("No balance held for token {0}")]
    NothingToSell(String),
    #[error("No quote available for this pair right now. Try again later.")]
    NoQuote,
    #[error("Swap failed: {0}")]
    SwapFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the user sees before confirming: the quoted trade and its risk flags.
#[derive(Debug, Clone)]
pub struct TradePreview {
    pub side: TradeSide,
    pub token: TokenInfo,
    /// SOL spent for a buy; tokens sold for a sell. Display units.
    pub input_amount: Decimal,
    /// Quoted proceeds in display units (token for a buy, SOL for a sell).
    pub expected_out: Decimal,
    pub price_impact_pct: f64,
    /// Set when the impact is high enough to warn about but not reject.
    pub impact_warning: Option<f64>,
    pub slippage_bps: u16,
}

/// Terminal result of an execution attempt. Total: every failure mode folds
/// into `success = false` with a user-facing reason.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub success: bool,
    pub signature: Option<String>,
    pub record: Option<TransactionRecord>,
    pub error: Option<String>,
}

impl TradeOutcome {
    fn ok(record: TransactionRecord) -> Self {
        Self {
            success: true,
            signature: record.signature.clone(),
            record: Some(record),
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            signature: None,
            record: None,
            error: Some(error.into()),
        }
    }

    /// Submission went through but the chain rejected the transaction. The
    /// failed record stays attached for history lookups.
    fn failed_on_chain(record: TransactionRecord, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            signature: record.signature.clone(),
            record: Some(record),
            error: Some(reason.into()),
        }
    }
}

/// A trade request either paused for the user's confirmation or, for
/// `auto_confirm` users, already executed.
#[derive(Debug)]
pub enum TradeRequest {
    AwaitingConfirmation(TradePreview),
    Executed(TradeOutcome),
}

/// Confirmation polling knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub confirm_poll_interval: Duration,
    pub confirm_max_polls: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirm_poll_interval: Duration::from_secs(2),
            confirm_max_polls: 15,
        }
    }
}

pub struct TradeEngine {
    store: Arc<dyn LedgerStore>,
    dex: Arc<dyn DexPort>,
    chain: Arc<dyn ChainPort>,
    market: Arc<MarketService>,
    config: EngineConfig,
    // One lock per user so two trades against the same wallet cannot race
    // between the balance read and the ledger write.
    user_locks: tokio::sync::Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl TradeEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        dex: Arc<dyn DexPort>,
        chain: Arc<dyn ChainPort>,
        market: Arc<MarketService>,
    ) -> Self {
        Self::with_config(store, dex, chain, market, EngineConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn LedgerStore>,
        dex: Arc<dyn DexPort>,
        chain: Arc<dyn ChainPort>,
        market: Arc<MarketService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            dex,
            chain,
            market,
            config,
            user_locks: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Quote a buy without executing. `Requested -> Quoted -> guard`.
    pub async fn preview_buy(
        &self,
        telegram_id: &str,
        token_address: &str,
        sol_amount: Decimal,
    ) -> Result<TradePreview, TradeError> {
        let (user, wallet) = self.resolve_wallet(telegram_id).await?;
        if sol_amount <= Decimal::ZERO {
            return Err(TradeError::NonPositiveAmount(sol_amount));
        }
        self.check_sol_balance(&wallet, sol_amount).await?;

        let settings = self.settings_for(user.id).await;
        let token = self.market.token_info(token_address).await;
        let lamports = sol_to_lamports(sol_amount);

        let quote = self
            .dex
            .get_quote(&crate::adapters::jupiter::QuoteRequest::new(
                SOL_MINT,
                token_address,
                lamports,
                settings.slippage_bps(),
            ))
            .await
            .ok_or(TradeError::NoQuote)?;

        let impact = quote.price_impact();
        Ok(TradePreview {
            side: TradeSide::Buy,
            expected_out: display_amount(quote.output_amount(), token.decimals),
            token,
            input_amount: sol_amount,
            price_impact_pct: impact,
            impact_warning: impact_warning(impact),
            slippage_bps: settings.slippage_bps(),
        })
    }

    /// Quote a sell of `percentage` of the held balance without executing.
    pub async fn preview_sell(
        &self,
        telegram_id: &str,
        token_address: &str,
        percentage: Decimal,
    ) -> Result<TradePreview, TradeError> {
        let (user, wallet) = self.resolve_wallet(telegram_id).await?;
        let settings = self.settings_for(user.id).await;
        let token = self.market.token_info(token_address).await;
        let (raw_amount, decimals) = self
            .resolve_sell_amount(&wallet, token_address, percentage)
            .await?;

        let quote = self
            .dex
            .get_quote(&crate::adapters::jupiter::QuoteRequest::new(
                token_address,
                SOL_MINT,
                raw_amount,
                settings.slippage_bps(),
            ))
            .await
            .ok_or(TradeError::NoQuote)?;

        let impact = quote.price_impact();
        Ok(TradePreview {
            side: TradeSide::Sell,
            token,
            input_amount: display_amount(raw_amount, decimals),
            expected_out: lamports_to_sol(quote.output_amount()),
            price_impact_pct: impact,
            impact_warning: impact_warning(impact),
            slippage_bps: settings.slippage_bps(),
        })
    }

    /// Start a buy. Pauses at the preview unless the user opted into
    /// `auto_confirm`.
    pub async fn request_buy(
        &self,
        telegram_id: &str,
        token_address: &str,
        sol_amount: Decimal,
    ) -> Result<TradeRequest, TradeError> {
        let preview = self.preview_buy(telegram_id, token_address, sol_amount).await?;
        if self.auto_confirms(telegram_id).await {
            return Ok(TradeRequest::Executed(
                self.execute_buy(telegram_id, token_address, sol_amount).await,
            ));
        }
        Ok(TradeRequest::AwaitingConfirmation(preview))
    }

    /// Start a sell. Pauses at the preview unless the user opted into
    /// `auto_confirm`.
    pub async fn request_sell(
        &self,
        telegram_id: &str,
        token_address: &str,
        percentage: Decimal,
    ) -> Result<TradeRequest, TradeError> {
        let preview = self
            .preview_sell(telegram_id, token_address, percentage)
            .await?;
        if self.auto_confirms(telegram_id).await {
            return Ok(TradeRequest::Executed(
                self.execute_sell(telegram_id, token_address, percentage).await,
            ));
        }
        Ok(TradeRequest::AwaitingConfirmation(preview))
    }

    /// The confirmed leg of a buy: re-quote, swap, record, settle. Runs under
    /// the per-user lock from balance check to ledger write.
    pub async fn execute_buy(
        &self,
        telegram_id: &str,
        token_address: &str,
        sol_amount: Decimal,
    ) -> TradeOutcome {
        let (user, wallet) = match self.resolve_wallet(telegram_id).await {
            Ok(pair) => pair,
            Err(err) => return TradeOutcome::fail(err.to_string()),
        };
        let _guard = self.lock_user(user.id).await;

        match self.run_buy(&user, &wallet, token_address, sol_amount).await {
            Ok(outcome) => outcome,
            Err(err) => TradeOutcome::fail(err.to_string()),
        }
    }

    /// The confirmed leg of a sell of `percentage` of the held balance.
    pub async fn execute_sell(
        &self,
        telegram_id: &str,
        token_address: &str,
        percentage: Decimal,
    ) -> TradeOutcome {
        let (user, wallet) = match self.resolve_wallet(telegram_id).await {
            Ok(pair) => pair,
            Err(err) => return TradeOutcome::fail(err.to_string()),
        };
        let _guard = self.lock_user(user.id).await;

        match self
            .run_sell(&user, &wallet, token_address, percentage)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => TradeOutcome::fail(err.to_string()),
        }
    }

    async fn run_buy(
        &self,
        user: &User,
        wallet: &UserWallet,
        token_address: &str,
        sol_amount: Decimal,
    ) -> Result<TradeOutcome, TradeError> {
        if sol_amount <= Decimal::ZERO {
            return Err(TradeError::NonPositiveAmount(sol_amount));
        }
        self.check_sol_balance(wallet, sol_amount).await?;

        let settings = self.settings_for(user.id).await;
        let token = self.market.token_info(token_address).await;
        let lamports = sol_to_lamports(sol_amount);

        let outcome = self
            .dex
            .execute_swap(SwapParams {
                input_mint: SOL_MINT.to_string(),
                output_mint: token_address.to_string(),
                amount: lamports,
                slippage_bps: settings.slippage_bps(),
                signer_key: wallet.private_key.clone(),
            })
            .await;

        let (signature, quote) = split_outcome(outcome)?;

        let amount = display_amount(quote.output_amount(), token.decimals);
        let record = self
            .store
            .create_transaction(NewTransaction {
                user_id: user.id,
                signature: Some(signature),
                side: TradeSide::Buy,
                token_address: token_address.to_string(),
                token_symbol: Some(token.symbol.clone()),
                token_name: Some(token.name.clone()),
                amount,
                sol_amount,
                price: unit_price(sol_amount, amount),
                slippage: Some(Decimal::from(settings.slippage_bps()) / dec!(100)),
                fees: None,
                metadata: Some(json!({
                    "price_impact_pct": quote.price_impact(),
                    "route": quote.route_labels(),
                })),
            })
            .await?;

        info!(
            user = %user.telegram_id,
            token = %token_address,
            %amount,
            %sol_amount,
            "buy submitted, awaiting confirmation"
        );
        self.settle(record, SettleAction::SetBalance {
            user_id: user.id,
            token,
            balance: amount,
        })
        .await
    }

    async fn run_sell(
        &self,
        user: &User,
        wallet: &UserWallet,
        token_address: &str,
        percentage: Decimal,
    ) -> Result<TradeOutcome, TradeError> {
        let settings = self.settings_for(user.id).await;
        let token = self.market.token_info(token_address).await;
        let (raw_amount, decimals) = self
            .resolve_sell_amount(wallet, token_address, percentage)
            .await?;
        let tokens_sold = display_amount(raw_amount, decimals);

        let outcome = self
            .dex
            .execute_swap(SwapParams {
                input_mint: token_address.to_string(),
                output_mint: SOL_MINT.to_string(),
                amount: raw_amount,
                slippage_bps: settings.slippage_bps(),
                signer_key: wallet.private_key.clone(),
            })
            .await;

        let (signature, quote) = split_outcome(outcome)?;

        // The received side of a sell is SOL, recorded at lamport precision.
        let sol_proceeds = lamports_to_sol(quote.output_amount());
        let record = self
            .store
            .create_transaction(NewTransaction {
                user_id: user.id,
                signature: Some(signature),
                side: TradeSide::Sell,
                token_address: token_address.to_string(),
                token_symbol: Some(token.symbol.clone()),
                token_name: Some(token.name.clone()),
                amount: sol_proceeds,
                sol_amount: sol_proceeds,
                price: unit_price(sol_proceeds, tokens_sold),
                slippage: Some(Decimal::from(settings.slippage_bps()) / dec!(100)),
                fees: None,
                metadata: Some(json!({
                    "price_impact_pct": quote.price_impact(),
                    "route": quote.route_labels(),
                    "tokens_sold": tokens_sold.to_string(),
                    "percentage": percentage.to_string(),
                })),
            })
            .await?;

        info!(
            user = %user.telegram_id,
            token = %token_address,
            %tokens_sold,
            %sol_proceeds,
            "sell submitted, awaiting confirmation"
        );
        self.settle(record, SettleAction::DecrementBalance {
            user_id: user.id,
            token,
            sold: tokens_sold,
        })
        .await
    }

    /// Polls the chain for the submitted transaction and transitions the
    /// pending record. Balances are touched only on `Confirmed`; an on-chain
    /// rejection surfaces as a failure outcome with the failed record
    /// attached, and an exhausted polling window leaves the record pending
    /// for later reconciliation.
    async fn settle(
        &self,
        record: TransactionRecord,
        action: SettleAction,
    ) -> Result<TradeOutcome, TradeError> {
        let signature = record.signature.clone().unwrap_or_default();
        let status = self
            .chain
            .wait_for_confirmation(
                &signature,
                self.config.confirm_poll_interval,
                self.config.confirm_max_polls,
            )
            .await;

        match status {
            ConfirmationStatus::Confirmed => {
                let confirmed = self
                    .store
                    .update_transaction(
                        record.id,
                        TransactionPatch {
                            status: Some(TransactionStatus::Confirmed),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.apply_balance(action).await?;
                info!(%signature, "trade confirmed and recorded");
                Ok(TradeOutcome::ok(confirmed))
            }
            ConfirmationStatus::Failed(reason) => {
                warn!(%signature, %reason, "trade failed on chain");
                let failed = self
                    .store
                    .update_transaction(
                        record.id,
                        TransactionPatch {
                            status: Some(TransactionStatus::Failed),
                            metadata: Some(json!({ "failure": reason.clone() })),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(TradeOutcome::failed_on_chain(
                    failed,
                    format!("Transaction failed on chain: {reason}"),
                ))
            }
            ConfirmationStatus::Pending | ConfirmationStatus::Unknown => {
                warn!(%signature, "confirmation status unknown, record left pending");
                Ok(TradeOutcome::ok(record))
            }
        }
    }

    async fn apply_balance(&self, action: SettleAction) -> Result<(), StoreError> {
        match action {
            SettleAction::SetBalance {
                user_id,
                token,
                balance,
            } => {
                self.store
                    .upsert_token_balance(NewTokenBalance {
                        user_id,
                        token_address: token.address,
                        token_symbol: Some(token.symbol),
                        token_name: Some(token.name),
                        balance,
                    })
                    .await?;
            }
            SettleAction::DecrementBalance {
                user_id,
                token,
                sold,
            } => {
                let held = self
                    .store
                    .token_balance(user_id, &token.address)
                    .await
                    .map(|b| b.balance)
                    .unwrap_or(Decimal::ZERO);
                let remaining = (held - sold).max(Decimal::ZERO);
                self.store
                    .upsert_token_balance(NewTokenBalance {
                        user_id,
                        token_address: token.address,
                        token_symbol: Some(token.symbol),
                        token_name: Some(token.name),
                        balance: remaining,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn resolve_wallet(&self, telegram_id: &str) -> Result<(User, UserWallet), TradeError> {
        let user = self
            .store
            .user_by_telegram_id(telegram_id)
            .await
            .ok_or_else(|| TradeError::UserNotFound(telegram_id.to_string()))?;
        let wallet = user.wallet.clone().ok_or(TradeError::NoWallet)?;
        Ok((user, wallet))
    }

    async fn check_sol_balance(
        &self,
        wallet: &UserWallet,
        sol_amount: Decimal,
    ) -> Result<(), TradeError> {
        let available = lamports_to_sol(self.chain.sol_balance(&wallet.address).await);
        if sol_amount > available {
            return Err(TradeError::InsufficientBalance {
                required: sol_amount,
                available,
            });
        }
        Ok(())
    }

    /// On-chain raw units to sell for a percentage of the held balance.
    async fn resolve_sell_amount(
        &self,
        wallet: &UserWallet,
        token_address: &str,
        percentage: Decimal,
    ) -> Result<(u64, u8), TradeError> {
        if percentage <= Decimal::ZERO || percentage > dec!(100) {
            return Err(TradeError::InvalidPercentage(percentage));
        }
        let held = self.chain.token_balance(&wallet.address, token_address).await;
        if held.amount == 0 {
            return Err(TradeError::NothingToSell(token_address.to_string()));
        }
        let raw = (Decimal::from(held.amount) * percentage / dec!(100))
            .trunc()
            .to_u64()
            .unwrap_or(0);
        if raw == 0 {
            return Err(TradeError::NothingToSell(token_address.to_string()));
        }
        Ok((raw, held.decimals))
    }

    async fn settings_for(&self, user_id: Uuid) -> TradingSettings {
        match self.store.trading_settings(user_id).await {
            Some(settings) => settings,
            None => default_settings(user_id),
        }
    }

    async fn auto_confirms(&self, telegram_id: &str) -> bool {
        match self.store.user_by_telegram_id(telegram_id).await {
            Some(user) => self.settings_for(user.id).await.auto_confirm,
            None => false,
        }
    }

    async fn lock_user(&self, user_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.user_locks.lock().await;
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
}

enum SettleAction {
    /// Buy: the stored balance becomes the received amount.
    SetBalance {
        user_id: Uuid,
        token: TokenInfo,
        balance: Decimal,
    },
    /// Sell: the stored balance shrinks by the amount sold, floored at zero.
    DecrementBalance {
        user_id: Uuid,
        token: TokenInfo,
        sold: Decimal,
    },
}

/// Pulls the signature and quote out of a successful swap, or maps the
/// failure into a user-facing error. Swap-client errors (impact guard,
/// submission rejections) already carry display text and travel verbatim.
fn split_outcome(
    outcome: crate::ports::dex::SwapOutcome,
) -> Result<(String, crate::adapters::jupiter::QuoteResponse), TradeError> {
    match outcome {
        crate::ports::dex::SwapOutcome {
            success: true,
            signature: Some(signature),
            quote: Some(quote),
            ..
        } => Ok((signature, quote)),
        crate::ports::dex::SwapOutcome { error, .. } => Err(error
            .map(TradeError::SwapFailed)
            .unwrap_or(TradeError::NoQuote)),
    }
}

fn unit_price(total: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > Decimal::ZERO {
        Some((total / quantity).round_dp(9))
    } else {
        None
    }
}

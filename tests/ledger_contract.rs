//! Ledger Store Contract Tests
//!
//! Exercises the in-memory ledger through the `LedgerStore` trait: record
//! invariants (unique ids and signatures, pending-by-default, the
//! confirmed_at stamp), merge semantics for patches, and ordering.
//! All tests are deterministic with no network access.

use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use swapdesk::domain::{
    NewTokenBalance, NewTransaction, NewUser, SettingsPatch, TradeSide, TransactionPatch,
    TransactionStatus,
};
use swapdesk::ledger::MemoryLedger;
use swapdesk::ports::store::{LedgerStore, StoreError};

fn new_user(telegram_id: &str) -> NewUser {
    NewUser {
        telegram_id: telegram_id.to_string(),
        username: Some("trader".to_string()),
        ..Default::default()
    }
}

fn buy_tx(user_id: Uuid, signature: Option<&str>) -> NewTransaction {
    NewTransaction {
        user_id,
        signature: signature.map(str::to_string),
        side: TradeSide::Buy,
        token_address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        token_symbol: Some("USDC".to_string()),
        token_name: Some("USD Coin".to_string()),
        amount: dec!(9.000000),
        sol_amount: dec!(0.05),
        price: None,
        slippage: Some(dec!(1)),
        fees: None,
        metadata: None,
    }
}

fn balance_row(user_id: Uuid, mint: &str, balance: rust_decimal::Decimal) -> NewTokenBalance {
    NewTokenBalance {
        user_id,
        token_address: mint.to_string(),
        token_symbol: Some("USDC".to_string()),
        token_name: Some("USD Coin".to_string()),
        balance,
    }
}

#[tokio::test]
async fn settings_merge_keeps_untouched_fields() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();

    // First write creates from defaults with the patch on top.
    let first = store
        .upsert_trading_settings(
            user.id,
            SettingsPatch {
                default_slippage: Some(dec!(2.5)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first.default_slippage, dec!(2.5));
    assert_eq!(first.max_transaction_amount, dec!(1));
    assert!(!first.auto_confirm);
    assert!(first.notifications);

    // Second write touches a different field; the first survives.
    let second = store
        .upsert_trading_settings(
            user.id,
            SettingsPatch {
                auto_confirm: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.default_slippage, dec!(2.5));
    assert!(second.auto_confirm);
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn concurrent_settings_merges_lose_no_fields() {
    let store = Arc::new(MemoryLedger::new());
    let user = store.create_user(new_user("100")).await.unwrap();

    let a = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .upsert_trading_settings(
                    user.id,
                    SettingsPatch {
                        default_slippage: Some(dec!(0.5)),
                        ..Default::default()
                    },
                )
                .await
        })
    };
    let b = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .upsert_trading_settings(
                    user.id,
                    SettingsPatch {
                        max_transaction_amount: Some(dec!(3)),
                        ..Default::default()
                    },
                )
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let settings = store.trading_settings(user.id).await.unwrap();
    assert_eq!(settings.default_slippage, dec!(0.5));
    assert_eq!(settings.max_transaction_amount, dec!(3));
}

#[tokio::test]
async fn confirmed_at_is_set_iff_confirmed() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();
    let record = store.create_transaction(buy_tx(user.id, None)).await.unwrap();

    assert_eq!(record.status, TransactionStatus::Pending);
    assert!(record.confirmed_at.is_none());

    let failed = store
        .update_transaction(
            record.id,
            TransactionPatch {
                status: Some(TransactionStatus::Failed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert!(failed.confirmed_at.is_none());

    let confirmed = store
        .update_transaction(
            record.id,
            TransactionPatch {
                status: Some(TransactionStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, TransactionStatus::Confirmed);
    let stamp = confirmed.confirmed_at.expect("stamped on transition");

    // Re-confirming keeps the original stamp.
    let again = store
        .update_transaction(
            record.id,
            TransactionPatch {
                status: Some(TransactionStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.confirmed_at, Some(stamp));
}

#[tokio::test]
async fn duplicate_signatures_are_rejected() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();

    store
        .create_transaction(buy_tx(user.id, Some("sig1")))
        .await
        .unwrap();
    let err = store
        .create_transaction(buy_tx(user.id, Some("sig1")))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateSignature("sig1".to_string()));

    // Patching a second record onto an existing signature is also refused.
    let other = store.create_transaction(buy_tx(user.id, None)).await.unwrap();
    let err = store
        .update_transaction(
            other.id,
            TransactionPatch {
                signature: Some("sig1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateSignature("sig1".to_string()));
}

#[tokio::test]
async fn transactions_come_back_newest_first_with_limit() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();

    for i in 0..3 {
        store
            .create_transaction(buy_tx(user.id, Some(&format!("sig{}", i))))
            .await
            .unwrap();
        // created_at drives the ordering; keep the timestamps distinct.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let all = store.user_transactions(user.id, None).await;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].signature.as_deref(), Some("sig2"));
    assert_eq!(all[2].signature.as_deref(), Some("sig0"));

    let limited = store.user_transactions(user.id, Some(2)).await;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].signature.as_deref(), Some("sig2"));
}

#[tokio::test]
async fn transactions_are_scoped_to_their_user() {
    let store = MemoryLedger::new();
    let alice = store.create_user(new_user("100")).await.unwrap();
    let bob = store.create_user(new_user("200")).await.unwrap();

    store
        .create_transaction(buy_tx(alice.id, Some("sig-a")))
        .await
        .unwrap();
    store
        .create_transaction(buy_tx(bob.id, Some("sig-b")))
        .await
        .unwrap();

    let records = store.user_transactions(alice.id, None).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].signature.as_deref(), Some("sig-a"));
}

#[tokio::test]
async fn balance_upsert_keeps_one_row_per_pair() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();
    let mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    let first = store
        .upsert_token_balance(balance_row(user.id, mint, dec!(9.000000)))
        .await
        .unwrap();
    let second = store
        .upsert_token_balance(balance_row(user.id, mint, dec!(4.500000)))
        .await
        .unwrap();

    // Same row, replaced balance.
    assert_eq!(second.id, first.id);
    assert_eq!(second.balance, dec!(4.500000));
    assert!(second.last_updated >= first.last_updated);

    let rows = store.user_token_balances(user.id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].balance, dec!(4.500000));
}

#[tokio::test]
async fn lookups_by_signature_and_id_round_trip() {
    let store = MemoryLedger::new();
    let user = store.create_user(new_user("100")).await.unwrap();
    let record = store
        .create_transaction(buy_tx(user.id, Some("sig1")))
        .await
        .unwrap();

    assert_eq!(store.transaction(record.id).await, Some(record.clone()));
    assert_eq!(
        store.transaction_by_signature("sig1").await,
        Some(record)
    );
    assert_eq!(store.transaction_by_signature("missing").await, None);
}

#[tokio::test]
async fn updates_against_unknown_ids_are_not_found() {
    let store = MemoryLedger::new();
    let id = Uuid::new_v4();

    let err = store
        .update_transaction(id, TransactionPatch::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            entity: "transaction",
            id
        }
    );
}

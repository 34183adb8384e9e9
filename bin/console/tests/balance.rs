//! Integration tests for token reads against a live network.
//!
//! These tests require `tests/test-config.toml` and, for the session tests, a
//! funded private key (see `setup.rs`).
//!
//! Run with:
//! ```bash
//! cargo test --package token-console --test balance -- --ignored
//! ```


use alloy_primitives::Address;
use balance::{monitor::BalanceMonitor, BalanceQuery, Monitor};
use setup::{load_test_config, setup_session};

#[tokio::test]
#[ignore = "requires a live RPC endpoint"]
async fn test_token_metadata_query() {
    let config = load_test_config();
    let token = config.token_config().unwrap();

    let provider = client::create_provider(&config.rpc_url)
        .await
        .expect("Failed to create provider");
    let monitor = BalanceMonitor::new(provider);

    let info = monitor
        .token_info(token.token)
        .await
        .expect("Failed to query token metadata");

    println!("✓ Token: {} ({})", info.name, info.symbol);
    println!("  Decimals: {}", info.decimals);
    println!("  Total supply: {}", info.total_supply);

    assert_eq!(info.address, token.token);
    assert_eq!(info.decimals, token.decimals);
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint"]
async fn test_unapproved_allowance_query() {
    let config = load_test_config();
    let token = config.token_config().unwrap();

    let provider = client::create_provider(&config.rpc_url)
        .await
        .expect("Failed to create provider");
    let monitor = BalanceMonitor::new(provider);

    let allowance = monitor
        .query_balance(BalanceQuery::Allowance {
            token: token.token,
            owner: Address::repeat_byte(0x5a),
            spender: Address::repeat_byte(0xa5),
        })
        .await
        .expect("Failed to query allowance");

    assert!(allowance.amount.is_zero());
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint and a private key"]
async fn test_session_balances() {
    let (session, mut notifications) = setup_session().await;

    session
        .refresh_balances()
        .await
        .expect("Failed to refresh balances");

    let state = session.state();
    println!("✓ Token balance: {}", state.token_balance);
    println!("✓ Native balance: {}", state.native_balance);

    let fraction = state.native_balance.split('.').nth(1).unwrap();
    assert_eq!(fraction.len(), 6);
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint and a private key"]
async fn test_session_lookup_keeps_own_balances() {
    let (session, _notifications) = setup_session().await;
    let before = session.state();

    let view = session
        .lookup_wallet("0x000000000000000000000000000000000000dEaD")
        .await
        .expect("Failed to look up wallet");

    println!("✓ {} holds {}", view.address, view.token_balance);

    let after = session.state();
    assert_eq!(after.token_balance, before.token_balance);
    assert_eq!(after.native_balance, before.native_balance);
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint and a private key"]
async fn test_session_rejects_invalid_recipient() {
    let (session, mut notifications) = setup_session().await;

    assert!(session.transfer("0x1234", "1").await.is_err());
    assert_eq!(
        notifications.try_recv().unwrap(),
        session::Notification::Failure("Transfer failed".to_string())
    );
}

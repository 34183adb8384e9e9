//! Wallet connection and the connected account's token operations.

use action::{
    approve::{Approve, ApproveAction},
    transfer::{Transfer, TransferAction},
    Action,
};
use alloy_primitives::{Address, U256};
use alloy_provider::DynProvider;
use balance::{monitor::BalanceMonitor, Balance, BalanceQuery, Monitor, TokenInfo};
use client::{Wallet, WalletSource};
use config::TokenConfig;
use std::future::Future;
use tracing::info;

/// A connected account and the token it operates on.
pub trait TokenBackend: Monitor {
    /// Connected account address.
    fn account(&self) -> Address;

    /// Chain id of the connected network.
    fn chain_id(&self) -> u64;

    /// Token contract address.
    fn token(&self) -> Address;

    /// Decimals used to parse and format token amounts.
    fn decimals(&self) -> u8;

    /// Read token metadata.
    fn token_info(&self) -> impl Future<Output = eyre::Result<TokenInfo>> + Send;

    /// Transfer `amount` raw token units to `recipient` and wait for confirmation.
    fn transfer(
        &self,
        recipient: Address,
        amount: U256,
    ) -> impl Future<Output = eyre::Result<action::Result>> + Send;

    /// Set the allowance of `spender` to `amount` and wait for confirmation.
    fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = eyre::Result<action::Result>> + Send;
}

/// Produces a connected backend: wallet selection, access and signing.
pub trait Connector: Send + Sync {
    type Backend: TokenBackend + 'static;

    fn connect(&self) -> impl Future<Output = eyre::Result<Self::Backend>> + Send;
}

/// Connects the configured wallet source over JSON-RPC.
#[derive(Debug, Clone)]
pub struct WalletConnector {
    rpc_url: String,
    source: WalletSource,
    token: TokenConfig,
}

impl WalletConnector {
    pub fn new(rpc_url: impl Into<String>, source: WalletSource, token: TokenConfig) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            source,
            token,
        }
    }
}

impl Connector for WalletConnector {
    type Backend = ChainBackend;

    async fn connect(&self) -> eyre::Result<ChainBackend> {
        let wallet =
            client::connect_wallet(&self.rpc_url, &self.source, Some(self.token.chain_id)).await?;

        info!(
            address = %wallet.address,
            chain_id = wallet.chain_id,
            token = %self.token.token,
            "Wallet connected."
        );

        Ok(ChainBackend::new(wallet, self.token.clone()))
    }
}

/// Token operations of a connected wallet against a live chain.
#[derive(Debug, Clone)]
pub struct ChainBackend {
    wallet: Wallet,
    token: TokenConfig,
    monitor: BalanceMonitor<DynProvider>,
}

impl ChainBackend {
    pub fn new(wallet: Wallet, token: TokenConfig) -> Self {
        let monitor = BalanceMonitor::new(wallet.provider.clone());
        Self {
            wallet,
            token,
            monitor,
        }
    }
}

impl Monitor for ChainBackend {
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        self.monitor.query_balance(query).await
    }
}

impl TokenBackend for ChainBackend {
    fn account(&self) -> Address {
        self.wallet.address
    }

    fn chain_id(&self) -> u64 {
        self.wallet.chain_id
    }

    fn token(&self) -> Address {
        self.token.token
    }

    fn decimals(&self) -> u8 {
        self.token.decimals
    }

    async fn token_info(&self) -> eyre::Result<TokenInfo> {
        self.monitor.token_info(self.token.token).await
    }

    async fn transfer(&self, recipient: Address, amount: U256) -> eyre::Result<action::Result> {
        let mut action = TransferAction::new(
            self.wallet.provider.clone(),
            self.wallet.signer.clone(),
            Transfer {
                token: self.token.token,
                sender: self.wallet.address,
                recipient,
                amount,
                decimals: self.token.decimals,
                tx_hash: None,
            },
        );

        info!("{}", action.description());
        action.execute().await
    }

    async fn approve(&self, spender: Address, amount: U256) -> eyre::Result<action::Result> {
        let mut action = ApproveAction::new(
            self.wallet.provider.clone(),
            self.wallet.signer.clone(),
            Approve {
                token: self.token.token,
                owner: self.wallet.address,
                spender,
                amount,
                decimals: self.token.decimals,
                tx_hash: None,
            },
        );

        info!("{}", action.description());
        action.execute().await
    }
}

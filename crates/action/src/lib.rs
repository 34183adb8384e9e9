pub mod approve;
pub mod revert;
pub mod transfer;

use alloy_primitives::{TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_rpc_types_eth::TransactionReceipt;
pub use client::SignerFn;
use std::future::Future;
use tracing::debug;

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action and wait for its confirmation.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<Result>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Result {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<U256>,
}

impl From<&TransactionReceipt> for Result {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: Some(U256::from(receipt.gas_used)),
        }
    }
}

/// Sign a transaction, broadcast it and wait for one confirmation.
///
/// There is no local timeout: the wait lasts as long as the provider's
/// receipt polling does.
pub async fn send_signed<P>(
    provider: &P,
    signer: &SignerFn,
    tx: TransactionRequest,
) -> eyre::Result<TransactionReceipt>
where
    P: Provider,
{
    let raw = signer(tx).await?;
    let pending = provider.send_raw_transaction(&raw).await?;
    debug!(tx_hash = %pending.tx_hash(), "Transaction broadcast, waiting for receipt");

    let receipt = pending.get_receipt().await?;
    if !receipt.status() {
        eyre::bail!("Transaction {} reverted", receipt.transaction_hash);
    }

    Ok(receipt)
}

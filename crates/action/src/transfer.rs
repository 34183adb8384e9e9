use crate::{send_signed, Action, SignerFn};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use balance::{monitor::BalanceMonitor, units::format_token_amount, BalanceQuery, Monitor};
use binding::token::IERC20;
use tracing::{info, warn};

/// Transfer input data.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// ERC20 contract address
    pub token: Address,
    /// Connected account, must match the signer
    pub sender: Address,
    pub recipient: Address,
    /// Raw fixed-point amount
    pub amount: U256,
    /// Token decimals, for display only
    pub decimals: u8,
    /// Optional: only exists on a submitted transfer
    pub tx_hash: Option<B256>,
}

/// Token transfer from the connected account.
pub struct TransferAction<P> {
    provider: P,
    signer: SignerFn,
    transfer: Transfer,
}

impl<P> TransferAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, transfer: Transfer) -> Self {
        Self {
            provider,
            signer,
            transfer,
        }
    }

    fn validate_transfer(&self) -> eyre::Result<()> {
        if self.transfer.token == Address::ZERO {
            eyre::bail!("Token must not be zero");
        }

        if self.transfer.sender == Address::ZERO {
            eyre::bail!("Sender must not be zero");
        }

        if self.transfer.recipient == Address::ZERO {
            eyre::bail!("Recipient must not be zero");
        }

        Ok(())
    }
}

impl<P> Action for TransferAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        let monitor = BalanceMonitor::new(self.provider.clone());
        let balance = monitor
            .query_balance(BalanceQuery::ERC20Balance {
                token: self.transfer.token,
                holder: self.transfer.sender,
            })
            .await?;

        Ok(balance.amount >= self.transfer.amount)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.transfer.tx_hash else {
            return Ok(false);
        };

        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(false);
        };

        let Ok(event) = parse_transfer_event(&receipt, self.transfer.token) else {
            return Ok(false);
        };

        Ok(receipt.status()
            && event.from == self.transfer.sender
            && event.to == self.transfer.recipient
            && event.value == self.transfer.amount)
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!("Transfer already executed");
        }

        self.validate_transfer()?;

        if !self.is_ready().await? {
            eyre::bail!("Insufficient token balance for {}", self.description());
        }

        let contract = IERC20::new(self.transfer.token, &self.provider);
        let tx = contract
            .transfer(self.transfer.recipient, self.transfer.amount)
            .from(self.transfer.sender)
            .into_transaction_request();

        let receipt = send_signed(&self.provider, &self.signer, tx).await?;
        self.transfer.tx_hash = Some(receipt.transaction_hash);

        Ok(confirm_transfer(&receipt, self.transfer.token))
    }

    fn description(&self) -> String {
        format!(
            "Transfer {} tokens from {} to {}",
            format_token_amount(self.transfer.amount, self.transfer.decimals),
            self.transfer.sender,
            self.transfer.recipient,
        )
    }
}

/// Log a mined transfer and build its result.
///
/// The receipt already succeeded, so a missing `Transfer` log is only warned
/// about.
pub fn confirm_transfer(receipt: &TransactionReceipt, token: Address) -> crate::Result {
    match parse_transfer_event(receipt, token) {
        Ok(event) => info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            from = %event.from,
            to = %event.to,
            value = %event.value,
            "Transfer confirmed."
        ),
        Err(err) => warn!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            error = %err,
            "Transfer mined without a Transfer event."
        ),
    }

    crate::Result::from(receipt)
}

/// Find the `Transfer` event emitted by `token` in a receipt.
pub fn parse_transfer_event(
    receipt: &TransactionReceipt,
    token: Address,
) -> eyre::Result<IERC20::Transfer> {
    for log in receipt.logs() {
        if log.inner.address != token {
            continue;
        }
        if let Ok(event) = IERC20::Transfer::decode_log(&log.inner) {
            return Ok(event.data);
        }
    }

    eyre::bail!("Transfer event not found in receipt")
}

use crate::{send_signed, Action, SignerFn};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use balance::{monitor::BalanceMonitor, units::format_token_amount, BalanceQuery, Monitor};
use binding::token::IERC20;
use tracing::{info, warn};

/// Input for an approve action.
#[derive(Debug, Clone)]
pub struct Approve {
    /// ERC20 contract address
    pub token: Address,
    /// Token owner (msg.sender) - must match the account signing the transaction.
    pub owner: Address,
    /// Address allowed to spend on behalf of the owner
    pub spender: Address,
    /// New allowance, replacing the current one
    pub amount: U256,
    /// Token decimals, for display only
    pub decimals: u8,
    /// Optional: only exists on a submitted approval
    pub tx_hash: Option<B256>,
}

/// Approve action setting the allowance of a spender.
pub struct ApproveAction<P> {
    provider: P,
    signer: SignerFn,
    approve: Approve,
}

impl<P> ApproveAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, approve: Approve) -> Self {
        Self {
            provider,
            signer,
            approve,
        }
    }

    fn validate_approve(&self) -> eyre::Result<()> {
        if self.approve.token == Address::ZERO {
            eyre::bail!("Token must not be zero");
        }

        if self.approve.owner == Address::ZERO {
            eyre::bail!("Owner must not be zero");
        }

        if self.approve.spender == Address::ZERO {
            eyre::bail!("Spender must not be zero");
        }

        Ok(())
    }

    /// Query the current allowance of the spender.
    pub async fn current_allowance(&self) -> eyre::Result<U256> {
        let monitor = BalanceMonitor::new(self.provider.clone());
        let allowance = monitor
            .query_balance(BalanceQuery::Allowance {
                token: self.approve.token,
                owner: self.approve.owner,
                spender: self.approve.spender,
            })
            .await?;

        Ok(allowance.amount)
    }
}

impl<P> Action for ApproveAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        // Approving more than the balance is allowed by ERC20
        Ok(true)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        if self.approve.tx_hash.is_none() {
            return Ok(false);
        }

        Ok(self.current_allowance().await? == self.approve.amount)
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        self.validate_approve()?;

        if self.is_completed().await? {
            eyre::bail!("Approval already executed");
        }

        let contract = IERC20::new(self.approve.token, &self.provider);
        let tx = contract
            .approve(self.approve.spender, self.approve.amount)
            .from(self.approve.owner)
            .into_transaction_request();

        let receipt = send_signed(&self.provider, &self.signer, tx).await?;
        self.approve.tx_hash = Some(receipt.transaction_hash);

        Ok(confirm_approval(&receipt, self.approve.token))
    }

    fn description(&self) -> String {
        format!(
            "Approve {} to spend {} tokens of {}",
            self.approve.spender,
            format_token_amount(self.approve.amount, self.approve.decimals),
            self.approve.owner,
        )
    }
}

/// Log a mined approval and build its result.
///
/// The receipt already succeeded, so a missing `Approval` log is only warned
/// about.
pub fn confirm_approval(receipt: &TransactionReceipt, token: Address) -> crate::Result {
    match parse_approval_event(receipt, token) {
        Ok(event) => info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            owner = %event.owner,
            spender = %event.spender,
            value = %event.value,
            "Approval confirmed."
        ),
        Err(err) => warn!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            error = %err,
            "Approval mined without an Approval event."
        ),
    }

    crate::Result::from(receipt)
}

/// Find the `Approval` event emitted by `token` in a receipt.
pub fn parse_approval_event(
    receipt: &TransactionReceipt,
    token: Address,
) -> eyre::Result<IERC20::Approval> {
    for log in receipt.logs() {
        if log.inner.address != token {
            continue;
        }
        if let Ok(event) = IERC20::Approval::decode_log(&log.inner) {
            return Ok(event.data);
        }
    }

    eyre::bail!("Approval event not found in receipt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_signer, receipt_without_logs, MockProvider};

    fn approve() -> Approve {
        Approve {
            token: Address::repeat_byte(1),
            owner: Address::repeat_byte(2),
            spender: Address::repeat_byte(3),
            amount: U256::from(2_500_000_000_000_000_000u128),
            decimals: 18,
            tx_hash: None,
        }
    }

    #[test]
    fn test_approve_validation() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        assert!(action.validate_approve().is_ok());
    }

    #[test]
    fn test_approve_validation_zero_spender() {
        let invalid = Approve {
            spender: Address::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), invalid);
        let result = action.validate_approve();
        assert!(result.unwrap_err().to_string().contains("Spender"));
    }

    #[tokio::test]
    async fn test_is_ready() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        assert!(action.is_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_not_completed_without_tx_hash() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        assert!(!action.is_completed().await.unwrap());
    }

    #[test]
    fn test_description() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        let desc = action.description();

        assert!(desc.contains("to spend 2.5 tokens"));
        assert!(desc.contains("0x0303030303030303030303030303030303030303")); // spender
    }

    #[test]
    fn test_approval_without_event_still_confirms() {
        let receipt = receipt_without_logs();
        let token = approve().token;
        assert!(parse_approval_event(&receipt, token).is_err());

        let result = confirm_approval(&receipt, token);
        assert_eq!(result.tx_hash, receipt.transaction_hash);
        assert_eq!(result.block_number, Some(16));
        assert_eq!(result.gas_used, Some(U256::from(46_097)));
    }
}

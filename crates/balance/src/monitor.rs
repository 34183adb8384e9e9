use crate::{Balance, BalanceQuery, Monitor, TokenInfo};
use alloy_primitives::Address;
use alloy_provider::Provider;
use binding::token::IERC20;
use eyre::Result;
use tracing::debug;

// Balance monitor implementation.
#[derive(Debug, Clone)]
pub struct BalanceMonitor<P> {
    provider: P,
}

impl<P> BalanceMonitor<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    async fn query_native(&self, address: Address) -> Result<Balance> {
        debug!("Querying native balance: address={}", address);

        let balance = self.provider.get_balance(address).await?;

        Ok(Balance {
            holder: address,
            asset: Address::ZERO,
            amount: balance,
        })
    }

    async fn query_erc20(&self, token: Address, holder: Address) -> Result<Balance> {
        debug!("Querying erc20 {} balance: address={}", token, holder);

        let contract = IERC20::new(token, &self.provider);
        let amount = contract.balanceOf(holder).call().await?;

        Ok(Balance {
            holder,
            asset: token,
            amount,
        })
    }

    async fn query_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Balance> {
        debug!(
            "Querying erc20 {} allowance: owner={}, spender={}",
            token, owner, spender
        );

        let contract = IERC20::new(token, &self.provider);
        let amount = contract.allowance(owner, spender).call().await?;

        Ok(Balance {
            holder: owner,
            asset: token,
            amount,
        })
    }

    /// Read name, symbol, decimals and total supply of a token.
    pub async fn token_info(&self, token: Address) -> Result<TokenInfo> {
        debug!("Querying erc20 {} metadata", token);

        let contract = IERC20::new(token, &self.provider);
        let name = contract.name().call().await?;
        let symbol = contract.symbol().call().await?;
        let decimals = contract.decimals().call().await?;
        let total_supply = contract.totalSupply().call().await?;

        Ok(TokenInfo {
            address: token,
            name,
            symbol,
            decimals,
            total_supply,
        })
    }
}

impl<P> Monitor for BalanceMonitor<P>
where
    P: Provider + Clone,
{
    async fn query_balance(&self, query: BalanceQuery) -> Result<Balance> {
        match query {
            BalanceQuery::ERC20Balance { token, holder } => self.query_erc20(token, holder).await,
            BalanceQuery::NativeBalance { address } => self.query_native(address).await,
            BalanceQuery::Allowance {
                token,
                owner,
                spender,
            } => self.query_allowance(token, owner, spender).await,
        }
    }
}

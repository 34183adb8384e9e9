//! Balance queries for the token console.
//!
//! This crate provides the read side of the console: ERC20 balances, native
//! balances, allowances and token metadata, plus the conversions between raw
//! fixed-point amounts and display strings.

pub mod monitor;
pub mod units;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Represents a blockchain balance at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The address holding the balance (the owner, for allowances)
    pub holder: Address,
    /// The asset address (zero address for native token)
    pub asset: Address,
    /// The balance amount
    pub amount: U256,
}

/// Type of balance query to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuery {
    /// Query ERC20 token balance for an EOA or contract
    ERC20Balance {
        /// Token contract address
        token: Address,
        /// Holder address
        holder: Address,
    },
    /// Query native ETH balance
    NativeBalance {
        /// Account address
        address: Address,
    },
    /// Query the amount `spender` may move on behalf of `owner`
    ///
    /// Calls `IERC20.allowance(owner, spender)`
    Allowance {
        /// Token contract address
        token: Address,
        /// Token owner
        owner: Address,
        /// Approved spender
        spender: Address,
    },
}

/// Token metadata exposed by the ERC20 interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Trait for monitoring balances on a blockchain.
pub trait Monitor: Send + Sync {
    /// Query a single balance.
    fn query_balance(
        &self,
        query: BalanceQuery,
    ) -> impl Future<Output = eyre::Result<Balance>> + Send;
}

//! Network and token configuration.
//!
//! Provides the token deployment and chain parameters for the supported
//! networks, and a builder for overriding them.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimals used by the default token deployment.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The selected network has no default token deployment
    #[error("No token address configured for network {0:?}")]
    MissingTokenAddress(NetworkType),

    /// Token address must not be the zero address
    #[error("Token address must not be zero")]
    ZeroTokenAddress,

    /// Decimals beyond what a uint256 amount can scale
    #[error("Unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
}

/// Network type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Sepolia,
}

impl NetworkType {
    /// Chain id (network id) of the network.
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Sepolia => 11155111,
        }
    }

    /// Address of the default token deployment, if the network has one.
    pub const fn default_token(self) -> Option<Address> {
        match self {
            Self::Mainnet => None,
            // https://sepolia.etherscan.io/address/0x082Fd82aD86b5AfAD314E6e449492540A7e6A5C7
            Self::Sepolia => Some(address!("0x082Fd82aD86b5AfAD314E6e449492540A7e6A5C7")),
        }
    }
}

/// Token deployment the console talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Network the token is deployed on
    pub network_type: NetworkType,
    /// Chain id the RPC endpoint must serve
    pub chain_id: u64,
    /// ERC20 contract address
    pub token: Address,
    /// Fixed-point decimals of token amounts
    pub decimals: u8,
}

impl TokenConfig {
    /// Default Sepolia token deployment.
    pub const fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Sepolia,
            chain_id: NetworkType::Sepolia.chain_id(),
            token: address!("0x082Fd82aD86b5AfAD314E6e449492540A7e6A5C7"),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

/// Builder for custom token configurations.
#[derive(Debug, Clone)]
pub struct TokenConfigBuilder {
    network_type: NetworkType,
    chain_id: u64,
    token: Option<Address>,
    decimals: u8,
}

impl TokenConfigBuilder {
    /// Start with the defaults of a network.
    pub const fn new(network_type: NetworkType) -> Self {
        Self {
            network_type,
            chain_id: network_type.chain_id(),
            token: network_type.default_token(),
            decimals: DEFAULT_DECIMALS,
        }
    }

    /// Override the token contract address.
    pub const fn token(mut self, address: Address) -> Self {
        self.token = Some(address);
        self
    }

    /// Override the network id, e.g. for a fork or devnet of the network.
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Override the token decimals.
    pub const fn decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Build the token configuration.
    pub fn build(self) -> Result<TokenConfig, ConfigError> {
        let token = self
            .token
            .ok_or(ConfigError::MissingTokenAddress(self.network_type))?;

        if token == Address::ZERO {
            return Err(ConfigError::ZeroTokenAddress);
        }

        // 10^77 is the largest power of ten that fits in a uint256
        if self.decimals > 77 {
            return Err(ConfigError::UnsupportedDecimals(self.decimals));
        }

        Ok(TokenConfig {
            network_type: self.network_type,
            chain_id: self.chain_id,
            token,
            decimals: self.decimals,
        })
    }
}

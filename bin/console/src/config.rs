use alloy_primitives::Address;
use client::WalletSource;
use config::{ConfigError, NetworkType, TokenConfig, TokenConfigBuilder};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level console configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint url
    pub rpc_url: String,

    /// Network the token is deployed on
    #[serde(default = "default_network")]
    pub network: NetworkType,

    /// Network id override, for forks and devnets
    pub network_id: Option<u64>,

    /// Token contract address, defaults to the network's deployment
    pub token_address: Option<Address>,

    /// Token decimals, defaults to 18
    pub decimals: Option<u8>,

    /// Remote signer offered at wallet selection
    pub signer: Option<SignerConfig>,
}

/// Signer-proxy wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Signer-proxy url
    pub remote_url: String,

    /// Account managed by the proxy
    pub address: Address,
}

const fn default_network() -> NetworkType {
    NetworkType::Sepolia
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Token deployment described by this configuration.
    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        let mut builder = TokenConfigBuilder::new(self.network);

        if let Some(token) = self.token_address {
            builder = builder.token(token);
        }
        if let Some(network_id) = self.network_id {
            builder = builder.chain_id(network_id);
        }
        if let Some(decimals) = self.decimals {
            builder = builder.decimals(decimals);
        }

        builder.build()
    }

    /// The configured remote signer as a wallet source.
    pub fn remote_wallet(&self) -> eyre::Result<WalletSource> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| eyre::eyre!("No [signer] section in the configuration"))?;

        Ok(WalletSource::Remote {
            url: signer.remote_url.clone(),
            address: signer.address,
        })
    }
}

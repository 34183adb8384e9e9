mod remote_signer;

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
pub use remote_signer::RemoteSigner;
use std::{fmt, future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// A function that signs a transaction request and returns signed bytes.
///
/// Both local and remote signing implementations produce this type, so the
/// rest of the workspace never holds key material directly.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The RPC endpoint serves a different network than configured
    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Where the signing key of a wallet lives.
#[derive(Clone)]
pub enum WalletSource {
    /// Hex private key held by this process
    PrivateKey(String),
    /// Signer-proxy service that holds the key and signs on request
    Remote {
        /// Signer-proxy URL
        url: String,
        /// Account managed by the proxy
        address: Address,
    },
}

impl fmt::Debug for WalletSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            Self::Remote { url, address } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("address", address)
                .finish(),
        }
    }
}

/// A connected wallet: network access, signing handle and account address.
#[derive(Clone)]
pub struct Wallet {
    /// Read-only network access
    pub provider: DynProvider,
    /// Signs transactions for `address`
    pub signer: SignerFn,
    /// Connected account
    pub address: Address,
    /// Chain id reported by the node
    pub chain_id: u64,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider.erased())
}

/// Connect a wallet against the given RPC endpoint.
///
/// Reads the node's chain id and fails when it differs from `expected_chain_id`.
pub async fn connect_wallet(
    rpc_url: &str,
    source: &WalletSource,
    expected_chain_id: Option<u64>,
) -> Result<Wallet, ClientError> {
    let provider = create_provider(rpc_url).await?;

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ClientError::Connection(format!("{}", e)))?;

    if let Some(expected) = expected_chain_id {
        if expected != chain_id {
            return Err(ClientError::ChainMismatch {
                expected,
                actual: chain_id,
            });
        }
    }

    let (signer, address) = match source {
        WalletSource::PrivateKey(private_key) => {
            let signer: PrivateKeySigner = private_key
                .parse()
                .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))?;
            let address = signer.address();
            (local_signer_fn(signer, chain_id, provider.clone()), address)
        }
        WalletSource::Remote { url, address } => {
            let remote = RemoteSigner::new(url.clone(), *address, chain_id);
            (remote_signer_fn(remote, provider.clone()), *address)
        }
    };

    Ok(Wallet {
        provider,
        signer,
        address,
        chain_id,
    })
}

/// Create a SignerFn from a RemoteSigner and provider.
///
/// The provider is used to fill transaction fields (nonce, gas, fees) before
/// sending to the remote signer-proxy for signing.
pub fn remote_signer_fn<P>(remote: RemoteSigner, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = remote.address();
    let chain_id = remote.chain_id();

    Arc::new(move |tx| {
        let remote = remote.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;
            remote.sign_transaction(filled_tx).await
        })
    })
}

/// Create a SignerFn from a local private key signer and provider.
///
/// The provider is used to fill transaction fields (nonce, gas, fees) before
/// signing locally with the private key.
pub fn local_signer_fn<P>(signer: PrivateKeySigner, chain_id: u64, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    Arc::new(move |tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;

            // Build and sign the typed transaction
            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            // Encode to EIP-2718 bytes
            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    })
}

/// Fill missing transaction fields using the provider.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Fees first: gas estimation may need fee info
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    // A reverting call (insufficient balance, invalid receiver) fails here,
    // carrying the revert data in the RPC error payload.
    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // Add 20% buffer
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[tokio::test]
    async fn test_invalid_url() {
        let result = create_provider("not a url").await;
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_connect_wallet_invalid_url() {
        let source = WalletSource::PrivateKey("0x01".to_string());
        let result = connect_wallet("not a url", &source, Some(1)).await;
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_private_key_is_redacted() {
        let source = WalletSource::PrivateKey(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        );
        let debug = format!("{:?}", source);
        assert_eq!(debug, "PrivateKey(<redacted>)");
    }

    #[test]
    fn test_remote_source_debug() {
        let source = WalletSource::Remote {
            url: "http://localhost:9060".to_string(),
            address: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
        };
        let debug = format!("{:?}", source);
        assert!(debug.contains("http://localhost:9060"));
    }

    #[test]
    fn test_chain_mismatch_message() {
        let err = ClientError::ChainMismatch {
            expected: 11155111,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Chain id mismatch: expected 11155111, node reports 1"
        );
    }
}

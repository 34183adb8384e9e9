pub mod command;
pub mod config;
pub mod metrics;
pub mod view;

use client::WalletSource;
use crate::config::Config;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. Logs go to stderr so they never mix with
/// command output.
pub fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Wallet chosen from the command line, if any.
pub fn wallet_from_args(
    config: &Config,
    private_key: Option<String>,
    remote: bool,
) -> eyre::Result<Option<WalletSource>> {
    if remote {
        return config.remote_wallet().map(Some);
    }

    Ok(private_key.map(WalletSource::PrivateKey))
}

/// Ask which wallet to connect, reading answers from `lines`.
pub async fn prompt_wallet<R>(config: &Config, lines: &mut Lines<R>) -> eyre::Result<WalletSource>
where
    R: AsyncBufRead + Unpin,
{
    println!("Select a wallet:");
    println!("  [1] Private key");
    if let Some(signer) = &config.signer {
        println!(
            "  [2] Remote signer at {} ({})",
            signer.remote_url, signer.address
        );
    }

    let choice = lines
        .next_line()
        .await?
        .ok_or_else(|| eyre::eyre!("No wallet selected"))?;

    match choice.trim() {
        "1" => {
            println!("Private key:");
            let key = lines
                .next_line()
                .await?
                .ok_or_else(|| eyre::eyre!("No private key entered"))?;
            Ok(WalletSource::PrivateKey(key.trim().to_string()))
        }
        "2" if config.signer.is_some() => config.remote_wallet(),
        other => eyre::bail!("Unknown wallet choice {other:?}"),
    }
}

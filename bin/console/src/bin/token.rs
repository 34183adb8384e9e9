//! One-shot CLI for a single ERC20 token.
//!
//! Each invocation connects the wallet, runs one command and exits:
//! - `balance`: connected account's token and native balances
//! - `transfer`: send tokens and wait for confirmation
//! - `approve`: set a spender's allowance and wait for confirmation
//! - `allowance`: read a spender's allowance
//! - `lookup`: read any wallet's balances
//! - `info`: token metadata

use clap::{Parser, Subcommand};
use session::{Session, SessionError, WalletConnector};
use std::path::PathBuf;
use token_console::{config::Config, init_tracing, view::Output, wallet_from_args};
use tracing::info;

#[derive(Parser)]
#[command(name = "token")]
#[command(about = "Run one operation against an ERC20 token")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Sign with the remote signer from the configuration file
    #[arg(long)]
    remote: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the connected account's balances
    Balance,

    /// Send tokens to a recipient
    Transfer {
        /// Recipient address
        recipient: String,
        /// Amount in token units
        amount: String,
    },

    /// Allow a spender to move tokens from the connected account
    Approve {
        /// Spender address
        spender: String,
        /// Amount in token units
        amount: String,
    },

    /// Show how much a spender may move from the connected account
    Allowance {
        /// Spender address
        spender: String,
    },

    /// Show the balances of any wallet
    Lookup {
        /// Wallet address
        address: String,
    },

    /// Show token metadata
    Info,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing("info", cli.json);

    let config = Config::from_file(&cli.config)?;
    let token = config.token_config()?;
    let source = wallet_from_args(&config, cli.private_key, cli.remote)?.ok_or_else(|| {
        eyre::eyre!("No wallet selected: pass --private-key, set PRIVATE_KEY or pass --remote")
    })?;

    info!(chain_id = token.chain_id, token = %token.token, "Loaded config");

    let (session, mut notifications) =
        Session::new(WalletConnector::new(&config.rpc_url, source, token));

    let outcome = run(&session, cli.command).await;

    while let Ok(notification) = notifications.try_recv() {
        eprintln!("{notification}");
    }

    let output = outcome?;
    if cli.json {
        println!("{}", output.to_json()?);
    } else {
        println!("{}", output.to_text());
    }

    Ok(())
}

async fn run(
    session: &Session<WalletConnector>,
    command: Command,
) -> Result<Output, SessionError> {
    session.connect().await?;

    let output = match command {
        Command::Balance => {
            session.refresh_balances().await?;
            Output::State(session.state())
        }
        Command::Transfer { recipient, amount } => {
            Output::from(&session.transfer(&recipient, &amount).await?)
        }
        Command::Approve { spender, amount } => {
            Output::from(&session.approve(&spender, &amount).await?)
        }
        Command::Allowance { spender } => {
            Output::Allowance(session.check_allowance(&spender).await?)
        }
        Command::Lookup { address } => Output::Wallet(session.lookup_wallet(&address).await?),
        Command::Info => Output::Token(session.token_info().await?),
    };

    Ok(output)
}

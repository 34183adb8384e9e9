//! Interactive console for a single ERC20 token.
//!
//! Connects the selected wallet on start, then reads commands from stdin.
//! Transfers and approvals wait for confirmation in the background so the
//! prompt stays usable; their outcomes are printed as notifications.

use clap::Parser;
use session::{ActionKind, Session, WalletConnector};
use std::{io::Write, path::PathBuf, sync::Arc, time::Instant};
use token_console::{
    command::{parse_line, Command},
    config::Config,
    init_tracing,
    metrics::{install_prometheus_exporter, Metrics},
    prompt_wallet,
    view::{render_allowance, render_state, render_token, render_wallet},
    wallet_from_args,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

type ConsoleSession = Session<WalletConnector>;

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Interactive console for an ERC20 token")]
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

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing("warn", cli.json_logs);

    let config = Config::from_file(&cli.config)?;
    let token = config.token_config()?;

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Metrics exporter listening");
    }
    let metrics = Metrics::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let source = match wallet_from_args(&config, cli.private_key, cli.remote)? {
        Some(source) => source,
        None => prompt_wallet(&config, &mut lines).await?,
    };

    info!(
        network = ?token.network_type,
        chain_id = token.chain_id,
        token = %token.token,
        "Loaded config"
    );

    let (session, mut notifications) =
        Session::new(WalletConnector::new(&config.rpc_url, source, token));
    let session = Arc::new(session);

    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            println!("{notification}");
        }
    });

    tokio::spawn({
        let mut updates = session.subscribe();
        let metrics = metrics.clone();
        async move {
            while updates.changed().await.is_ok() {
                metrics.observe_state(&updates.borrow_and_update());
            }
        }
    });

    if session.connect().await.is_ok() {
        println!("{}", render_state(&session.state()));
    }

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run_command(&session, &metrics, command).await,
            Err(err) => println!("{}", err.render()),
        }
    }

    let pending = session.state().pending;
    if pending.transfer || pending.approve {
        println!("Leaving with transactions still pending; check them on a block explorer.");
    }

    Ok(())
}

async fn run_command(session: &Arc<ConsoleSession>, metrics: &Metrics, command: Command) {
    match command {
        Command::Connect => {
            if let Ok(connection) = session.connect().await {
                println!("Connected {}", connection.address);
            }
        }
        Command::Refresh => {
            let result = session.refresh_balances().await;
            metrics.record_read("refresh", result.is_ok());
            match result {
                Ok(()) => println!("{}", render_state(&session.state())),
                Err(err) => println!("{}", err.user_message()),
            }
        }
        Command::Transfer { recipient, amount } => {
            spawn_action(session, metrics, ActionKind::Transfer, recipient, amount);
        }
        Command::Approve { spender, amount } => {
            spawn_action(session, metrics, ActionKind::Approve, spender, amount);
        }
        Command::Allowance { spender } => {
            let result = session.check_allowance(&spender).await;
            metrics.record_read("allowance", result.is_ok());
            if let Ok(view) = result {
                println!("{}", render_allowance(&view));
            }
        }
        Command::Lookup { address } => {
            let result = session.lookup_wallet(&address).await;
            metrics.record_read("lookup", result.is_ok());
            if let Ok(view) = result {
                println!("{}", render_wallet(&view));
            }
        }
        Command::Info => {
            if let Ok(info) = session.token_info().await {
                println!("{}", render_token(&info));
            }
        }
        Command::Status => println!("{}", render_state(&session.state())),
        Command::Quit => {}
    }
}

/// Submit a transaction and wait for its confirmation off the prompt.
fn spawn_action(
    session: &Arc<ConsoleSession>,
    metrics: &Metrics,
    kind: ActionKind,
    counterparty: String,
    amount: String,
) {
    let session = session.clone();
    let metrics = metrics.clone();

    println!("Submitting {kind}...");
    tokio::spawn(async move {
        let started = Instant::now();
        let result = match kind {
            ActionKind::Transfer => session.transfer(&counterparty, &amount).await,
            ActionKind::Approve => session.approve(&counterparty, &amount).await,
        };
        metrics.record_action(kind, result.is_ok(), started.elapsed());

        if let Ok(receipt) = result {
            println!("{kind} confirmed: {}", receipt.tx_hash);
        }
    });
}

//! Commands accepted at the console prompt.

use clap::{Parser, Subcommand};

/// One line typed at the prompt.
#[derive(Debug, Parser)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Connect the selected wallet
    Connect,

    /// Re-read the connected account's balances
    Refresh,

    /// Send tokens, waiting in the background for confirmation
    Transfer {
        /// Recipient address
        recipient: String,
        /// Amount in token units, e.g. 1.5
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

    /// Show token name, symbol, decimals and supply
    Info,

    /// Show the connected account and its balances
    Status,

    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// Parse a prompt line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    Line::try_parse_from(words).map(|line| Some(line.command))
}

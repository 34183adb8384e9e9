//! Text and JSON rendering of session data.

use alloy_primitives::TxHash;
use balance::{units::format_token_amount, TokenInfo};
use serde::Serialize;
use session::{AllowanceView, SessionState, WalletView};

/// Result of a one-shot command.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    State(SessionState),
    Allowance(AllowanceView),
    Wallet(WalletView),
    Token(TokenInfo),
    Receipt {
        tx_hash: TxHash,
        block_number: Option<u64>,
    },
}

impl From<&action::Result> for Output {
    fn from(result: &action::Result) -> Self {
        Self::Receipt {
            tx_hash: result.tx_hash,
            block_number: result.block_number,
        }
    }
}

impl Output {
    pub fn to_json(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::State(state) => render_state(state),
            Self::Allowance(view) => render_allowance(view),
            Self::Wallet(view) => render_wallet(view),
            Self::Token(info) => render_token(info),
            Self::Receipt {
                tx_hash,
                block_number,
            } => match block_number {
                Some(block) => format!("Confirmed {tx_hash} in block {block}"),
                None => format!("Confirmed {tx_hash}"),
            },
        }
    }
}

/// The connected account panel.
pub fn render_state(state: &SessionState) -> String {
    let Some(connection) = state.connection else {
        return "Not connected".to_string();
    };

    let token_balance = match &state.token {
        Some(token) => format!("{} {}", state.token_balance, token.symbol),
        None => state.token_balance.clone(),
    };

    let mut out = format!(
        "Connected Address: {}\nNetwork ID: {}\nToken Balance: {token_balance}\nETH Balance: {}",
        connection.address, connection.chain_id, state.native_balance
    );

    if state.pending.transfer {
        out.push_str("\nTransfer pending...");
    }
    if state.pending.approve {
        out.push_str("\nApproval pending...");
    }

    out
}

pub fn render_allowance(view: &AllowanceView) -> String {
    format!("Allowance of {}: {}", view.spender, view.amount)
}

pub fn render_wallet(view: &WalletView) -> String {
    format!(
        "Wallet: {}\nToken Balance: {}\nETH Balance: {}",
        view.address, view.token_balance, view.native_balance
    )
}

pub fn render_token(info: &TokenInfo) -> String {
    format!(
        "Token: {} ({})\nAddress: {}\nDecimals: {}\nTotal Supply: {}",
        info.name,
        info.symbol,
        info.address,
        info.decimals,
        format_token_amount(info.total_supply, info.decimals)
    )
}

use crate::state::ActionKind;
use action::revert::{decode_report, TokenRevert};
use thiserror::Error;

/// Failure of a session operation, tagged by what the user was doing.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Wallet selection, RPC connection or account access failed
    #[error("Wallet connection failed: {0:#}")]
    Connection(eyre::Report),

    /// Reading balances, allowance or token metadata failed
    #[error("Token read failed: {0:#}")]
    Read(eyre::Report),

    /// Parsing the input, submitting or confirming a transaction failed
    #[error("{action} failed: {cause:#}")]
    Transaction {
        action: ActionKind,
        cause: eyre::Report,
    },

    /// Reading an arbitrary wallet's balances failed
    #[error("Wallet lookup failed: {0:#}")]
    Lookup(eyre::Report),

    #[error("Wallet not connected")]
    NotConnected,

    /// The same action is still waiting for confirmation
    #[error("A {0} is already in flight")]
    Busy(ActionKind),
}

impl SessionError {
    /// Generic text shown to the user for this kind of failure.
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Connection(_) => {
                "Error connecting to wallet. Please check your wallet connection."
            }
            Self::Read(_) => "Failed to read from the token contract",
            Self::Transaction {
                action: ActionKind::Transfer,
                ..
            } => "Transfer failed",
            Self::Transaction {
                action: ActionKind::Approve,
                ..
            } => "Approval failed",
            Self::Lookup(_) => "Failed to fetch wallet balance",
            Self::NotConnected => "Wallet not connected",
            Self::Busy(ActionKind::Transfer) => "A transfer is already pending",
            Self::Busy(ActionKind::Approve) => "An approval is already pending",
        }
    }

    /// Underlying cause, if the failure came from the wallet or the chain.
    pub const fn cause(&self) -> Option<&eyre::Report> {
        match self {
            Self::Connection(cause)
            | Self::Read(cause)
            | Self::Lookup(cause)
            | Self::Transaction { cause, .. } => Some(cause),
            Self::NotConnected | Self::Busy(_) => None,
        }
    }

    /// Token revert reason carried by the cause, if any.
    pub fn revert_reason(&self) -> Option<TokenRevert> {
        self.cause().and_then(decode_report)
    }
}

/// Message surfaced to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

impl From<&SessionError> for Notification {
    fn from(err: &SessionError) -> Self {
        match err.revert_reason() {
            Some(reason) => Self::Failure(format!("{}: {}", err.user_message(), reason)),
            None => Self::Failure(err.user_message().to_string()),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(message) => write!(f, "✓ {message}"),
            Self::Failure(message) => write!(f, "✗ {message}"),
        }
    }
}

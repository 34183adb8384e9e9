//! Display state of a session and its transitions.

use alloy_primitives::Address;
use balance::TokenInfo;
use serde::Serialize;
use std::fmt;

/// User actions that submit a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Transfer,
    Approve,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => f.write_str("transfer"),
            Self::Approve => f.write_str("approve"),
        }
    }
}

/// The connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub address: Address,
    pub chain_id: u64,
}

/// Result of the last allowance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowanceView {
    pub owner: Address,
    pub spender: Address,
    /// Allowance in token units
    pub amount: String,
}

/// Balances of an arbitrary wallet, separate from the connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    pub address: Address,
    pub token_balance: String,
    pub native_balance: String,
}

/// In-flight flags, one per transaction-submitting action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pending {
    pub transfer: bool,
    pub approve: bool,
}

impl Pending {
    pub const fn is_pending(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Transfer => self.transfer,
            ActionKind::Approve => self.approve,
        }
    }

    const fn with(mut self, kind: ActionKind, pending: bool) -> Self {
        match kind {
            ActionKind::Transfer => self.transfer = pending,
            ActionKind::Approve => self.approve = pending,
        }
        self
    }
}

/// Snapshot of everything the console displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Absent until a wallet connects; never replaced afterwards
    pub connection: Option<ConnectionInfo>,
    /// Connected account's token balance, in token units
    pub token_balance: String,
    /// Connected account's native balance, six decimals
    pub native_balance: String,
    pub allowance: Option<AllowanceView>,
    pub lookup: Option<WalletView>,
    pub token: Option<TokenInfo>,
    pub pending: Pending,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connection: None,
            token_balance: "0".to_string(),
            native_balance: "0".to_string(),
            allowance: None,
            lookup: None,
            token: None,
            pending: Pending::default(),
        }
    }
}

/// A state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Connected(ConnectionInfo),
    TokenInfoLoaded(TokenInfo),
    BalancesRefreshed {
        token_balance: String,
        native_balance: String,
    },
    AllowanceChecked(AllowanceView),
    WalletLookedUp(WalletView),
    ActionStarted(ActionKind),
    ActionFinished(ActionKind),
}

impl SessionState {
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Produce the state that follows `update`.
    ///
    /// Account data is ignored while disconnected, and a connection, once set,
    /// is kept.
    pub fn apply(&self, update: Update) -> Self {
        let mut next = self.clone();

        match update {
            Update::Connected(info) => {
                next.connection.get_or_insert(info);
            }
            _ if !self.is_connected() => {}
            Update::TokenInfoLoaded(info) => next.token = Some(info),
            Update::BalancesRefreshed {
                token_balance,
                native_balance,
            } => {
                next.token_balance = token_balance;
                next.native_balance = native_balance;
            }
            Update::AllowanceChecked(view) => next.allowance = Some(view),
            Update::WalletLookedUp(view) => next.lookup = Some(view),
            Update::ActionStarted(kind) => next.pending = self.pending.with(kind, true),
            Update::ActionFinished(kind) => next.pending = self.pending.with(kind, false),
        }

        next
    }
}

//! Wallet session for a single ERC20 token.
//!
//! A [`Session`] connects a wallet through a [`Connector`], then serves the
//! console's operations: balance refresh, transfer, approve, allowance check
//! and arbitrary wallet lookup. Every change to what the user sees is an
//! [`Update`] applied to an immutable [`SessionState`] snapshot, published on
//! a watch channel. Outcomes of user actions are reported as [`Notification`]s.

pub mod backend;
pub mod error;
pub mod input;
pub mod state;
mod store;

pub use backend::{ChainBackend, Connector, TokenBackend, WalletConnector};
pub use error::{Notification, SessionError};
pub use state::{
    ActionKind, AllowanceView, ConnectionInfo, Pending, SessionState, Update, WalletView,
};
pub use store::Session;

#[cfg(test)]
pub(crate) mod test_utils;

//! Decoding of the token's custom revert errors.
//!
//! Reverting transfers and approvals surface as JSON-RPC errors during gas
//! estimation or `eth_call`; the revert data sits in the error payload.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolInterface;
use alloy_transport::TransportError;
use binding::token::IERC20::IERC20Errors;
use thiserror::Error;

/// A revert reason defined by the token contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenRevert {
    #[error("insufficient allowance: {spender} may spend {allowance}, needs {needed}")]
    InsufficientAllowance {
        spender: Address,
        allowance: U256,
        needed: U256,
    },

    #[error("insufficient balance: {sender} holds {balance}, needs {needed}")]
    InsufficientBalance {
        sender: Address,
        balance: U256,
        needed: U256,
    },

    #[error("invalid approver {0}")]
    InvalidApprover(Address),

    #[error("invalid receiver {0}")]
    InvalidReceiver(Address),

    #[error("invalid sender {0}")]
    InvalidSender(Address),

    #[error("invalid spender {0}")]
    InvalidSpender(Address),
}

impl From<IERC20Errors> for TokenRevert {
    fn from(err: IERC20Errors) -> Self {
        match err {
            IERC20Errors::ERC20InsufficientAllowance(e) => Self::InsufficientAllowance {
                spender: e.spender,
                allowance: e.allowance,
                needed: e.needed,
            },
            IERC20Errors::ERC20InsufficientBalance(e) => Self::InsufficientBalance {
                sender: e.sender,
                balance: e.balance,
                needed: e.needed,
            },
            IERC20Errors::ERC20InvalidApprover(e) => Self::InvalidApprover(e.approver),
            IERC20Errors::ERC20InvalidReceiver(e) => Self::InvalidReceiver(e.receiver),
            IERC20Errors::ERC20InvalidSender(e) => Self::InvalidSender(e.sender),
            IERC20Errors::ERC20InvalidSpender(e) => Self::InvalidSpender(e.spender),
        }
    }
}

/// Decode raw revert data (selector + arguments).
pub fn decode_revert_data(data: &[u8]) -> Option<TokenRevert> {
    IERC20Errors::abi_decode(data).ok().map(TokenRevert::from)
}

/// Find and decode token revert data anywhere in an error chain.
pub fn decode_report(report: &eyre::Report) -> Option<TokenRevert> {
    report.chain().find_map(|cause| {
        let transport = cause.downcast_ref::<TransportError>().or_else(|| {
            match cause.downcast_ref::<alloy_contract::Error>() {
                Some(alloy_contract::Error::TransportError(err)) => Some(err),
                _ => None,
            }
        })?;

        let data = transport.as_error_resp()?.as_revert_data()?;
        decode_revert_data(&data)
    })
}

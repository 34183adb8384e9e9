//! Contract bindings for the token contract.
//!
//! The ERC20 interface is generated using alloy's `sol!` macro, including the
//! custom errors the token reverts with so callers can decode revert data.

pub mod token;

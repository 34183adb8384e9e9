//! Configuration types for the token console.
//!
//! This crate provides:
//! - Network definitions (mainnet, sepolia) and their chain ids
//! - The token deployment to talk to, with its decimals
//! - A builder for overriding the defaults from file or CLI configuration

pub mod network;

pub use network::{ConfigError, NetworkType, TokenConfig, TokenConfigBuilder};

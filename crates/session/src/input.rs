//! Parsing of free-text form inputs.

use alloy_primitives::{Address, AddressError};

/// Parse an address typed by the user.
///
/// All-lowercase and all-uppercase hex is accepted as is; mixed case must be a
/// valid EIP-55 checksum.
pub fn parse_address(text: &str) -> Result<Address, AddressError> {
    let text = text.trim();
    let hex = text.strip_prefix("0x").unwrap_or(text);

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(text, None)
    } else {
        Ok(text.parse::<Address>()?)
    }
}

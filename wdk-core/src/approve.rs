//! Stateless ERC-20 approval transaction builder.
//!
//! Builds the unsigned `approve(address,uint256)` call without touching any
//! backend or account: the calldata layout is fixed, so a full ABI encoder
//! is not needed for this single function.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 4-byte selector of `approve(address,uint256)`.
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Options for building an approval transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveOptions {
    /// Token contract to approve on.
    pub token: String,
    /// Spender being approved.
    pub recipient: String,
    /// Allowance amount in the token's base unit.
    pub amount: u128,
}

/// An unsigned EVM transaction approving a spender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTransaction {
    /// The token contract address.
    pub to: String,
    /// Native value attached (always zero for approvals).
    pub value: u128,
    /// Hex-encoded calldata, `0x`-prefixed.
    pub data: String,
}

/// Build the unsigned approval transaction for the given options.
pub fn encode_approve(options: &ApproveOptions) -> Result<ApproveTransaction> {
    let spender = parse_address(&options.recipient)?;

    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&APPROVE_SELECTOR);
    // address, left-padded to 32 bytes
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&spender);
    // uint256 amount, big-endian, left-padded to 32 bytes
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&options.amount.to_be_bytes());

    Ok(ApproveTransaction {
        to: options.token.clone(),
        value: 0,
        data: format!("0x{}", hex::encode(data)),
    })
}

fn parse_address(address: &str) -> Result<[u8; 20]> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(stripped)
        .map_err(|_| Error::configuration(format!("invalid address: {address}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::configuration(format!("invalid address length: {address}")))
}

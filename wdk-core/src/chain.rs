//! Blockchain identifiers and the static capability table.
//!
//! [`Blockchain`] is a closed enum: any identifier outside the set is
//! rejected at the string boundary, before any backend is touched. The
//! capability table is pure compile-time data — it does not depend on a
//! live seed, configuration, or backend instance, and is consulted as a
//! guard before capability-specific operations are forwarded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Enumeration of all supported blockchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blockchain {
    /// Ethereum mainnet (EVM).
    Ethereum,
    /// Arbitrum (EVM).
    Arbitrum,
    /// Polygon (EVM).
    Polygon,
    /// The Open Network.
    Ton,
    /// Tron.
    Tron,
    /// Bitcoin.
    Bitcoin,
    /// Solana.
    Solana,
}

impl Blockchain {
    /// All supported blockchains, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Ethereum,
        Self::Arbitrum,
        Self::Polygon,
        Self::Ton,
        Self::Tron,
        Self::Bitcoin,
        Self::Solana,
    ];

    /// The lowercase wire identifier (e.g. `"ethereum"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Arbitrum => "arbitrum",
            Self::Polygon => "polygon",
            Self::Ton => "ton",
            Self::Tron => "tron",
            Self::Bitcoin => "bitcoin",
            Self::Solana => "solana",
        }
    }

    /// Whether this chain uses the EVM execution model.
    #[must_use]
    pub const fn is_evm(self) -> bool {
        matches!(self, Self::Ethereum | Self::Arbitrum | Self::Polygon)
    }

    /// Check whether this blockchain supports a capability.
    ///
    /// Pure and total: the table is static and consulting it never fails.
    #[must_use]
    pub const fn supports(self, capability: Capability) -> bool {
        match capability {
            // ERC-4337 on EVM chains, gasless on TON, gas-free on TRON.
            // Bitcoin and Solana have no account-abstraction backend.
            Capability::AccountAbstraction => {
                matches!(
                    self,
                    Self::Ethereum | Self::Arbitrum | Self::Polygon | Self::Ton | Self::Tron
                )
            }
            // OP_RETURN memos and raw transaction hex are Bitcoin-only.
            Capability::MemoTransfer | Capability::RawHexQuote => {
                matches!(self, Self::Bitcoin)
            }
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Blockchain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" => Ok(Self::Ethereum),
            "arbitrum" => Ok(Self::Arbitrum),
            "polygon" => Ok(Self::Polygon),
            "ton" => Ok(Self::Ton),
            "tron" => Ok(Self::Tron),
            "bitcoin" => Ok(Self::Bitcoin),
            "solana" => Ok(Self::Solana),
            other => Err(Error::unsupported_blockchain(other)),
        }
    }
}

/// A named optional feature a backend may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Gas fees paid via a paymaster token instead of the native asset.
    AccountAbstraction,
    /// Transfers carrying an attached memo.
    MemoTransfer,
    /// Quoting that returns the raw transaction hex instead of a fee.
    RawHexQuote,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccountAbstraction => "account abstraction",
            Self::MemoTransfer => "memo transfer",
            Self::RawHexQuote => "raw-hex quoting",
        };
        f.write_str(name)
    }
}

//! Seed material ownership and per-chain resolution.
//!
//! The manager exclusively owns its [`SeedMaterial`] for its lifetime.
//! Resolution hands out borrows only — the number of secret copies in
//! memory is whatever each backend constructor itself makes, nothing more.
//! Secrets are zeroized when dropped, so disposing the manager erases the
//! seed rather than merely forgetting it.

use std::collections::HashMap;

use bip39::{Language, Mnemonic};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::chain::Blockchain;
use crate::error::{Error, Result};

/// A single secret: a BIP-39 passphrase or a raw byte buffer.
///
/// The contents are overwritten with zeros on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum Seed {
    /// A BIP-39 mnemonic phrase.
    Phrase(String),
    /// Raw seed bytes.
    Bytes(Vec<u8>),
}

impl Seed {
    /// The phrase, if this seed is a mnemonic.
    #[must_use]
    pub fn as_phrase(&self) -> Option<&str> {
        match self {
            Self::Phrase(phrase) => Some(phrase),
            Self::Bytes(_) => None,
        }
    }

    /// The raw bytes, if this seed is a byte buffer.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Phrase(_) => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }
}

// Never leak secret contents through Debug output.
impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phrase(_) => f.write_str("Seed::Phrase(<redacted>)"),
            Self::Bytes(_) => f.write_str("Seed::Bytes(<redacted>)"),
        }
    }
}

impl From<&str> for Seed {
    fn from(phrase: &str) -> Self {
        Self::Phrase(phrase.to_owned())
    }
}

impl From<String> for Seed {
    fn from(phrase: String) -> Self {
        Self::Phrase(phrase)
    }
}

impl From<Vec<u8>> for Seed {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// The seed material a manager is constructed with: one secret shared by
/// all chains, or a mapping from blockchain to a per-chain secret.
///
/// Each contained [`Seed`] zeroizes itself on drop, so dropping the
/// material erases every secret it holds.
#[derive(Debug, Clone)]
pub enum SeedMaterial {
    /// A single secret used for every blockchain.
    Shared(Seed),
    /// A distinct secret per blockchain.
    PerChain(HashMap<Blockchain, Seed>),
}

impl SeedMaterial {
    /// Resolve the secret for one blockchain.
    ///
    /// Shared material resolves to the same secret for any chain. Per-chain
    /// material fails with a configuration error when the entry is absent.
    /// Only a borrow is returned; the secret is never cloned here.
    pub fn resolve(&self, blockchain: Blockchain) -> Result<&Seed> {
        match self {
            Self::Shared(seed) => Ok(seed),
            Self::PerChain(seeds) => seeds.get(&blockchain).ok_or_else(|| {
                Error::configuration(format!("no seed configured for blockchain {blockchain}"))
            }),
        }
    }
}

impl From<Seed> for SeedMaterial {
    fn from(seed: Seed) -> Self {
        Self::Shared(seed)
    }
}

impl From<&str> for SeedMaterial {
    fn from(phrase: &str) -> Self {
        Self::Shared(Seed::from(phrase))
    }
}

impl From<String> for SeedMaterial {
    fn from(phrase: String) -> Self {
        Self::Shared(Seed::from(phrase))
    }
}

impl From<Vec<u8>> for SeedMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Shared(Seed::from(bytes))
    }
}

impl From<HashMap<Blockchain, Seed>> for SeedMaterial {
    fn from(seeds: HashMap<Blockchain, Seed>) -> Self {
        Self::PerChain(seeds)
    }
}

/// Check whether a string is a valid BIP-39 mnemonic phrase.
#[must_use]
pub fn is_valid_seed_phrase(phrase: &str) -> bool {
    Mnemonic::parse_in(Language::English, phrase).is_ok()
}

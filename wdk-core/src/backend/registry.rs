//! Compile-time backend registry.
//!
//! Backends are not resolved by runtime module loading: the registry is a
//! closed mapping from `(Blockchain, Variant)` to a constructor, assembled
//! once when the embedder wires its chain crates in. A lookup miss is the
//! load failure of the design ([`crate::Error::BackendLoad`]); whatever the
//! constructor itself reports is an ordinary backend failure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{AbstractedBackend, BackendResult, WalletBackend};
use crate::chain::{Blockchain, Capability};
use crate::config::ChainConfig;
use crate::error::{Error, Result};
use crate::seed::Seed;

/// Standard versus account-abstracted backend for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The plain wallet backend.
    Standard,
    /// The paymaster-funded (gasless) backend.
    Abstracted,
}

impl Variant {
    /// Lowercase name used in errors and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Abstracted => "abstracted",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constructor for a standard wallet backend.
#[async_trait]
pub trait StandardFactory: Send + Sync {
    /// Build a backend instance from a secret and per-chain configuration.
    async fn build(&self, seed: &Seed, config: &ChainConfig)
    -> BackendResult<Arc<dyn WalletBackend>>;
}

/// Constructor for an account-abstraction wallet backend.
#[async_trait]
pub trait AbstractedFactory: Send + Sync {
    /// Build a backend instance from a secret and per-chain configuration.
    async fn build(
        &self,
        seed: &Seed,
        config: &ChainConfig,
    ) -> BackendResult<Arc<dyn AbstractedBackend>>;
}

/// Registry of backend constructors, keyed by blockchain and variant.
#[derive(Clone)]
pub struct BackendRegistry {
    standard: HashMap<Blockchain, Arc<dyn StandardFactory>>,
    abstracted: HashMap<Blockchain, Arc<dyn AbstractedFactory>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("standard", &self.standard.keys().collect::<Vec<_>>())
            .field("abstracted", &self.abstracted.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> BackendRegistryBuilder {
        BackendRegistryBuilder::default()
    }

    /// Look up the standard-backend constructor for a chain.
    pub fn standard(&self, blockchain: Blockchain) -> Result<&Arc<dyn StandardFactory>> {
        self.standard.get(&blockchain).ok_or(Error::BackendLoad {
            chain: blockchain,
            variant: Variant::Standard.as_str(),
        })
    }

    /// Look up the abstracted-backend constructor for a chain.
    pub fn abstracted(&self, blockchain: Blockchain) -> Result<&Arc<dyn AbstractedFactory>> {
        self.abstracted.get(&blockchain).ok_or(Error::BackendLoad {
            chain: blockchain,
            variant: Variant::Abstracted.as_str(),
        })
    }
}

/// Builder for [`BackendRegistry`].
#[derive(Default, Clone)]
pub struct BackendRegistryBuilder {
    standard: HashMap<Blockchain, Arc<dyn StandardFactory>>,
    abstracted: HashMap<Blockchain, Arc<dyn AbstractedFactory>>,
}

impl std::fmt::Debug for BackendRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistryBuilder")
            .finish_non_exhaustive()
    }
}

impl BackendRegistryBuilder {
    /// Register the standard backend constructor for a chain.
    #[must_use]
    pub fn standard(
        mut self,
        blockchain: Blockchain,
        factory: impl StandardFactory + 'static,
    ) -> Self {
        self.standard.insert(blockchain, Arc::new(factory));
        self
    }

    /// Register the abstracted backend constructor for a chain.
    ///
    /// Registration for a chain without the account-abstraction capability
    /// is rejected when the registry is finalized.
    #[must_use]
    pub fn abstracted(
        mut self,
        blockchain: Blockchain,
        factory: impl AbstractedFactory + 'static,
    ) -> Self {
        self.abstracted.insert(blockchain, Arc::new(factory));
        self
    }

    /// Finalize the registry.
    pub fn build(self) -> Result<BackendRegistry> {
        for chain in self.abstracted.keys() {
            if !chain.supports(Capability::AccountAbstraction) {
                return Err(Error::unsupported_capability(
                    *chain,
                    Capability::AccountAbstraction,
                ));
            }
        }

        Ok(BackendRegistry {
            standard: self.standard,
            abstracted: self.abstracted,
        })
    }
}

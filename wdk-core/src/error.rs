//! Unified error types for the wdk-core crate.
//!
//! Every failure the manager can produce falls into one of a small set of
//! kinds, so the RPC boundary can classify errors without inspecting
//! backend-specific types. Backend-internal failures are carried through
//! opaquely as [`BackendError`] and never reinterpreted here.

use crate::chain::{Blockchain, Capability};

/// Result type alias for wdk-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the wallet manager core.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The blockchain identifier is outside the supported closed set.
    #[error("unsupported blockchain: {chain}")]
    UnsupportedBlockchain {
        /// The identifier as received on the wire.
        chain: String,
    },

    /// The blockchain is known but lacks the requested capability.
    #[error("blockchain {chain} does not support {capability}")]
    UnsupportedCapability {
        /// The target blockchain.
        chain: Blockchain,
        /// The capability the operation requires.
        capability: Capability,
    },

    /// The operation is restricted to a specific blockchain and was invoked
    /// for another one.
    #[error("{operation} is only supported for the {required} blockchain, received: {chain}")]
    UnsupportedOperation {
        /// Name of the restricted operation.
        operation: &'static str,
        /// The only blockchain the operation accepts.
        required: Blockchain,
        /// The blockchain that was actually requested.
        chain: Blockchain,
    },

    /// A per-chain seed or configuration entry is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No backend factory is registered for the requested chain/variant pair.
    ///
    /// Distinct from [`Error::Backend`], which covers failures inside an
    /// already-loaded backend (including its constructor).
    #[error("no {variant} backend registered for blockchain {chain}")]
    BackendLoad {
        /// The target blockchain.
        chain: Blockchain,
        /// The requested variant ("standard" or "abstracted").
        variant: &'static str,
    },

    /// A backend call failed. Passed through unmodified.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The manager has been disposed; it is terminal and no further
    /// operation is possible.
    #[error("manager has been disposed")]
    Disposed,
}

impl Error {
    /// Create an [`Error::UnsupportedBlockchain`] from a wire identifier.
    #[must_use]
    pub fn unsupported_blockchain(chain: impl Into<String>) -> Self {
        Self::UnsupportedBlockchain {
            chain: chain.into(),
        }
    }

    /// Create an [`Error::UnsupportedCapability`].
    #[must_use]
    pub const fn unsupported_capability(chain: Blockchain, capability: Capability) -> Self {
        Self::UnsupportedCapability { chain, capability }
    }

    /// Create an [`Error::Configuration`] with a message.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Opaque error produced by a wallet backend.
///
/// Backends are external collaborators; the core does not interpret or retry
/// their failures, it only carries them to the RPC boundary.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    /// Human-readable description from the backend.
    pub message: String,
    /// The underlying cause, if the backend exposed one.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Create a backend error from a message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

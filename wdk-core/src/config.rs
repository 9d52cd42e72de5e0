//! Per-chain manager configuration.
//!
//! The manager receives one [`WdkConfig`] at construction — typically
//! deserialized from the JSON string carried by the `workletStart` request —
//! and holds it immutably until dispose releases it. The core only reads the
//! fields it needs (the paymaster token, transfer fee cap); everything else
//! is passed through to the backend untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chain::Blockchain;
use crate::error::{Error, Result};

/// The paymaster token used to fund gas under account abstraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymasterToken {
    /// Smart contract address of the token.
    pub address: String,
}

/// Configuration for a single blockchain backend.
///
/// Only the fields the core itself consults are typed; backend-specific
/// parameters (RPC endpoints, gas limits, network ids, …) are kept in
/// `extra` and forwarded verbatim to the backend constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Maximum fee amount for abstracted transfer operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_max_fee: Option<u128>,
    /// Paymaster token configuration for account abstraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_token: Option<PaymasterToken>,
    /// Backend-specific parameters, passed through unmodified.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Mapping from blockchain to its backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WdkConfig {
    chains: HashMap<Blockchain, ChainConfig>,
}

impl WdkConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid manager configuration: {e}")))
    }

    /// Add or replace the configuration for one blockchain.
    #[must_use]
    pub fn with_chain(mut self, blockchain: Blockchain, config: ChainConfig) -> Self {
        self.chains.insert(blockchain, config);
        self
    }

    /// The configuration for one blockchain, if present.
    #[must_use]
    pub fn chain(&self, blockchain: Blockchain) -> Option<&ChainConfig> {
        self.chains.get(&blockchain)
    }

    /// The configuration for one blockchain, or a configuration error.
    pub fn require_chain(&self, blockchain: Blockchain) -> Result<&ChainConfig> {
        self.chain(blockchain).ok_or_else(|| {
            Error::configuration(format!("no configuration for blockchain {blockchain}"))
        })
    }
}

/// Per-call override for abstracted transfer operations.
///
/// Overrides the `transfer_max_fee` and `paymaster_token` defined in the
/// manager configuration. Both abstracted entry points (`transfer` and
/// `sendTransaction`) validate the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    /// Maximum fee amount for this operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_max_fee: Option<u128>,
    /// Paymaster token override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_token: Option<PaymasterToken>,
}

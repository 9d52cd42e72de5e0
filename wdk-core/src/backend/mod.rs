//! Backend capability traits and the value types flowing through them.
//!
//! Per-blockchain wallet backends are external collaborators. The core
//! consumes them exclusively through the object-safe traits in this module:
//!
//! - [`WalletBackend`] / [`WalletAccount`] — the standard variant,
//! - [`MemoAccount`] — the optional Bitcoin memo/raw-hex surface, reached
//!   via [`WalletAccount::memo`] instead of reflective method probing,
//! - [`AbstractedBackend`] / [`AbstractedAccount`] — the account-abstraction
//!   variant (paymaster-funded execution).
//!
//! Every fallible call returns [`BackendError`]; the core never reinterprets
//! or retries a backend failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

mod registry;

pub use registry::{
    AbstractedFactory, BackendRegistry, BackendRegistryBuilder, StandardFactory, Variant,
};

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Current fee rates reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    /// Rate for normal-priority confirmation.
    pub normal: u128,
    /// Rate for fast confirmation.
    pub fast: u128,
}

/// Options for a standard send/quote operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Recipient address.
    pub to: String,
    /// Amount in the chain's base unit.
    pub value: u128,
    /// Memo to attach (Bitcoin memo operations only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Explicit fee rate override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate: Option<u128>,
    /// Target number of blocks for confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_target: Option<u32>,
}

/// Options for an abstracted token transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Smart contract address of the token to transfer.
    pub token: String,
    /// Recipient address.
    pub recipient: String,
    /// Amount in the token's base unit.
    pub amount: u128,
}

/// Fee quote for a transaction that has not been broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuote {
    /// Estimated fee in the chain's base unit.
    pub fee: u128,
}

/// Result of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Fee paid, in the chain's base unit.
    pub fee: u128,
    /// Transaction hash.
    pub hash: String,
}

/// Fee quote for an abstracted transfer, denominated in the paymaster token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferQuote {
    /// Estimated fee in the paymaster token's base unit.
    pub fee: u128,
}

/// Result of a broadcast abstracted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Fee paid in the paymaster token's base unit.
    pub fee: u128,
    /// Transaction hash.
    pub hash: String,
}

/// A standard wallet backend for one blockchain.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Derive the account at a BIP-44 index.
    ///
    /// Accounts are ephemeral: the core never caches them, each call may
    /// re-derive.
    async fn account(&self, index: u32) -> BackendResult<Box<dyn WalletAccount>>;

    /// Derive the account at a BIP-44 derivation path (e.g. `"0'/0/1"`).
    async fn account_by_path(&self, path: &str) -> BackendResult<Box<dyn WalletAccount>>;

    /// Current fee rates for this chain.
    async fn fee_rates(&self) -> BackendResult<FeeRates>;

    /// Tear down the backend, erasing its key material.
    async fn dispose(&self) -> BackendResult<()>;
}

/// One derived key/address pair on a standard backend.
#[async_trait]
pub trait WalletAccount: Send + Sync {
    /// The account's address.
    async fn address(&self) -> BackendResult<String>;

    /// Native token balance, in the chain's base unit.
    async fn balance(&self) -> BackendResult<u128>;

    /// Balance of a specific token, in the token's base unit.
    async fn token_balance(&self, token_address: &str) -> BackendResult<u128>;

    /// Quote the fee of a transaction without broadcasting it.
    async fn quote_send_transaction(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<TransactionQuote>;

    /// Sign and broadcast a transaction.
    async fn send_transaction(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<TransactionResult>;

    /// The memo/raw-hex surface, if this account implements it.
    ///
    /// Bitcoin accounts may return `Some`; everything else keeps the
    /// default `None` and callers fail fast before touching the chain.
    fn memo(&self) -> Option<&dyn MemoAccount> {
        None
    }
}

/// Memo and raw-hex operations (Bitcoin only).
#[async_trait]
pub trait MemoAccount: Send + Sync {
    /// Quote a transaction and return the raw transaction hex.
    async fn quote_send_transaction_tx(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<String>;

    /// Quote a transaction carrying a memo.
    async fn quote_send_transaction_with_memo(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<TransactionQuote>;

    /// Quote a transaction carrying a memo and return the raw hex.
    async fn quote_send_transaction_with_memo_tx(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<String>;

    /// Sign and broadcast a transaction carrying a memo.
    async fn send_transaction_with_memo(
        &self,
        options: &TransactionOptions,
    ) -> BackendResult<TransactionResult>;
}

/// An account-abstraction wallet backend for one blockchain.
#[async_trait]
pub trait AbstractedBackend: Send + Sync {
    /// Derive the abstracted account at a BIP-44 index.
    async fn account(&self, index: u32) -> BackendResult<Box<dyn AbstractedAccount>>;

    /// Derive the abstracted account at a BIP-44 derivation path.
    async fn account_by_path(&self, path: &str) -> BackendResult<Box<dyn AbstractedAccount>>;

    /// Tear down the backend, erasing its key material.
    async fn dispose(&self) -> BackendResult<()>;
}

/// One derived abstracted account.
#[async_trait]
pub trait AbstractedAccount: Send + Sync {
    /// The abstracted account's address.
    async fn address(&self) -> BackendResult<String>;

    /// Native token balance, in the chain's base unit.
    async fn balance(&self) -> BackendResult<u128>;

    /// Balance of a specific token, in the token's base unit.
    async fn token_balance(&self, token_address: &str) -> BackendResult<u128>;

    /// Transfer a token, paying gas via the paymaster.
    async fn transfer(
        &self,
        options: &TransferOptions,
        config: Option<&crate::config::TransferConfig>,
    ) -> BackendResult<TransferResult>;

    /// Execute a batch of transactions, paying gas via the paymaster.
    async fn send_transaction(
        &self,
        batch: &[TransactionOptions],
        config: Option<&crate::config::TransferConfig>,
    ) -> BackendResult<TransactionResult>;

    /// Quote the costs of a transfer operation.
    async fn quote_transfer(
        &self,
        options: &TransferOptions,
        config: Option<&crate::config::TransferConfig>,
    ) -> BackendResult<TransferQuote>;

    /// Fetch the receipt for a transaction.
    ///
    /// Returns `Ok(None)` while the transaction has not been included in a
    /// block yet — that is a sentinel, not an error.
    async fn transaction_receipt(&self, hash: &str) -> BackendResult<Option<serde_json::Value>>;
}

//! The wallet manager: backend factory cache, operation dispatch and
//! lifecycle.
//!
//! One [`WdkManager`] owns the seed material, the per-chain configuration
//! and every backend instance it has constructed. All of that state lives
//! behind a single async mutex: requests arrive serialized from one RPC
//! channel, and the lock is additionally held across backend construction so
//! that concurrent first access to the same `(blockchain, variant)` key can
//! never construct two instances (which would double-touch the secret).
//!
//! Backend calls themselves (balance queries, sends) run outside the lock on
//! a cloned handle, so a slow chain RPC does not block unrelated work.
//!
//! Dispose is terminal: it tears down every constructed backend, erases the
//! seed, and turns every later operation into [`Error::Disposed`]. Silently
//! reconstructing a backend after the seed is gone is never acceptable for a
//! component handling private keys.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::approve::{ApproveOptions, ApproveTransaction, encode_approve};
use crate::backend::{
    AbstractedAccount, AbstractedBackend, BackendRegistry, FeeRates, TransactionOptions,
    TransactionQuote, TransactionResult, TransferOptions, TransferQuote, TransferResult, Variant,
    WalletAccount, WalletBackend,
};
use crate::chain::{Blockchain, Capability};
use crate::config::{TransferConfig, WdkConfig};
use crate::error::{Error, Result};
use crate::seed::{SeedMaterial, is_valid_seed_phrase};

struct State {
    seed: Option<SeedMaterial>,
    config: Option<WdkConfig>,
    registry: BackendRegistry,
    standard: HashMap<Blockchain, Arc<dyn WalletBackend>>,
    abstracted: HashMap<Blockchain, Arc<dyn AbstractedBackend>>,
    disposed: bool,
}

/// Unified account/transaction interface over the per-chain wallet backends.
pub struct WdkManager {
    state: Mutex<State>,
}

impl std::fmt::Debug for WdkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WdkManager").finish_non_exhaustive()
    }
}

impl WdkManager {
    /// Create a new manager from seed material, per-chain configuration and
    /// a backend registry.
    ///
    /// No backend is constructed here; instances are materialized lazily on
    /// first use.
    pub fn new(
        seed: impl Into<SeedMaterial>,
        config: WdkConfig,
        registry: BackendRegistry,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                seed: Some(seed.into()),
                config: Some(config),
                registry,
                standard: HashMap::new(),
                abstracted: HashMap::new(),
                disposed: false,
            }),
        }
    }

    /// Check whether a string is a valid BIP-39 seed phrase.
    #[must_use]
    pub fn is_valid_seed_phrase(phrase: &str) -> bool {
        is_valid_seed_phrase(phrase)
    }

    // ========================================================================
    // Standard accounts
    // ========================================================================

    /// The wallet account for a blockchain and BIP-44 index.
    ///
    /// Accounts are re-derived on every call; the core caches backends, not
    /// accounts.
    pub async fn account(
        &self,
        blockchain: Blockchain,
        index: u32,
    ) -> Result<Box<dyn WalletAccount>> {
        let backend = self.standard_backend(blockchain).await?;
        Ok(backend.account(index).await?)
    }

    /// The wallet account for a blockchain and BIP-44 derivation path.
    pub async fn account_by_path(
        &self,
        blockchain: Blockchain,
        path: &str,
    ) -> Result<Box<dyn WalletAccount>> {
        let backend = self.standard_backend(blockchain).await?;
        Ok(backend.account_by_path(path).await?)
    }

    /// Current fee rates for a blockchain.
    pub async fn fee_rates(&self, blockchain: Blockchain) -> Result<FeeRates> {
        let backend = self.standard_backend(blockchain).await?;
        Ok(backend.fee_rates().await?)
    }

    /// The address of an account.
    pub async fn address(&self, blockchain: Blockchain, account_index: u32) -> Result<String> {
        let account = self.account(blockchain, account_index).await?;
        Ok(account.address().await?)
    }

    /// The native token balance of an account, in base units.
    pub async fn address_balance(
        &self,
        blockchain: Blockchain,
        account_index: u32,
    ) -> Result<u128> {
        let account = self.account(blockchain, account_index).await?;
        Ok(account.balance().await?)
    }

    /// Quote the fee of a transaction without broadcasting it.
    pub async fn quote_send_transaction(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<TransactionQuote> {
        let account = self.account(blockchain, account_index).await?;
        Ok(account.quote_send_transaction(options).await?)
    }

    /// Sign and broadcast a transaction.
    pub async fn send_transaction(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<TransactionResult> {
        let account = self.account(blockchain, account_index).await?;
        Ok(account.send_transaction(options).await?)
    }

    // ========================================================================
    // Bitcoin-only memo / raw-hex operations
    // ========================================================================

    /// Quote a transaction and return the raw transaction hex.
    ///
    /// Bitcoin only: any other chain fails with
    /// [`Error::UnsupportedOperation`]; a Bitcoin backend without the
    /// raw-hex surface fails with [`Error::UnsupportedCapability`].
    pub async fn quote_send_transaction_tx(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<String> {
        let account = self
            .bitcoin_account("quoteSendTransactionTX", blockchain, account_index)
            .await?;
        let memo = Self::memo_surface(&*account, blockchain, Capability::RawHexQuote)?;
        Ok(memo.quote_send_transaction_tx(options).await?)
    }

    /// Quote a transaction carrying a memo. Bitcoin only.
    pub async fn quote_send_transaction_with_memo(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<TransactionQuote> {
        let account = self
            .bitcoin_account("quoteSendTransactionWithMemo", blockchain, account_index)
            .await?;
        let memo = Self::memo_surface(&*account, blockchain, Capability::MemoTransfer)?;
        Ok(memo.quote_send_transaction_with_memo(options).await?)
    }

    /// Quote a transaction carrying a memo and return the raw hex. Bitcoin
    /// only.
    pub async fn quote_send_transaction_with_memo_tx(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<String> {
        let account = self
            .bitcoin_account("quoteSendTransactionWithMemoTX", blockchain, account_index)
            .await?;
        let memo = Self::memo_surface(&*account, blockchain, Capability::RawHexQuote)?;
        Ok(memo.quote_send_transaction_with_memo_tx(options).await?)
    }

    /// Sign and broadcast a transaction carrying a memo. Bitcoin only.
    pub async fn send_transaction_with_memo(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransactionOptions,
    ) -> Result<TransactionResult> {
        let account = self
            .bitcoin_account("sendTransactionWithMemo", blockchain, account_index)
            .await?;
        let memo = Self::memo_surface(&*account, blockchain, Capability::MemoTransfer)?;
        Ok(memo.send_transaction_with_memo(options).await?)
    }

    // ========================================================================
    // Abstracted accounts
    // ========================================================================

    /// The abstracted account for a blockchain and BIP-44 index.
    ///
    /// The blockchain must support account abstraction.
    pub async fn abstracted_account(
        &self,
        blockchain: Blockchain,
        index: u32,
    ) -> Result<Box<dyn AbstractedAccount>> {
        let backend = self.abstracted_backend(blockchain).await?;
        Ok(backend.account(index).await?)
    }

    /// The abstracted account for a blockchain and BIP-44 derivation path.
    pub async fn abstracted_account_by_path(
        &self,
        blockchain: Blockchain,
        path: &str,
    ) -> Result<Box<dyn AbstractedAccount>> {
        let backend = self.abstracted_backend(blockchain).await?;
        Ok(backend.account_by_path(path).await?)
    }

    /// The address of an abstracted account.
    pub async fn abstracted_address(
        &self,
        blockchain: Blockchain,
        account_index: u32,
    ) -> Result<String> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.address().await?)
    }

    /// The native token balance of an abstracted account, in base units.
    pub async fn abstracted_address_balance(
        &self,
        blockchain: Blockchain,
        account_index: u32,
    ) -> Result<u128> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.balance().await?)
    }

    /// The balance of an abstracted account for a specific token.
    pub async fn abstracted_address_token_balance(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        token_address: &str,
    ) -> Result<u128> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.token_balance(token_address).await?)
    }

    /// The paymaster token balance of an abstracted account.
    ///
    /// The paymaster token address comes from the chain's configuration.
    pub async fn abstracted_address_paymaster_token_balance(
        &self,
        blockchain: Blockchain,
        account_index: u32,
    ) -> Result<u128> {
        let paymaster_address = {
            let state = self.state.lock().await;
            if state.disposed {
                return Err(Error::Disposed);
            }
            let config = state.config.as_ref().ok_or(Error::Disposed)?;
            config
                .require_chain(blockchain)?
                .paymaster_token
                .as_ref()
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "no paymaster token configured for blockchain {blockchain}"
                    ))
                })?
                .address
                .clone()
        };

        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.token_balance(&paymaster_address).await?)
    }

    /// Transfer a token from an abstracted account, paying gas via the
    /// paymaster.
    pub async fn abstracted_account_transfer(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransferOptions,
        config: Option<&TransferConfig>,
    ) -> Result<TransferResult> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.transfer(options, config).await?)
    }

    /// Execute a batch of transactions from an abstracted account.
    pub async fn abstracted_send_transaction(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        batch: &[TransactionOptions],
        config: Option<&TransferConfig>,
    ) -> Result<TransactionResult> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.send_transaction(batch, config).await?)
    }

    /// Quote the costs of an abstracted transfer.
    pub async fn abstracted_account_quote_transfer(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        options: &TransferOptions,
        config: Option<&TransferConfig>,
    ) -> Result<TransferQuote> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.quote_transfer(options, config).await?)
    }

    /// Fetch the receipt of an abstracted transaction.
    ///
    /// `Ok(None)` means the transaction has not been included in a block
    /// yet.
    pub async fn transaction_receipt(
        &self,
        blockchain: Blockchain,
        account_index: u32,
        hash: &str,
    ) -> Result<Option<serde_json::Value>> {
        let account = self.abstracted_account(blockchain, account_index).await?;
        Ok(account.transaction_receipt(hash).await?)
    }

    // ========================================================================
    // Stateless operations
    // ========================================================================

    /// Build an unsigned ERC-20 approval transaction.
    ///
    /// No backend or account is constructed; the manager is only consulted
    /// for liveness.
    pub async fn approve_transaction(
        &self,
        options: &ApproveOptions,
    ) -> Result<ApproveTransaction> {
        let state = self.state.lock().await;
        if state.disposed {
            return Err(Error::Disposed);
        }
        encode_approve(options)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Dispose the manager: tear down every constructed backend and erase
    /// the seed material.
    ///
    /// Idempotent — a second call finds empty caches and does nothing. One
    /// backend failing to tear down does not prevent the others from being
    /// attempted, and the caches are cleared regardless so nothing leaks.
    /// After this call the manager is terminal.
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        if state.disposed {
            return;
        }

        let standard = std::mem::take(&mut state.standard);
        let abstracted = std::mem::take(&mut state.abstracted);

        for (chain, backend) in standard {
            if let Err(e) = backend.dispose().await {
                warn!(chain = %chain, error = %e, "standard backend teardown failed");
            }
        }
        for (chain, backend) in abstracted {
            if let Err(e) = backend.dispose().await {
                warn!(chain = %chain, error = %e, "abstracted backend teardown failed");
            }
        }

        // Dropping the material zeroizes every contained secret.
        state.seed = None;
        state.config = None;
        state.disposed = true;

        debug!("manager disposed");
    }

    // ========================================================================
    // Backend factory
    // ========================================================================

    async fn standard_backend(&self, blockchain: Blockchain) -> Result<Arc<dyn WalletBackend>> {
        let mut state = self.state.lock().await;
        if state.disposed {
            return Err(Error::Disposed);
        }

        if let Some(backend) = state.standard.get(&blockchain) {
            return Ok(Arc::clone(backend));
        }

        let factory = Arc::clone(state.registry.standard(blockchain)?);
        let backend = {
            let seed = state
                .seed
                .as_ref()
                .ok_or(Error::Disposed)?
                .resolve(blockchain)?;
            let config = state
                .config
                .as_ref()
                .ok_or(Error::Disposed)?
                .require_chain(blockchain)?;
            factory.build(seed, config).await?
        };

        debug!(chain = %blockchain, variant = %Variant::Standard, "backend constructed");
        state.standard.insert(blockchain, Arc::clone(&backend));
        Ok(backend)
    }

    async fn abstracted_backend(
        &self,
        blockchain: Blockchain,
    ) -> Result<Arc<dyn AbstractedBackend>> {
        if !blockchain.supports(Capability::AccountAbstraction) {
            return Err(Error::unsupported_capability(
                blockchain,
                Capability::AccountAbstraction,
            ));
        }

        let mut state = self.state.lock().await;
        if state.disposed {
            return Err(Error::Disposed);
        }

        if let Some(backend) = state.abstracted.get(&blockchain) {
            return Ok(Arc::clone(backend));
        }

        let factory = Arc::clone(state.registry.abstracted(blockchain)?);
        let backend = {
            let seed = state
                .seed
                .as_ref()
                .ok_or(Error::Disposed)?
                .resolve(blockchain)?;
            let config = state
                .config
                .as_ref()
                .ok_or(Error::Disposed)?
                .require_chain(blockchain)?;
            factory.build(seed, config).await?
        };

        debug!(chain = %blockchain, variant = %Variant::Abstracted, "backend constructed");
        state.abstracted.insert(blockchain, Arc::clone(&backend));
        Ok(backend)
    }

    // ========================================================================
    // Guards
    // ========================================================================

    async fn bitcoin_account(
        &self,
        operation: &'static str,
        blockchain: Blockchain,
        account_index: u32,
    ) -> Result<Box<dyn WalletAccount>> {
        if blockchain != Blockchain::Bitcoin {
            return Err(Error::UnsupportedOperation {
                operation,
                required: Blockchain::Bitcoin,
                chain: blockchain,
            });
        }
        self.account(blockchain, account_index).await
    }

    fn memo_surface<'a>(
        account: &'a dyn WalletAccount,
        blockchain: Blockchain,
        capability: Capability,
    ) -> Result<&'a dyn crate::backend::MemoAccount> {
        account
            .memo()
            .ok_or_else(|| Error::unsupported_capability(blockchain, capability))
    }
}

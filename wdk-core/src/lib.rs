//! Unified account/transaction interface over multiple blockchain wallet
//! backends.
//!
//! The crate does not implement any blockchain: per-chain backends (EVM,
//! TON, TRON, Bitcoin, Solana, each optionally with an account-abstraction
//! variant) are external collaborators plugged in behind the
//! [`backend`] capability traits. What lives here is the dispatch and
//! lifecycle core:
//!
//! - a static [capability table](chain::Blockchain::supports) consulted
//!   before any capability-specific operation is forwarded,
//! - [seed resolution](seed::SeedMaterial) from a shared secret or a
//!   per-chain seed map, zeroized on drop,
//! - a lazy, memoizing [backend factory](manager::WdkManager) with a
//!   single-construction guarantee,
//! - the unified operation vocabulary (addresses, balances, quotes, sends,
//!   transfers, receipts, approvals),
//! - idempotent, terminal [`dispose`](manager::WdkManager::dispose).
//!
//! # Examples
//!
//! ```rust,ignore
//! use wdk_core::{Blockchain, BackendRegistry, WdkConfig, WdkManager};
//!
//! let registry = BackendRegistry::builder()
//!     .standard(Blockchain::Bitcoin, BtcFactory::new())
//!     .build()?;
//! let config = WdkConfig::from_json(r#"{ "bitcoin": { "network": "mainnet" } }"#)?;
//!
//! let wdk = WdkManager::new("abandon abandon ... about", config, registry);
//! let address = wdk.address(Blockchain::Bitcoin, 0).await?;
//!
//! wdk.dispose().await; // erases key material; the manager is now terminal
//! ```

pub mod approve;
pub mod backend;
pub mod chain;
pub mod config;
pub mod error;
pub mod manager;
pub mod seed;

pub use approve::{ApproveOptions, ApproveTransaction};
pub use backend::{BackendRegistry, Variant};
pub use chain::{Blockchain, Capability};
pub use config::{ChainConfig, PaymasterToken, TransferConfig, WdkConfig};
pub use error::{BackendError, Error, Result};
pub use manager::WdkManager;
pub use seed::{Seed, SeedMaterial, is_valid_seed_phrase};

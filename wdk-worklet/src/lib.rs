//! RPC adapter over [`wdk_core`].
//!
//! Exposes the wallet manager as a line-oriented JSON service: each request
//! frame names a method and carries a camelCase payload with all amounts as
//! decimal strings, and each response echoes the request id with either a
//! `result` or a structured `error`. One request is handled at a time, in
//! arrival order.
//!
//! Hosts embed the adapter by registering their chain backends and handing
//! the service a transport:
//!
//! ```no_run
//! use wdk_core::BackendRegistry;
//! use wdk_worklet::{WorkletService, serve};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BackendRegistry::builder().build()?;
//! let service = WorkletService::new(registry);
//! serve(service, tokio::io::stdin(), tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logger;
pub mod proto;
pub mod serve;
pub mod service;

pub use error::{ErrorCode, ErrorPayload, Result, WorkletError, stringify_error};
pub use logger::{ChannelLogger, LogLevel, TracingLogger, WorkletLogger};
pub use serve::{serve, serve_with_logs};
pub use service::WorkletService;

//! Stdio entry point.
//!
//! Serves frames over stdin/stdout. Log output goes to stderr so it never
//! interleaves with response frames; set `RUST_LOG` to adjust verbosity.
//!
//! The registry starts empty here: chain backends live in their own crates
//! and embedders register them before serving. Every chain-bound request
//! against the bare binary answers `BACKEND_LOAD`.

use tracing_subscriber::EnvFilter;

use wdk_core::BackendRegistry;
use wdk_worklet::{Result, WorkletService, serve};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = BackendRegistry::builder()
        .build()
        .unwrap_or_else(|_| unreachable!("empty registry cannot fail validation"));

    let service = WorkletService::new(registry);
    serve(service, tokio::io::stdin(), tokio::io::stdout()).await
}

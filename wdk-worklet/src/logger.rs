//! Log forwarding.
//!
//! The service emits operational logs through an explicit [`WorkletLogger`]
//! handle rather than writing to the transport's output stream, which is
//! reserved for response frames. The default sink routes into `tracing`;
//! embedders that want to ship logs elsewhere provide their own sink.

use std::fmt;
use std::sync::mpsc;

use tracing::{debug, error, info};

/// Severity of a forwarded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine operational events.
    Info,
    /// Failures worth surfacing to the host.
    Error,
    /// Per-request detail, emitted only when debug logging is enabled.
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Debug => "debug",
        };
        f.write_str(label)
    }
}

/// Destination for service logs.
pub trait WorkletLogger: Send + Sync {
    /// Emit one log line.
    fn log(&self, level: LogLevel, message: &str);
}

/// Default sink: forwards into the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl WorkletLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "wdk_worklet", "{message}"),
            LogLevel::Error => error!(target: "wdk_worklet", "{message}"),
            LogLevel::Debug => debug!(target: "wdk_worklet", "{message}"),
        }
    }
}

/// Sink that hands log lines to a channel, for hosts that collect them.
#[derive(Debug, Clone)]
pub struct ChannelLogger {
    sender: mpsc::Sender<(LogLevel, String)>,
}

impl ChannelLogger {
    /// Create a logger and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<(LogLevel, String)>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl WorkletLogger for ChannelLogger {
    fn log(&self, level: LogLevel, message: &str) {
        // The host may have dropped the receiver; logging must never fail.
        let _ = self.sender.send((level, message.to_owned()));
    }
}

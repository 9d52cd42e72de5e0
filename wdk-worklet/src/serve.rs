//! Newline-delimited JSON transport.
//!
//! Frames come in one per line and are answered in order: the loop reads a
//! line, dispatches it, writes the response, then reads the next. Requests
//! are strictly serialized, so callers never observe interleaved handling.

use std::sync::mpsc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::{ErrorPayload, Result, WorkletError};
use crate::logger::LogLevel;
use crate::proto::{LogFrame, RequestFrame, ResponseFrame};
use crate::service::WorkletService;

/// Run the frame loop until the input stream closes.
///
/// Malformed lines are answered with a `BAD_REQUEST` frame when a
/// correlation id can be recovered, and dropped with a warning otherwise.
pub async fn serve<R, W>(service: WorkletService, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    run(service, reader, writer, None).await
}

/// Like [`serve`], but also ships service logs to the host as outbound
/// `log` frames.
///
/// Pair the receiver with a [`crate::logger::ChannelLogger`] installed on
/// the service. Pending log lines are flushed after each handled request;
/// log frames carry no id and expect no reply.
pub async fn serve_with_logs<R, W>(
    service: WorkletService,
    reader: R,
    writer: W,
    logs: mpsc::Receiver<(LogLevel, String)>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    run(service, reader, writer, Some(logs)).await
}

async fn run<R, W>(
    mut service: WorkletService,
    reader: R,
    mut writer: W,
    mut logs: Option<mpsc::Receiver<(LogLevel, String)>>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame = match decode_frame(line) {
            Ok(frame) => frame,
            Err(Some(response)) => {
                write_json(&mut writer, &response).await?;
                continue;
            }
            Err(None) => {
                warn!("dropping frame with no recoverable id");
                continue;
            }
        };

        debug!(id = frame.id, method = frame.request.method(), "request");
        let id = frame.id;
        match service.handle(frame.request).await {
            Some(Ok(result)) => write_json(&mut writer, &ResponseFrame::ok(id, result)).await?,
            Some(Err(payload)) => {
                write_json(&mut writer, &ResponseFrame::err(id, payload)).await?;
            }
            // Fire-and-forget: no frame.
            None => {}
        }

        if let Some(ref mut logs) = logs {
            flush_logs(&mut writer, logs).await?;
        }
    }

    // Drain anything logged since the last request before shutting down.
    if let Some(ref mut logs) = logs {
        flush_logs(&mut writer, logs).await?;
    }

    debug!("input closed, frame loop done");
    Ok(())
}

async fn flush_logs<W>(writer: &mut W, logs: &mut mpsc::Receiver<(LogLevel, String)>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Ok((level, message)) = logs.try_recv() {
        write_json(writer, &LogFrame::new(level, message)).await?;
    }
    Ok(())
}

/// Decode one line into a request frame.
///
/// On failure, returns a `BAD_REQUEST` response frame if the line was valid
/// JSON carrying a numeric `id`, and `None` when not even the id survives.
fn decode_frame(line: &str) -> std::result::Result<RequestFrame, Option<ResponseFrame>> {
    match serde_json::from_str::<RequestFrame>(line) {
        Ok(frame) => Ok(frame),
        Err(err) => {
            let id = serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|value| value.get("id").and_then(serde_json::Value::as_u64));
            Err(id.map(|id| {
                ResponseFrame::err(
                    id,
                    ErrorPayload::bad_request(format!("malformed request: {err}")),
                )
            }))
        }
    }
}

async fn write_json<W, T>(writer: &mut W, frame: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let mut rendered = serde_json::to_vec(frame).map_err(WorkletError::from)?;
    rendered.push(b'\n');
    writer.write_all(&rendered).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use wdk_core::backend::{
        BackendResult, FeeRates, StandardFactory, TransactionOptions, TransactionQuote,
        TransactionResult, WalletAccount, WalletBackend,
    };
    use wdk_core::{BackendRegistry, Blockchain, ChainConfig, Seed};

    struct FixedFactory;

    #[async_trait]
    impl StandardFactory for FixedFactory {
        async fn build(
            &self,
            _seed: &Seed,
            _config: &ChainConfig,
        ) -> BackendResult<Arc<dyn WalletBackend>> {
            Ok(Arc::new(FixedBackend))
        }
    }

    struct FixedBackend;

    #[async_trait]
    impl WalletBackend for FixedBackend {
        async fn account(&self, index: u32) -> BackendResult<Box<dyn WalletAccount>> {
            Ok(Box::new(FixedAccount { index }))
        }

        async fn account_by_path(&self, _path: &str) -> BackendResult<Box<dyn WalletAccount>> {
            Ok(Box::new(FixedAccount { index: 0 }))
        }

        async fn fee_rates(&self) -> BackendResult<FeeRates> {
            Ok(FeeRates { normal: 1, fast: 2 })
        }

        async fn dispose(&self) -> BackendResult<()> {
            Ok(())
        }
    }

    struct FixedAccount {
        index: u32,
    }

    #[async_trait]
    impl WalletAccount for FixedAccount {
        async fn address(&self) -> BackendResult<String> {
            Ok(format!("bc1q-{}", self.index))
        }

        async fn balance(&self) -> BackendResult<u128> {
            Ok(9)
        }

        async fn token_balance(&self, _token_address: &str) -> BackendResult<u128> {
            Ok(0)
        }

        async fn quote_send_transaction(
            &self,
            _options: &TransactionOptions,
        ) -> BackendResult<TransactionQuote> {
            Ok(TransactionQuote { fee: 1 })
        }

        async fn send_transaction(
            &self,
            _options: &TransactionOptions,
        ) -> BackendResult<TransactionResult> {
            Ok(TransactionResult {
                fee: 1,
                hash: "0x1".to_owned(),
            })
        }
    }

    fn service() -> WorkletService {
        let registry = BackendRegistry::builder()
            .standard(Blockchain::Bitcoin, FixedFactory)
            .build()
            .unwrap();
        WorkletService::new(registry)
    }

    async fn run_session(input: &str) -> Vec<serde_json::Value> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let loop_task = tokio::spawn(serve(service(), server_read, server_write));

        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        loop_task.await.unwrap().unwrap();

        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn start_line(id: u64) -> String {
        serde_json::json!({
            "id": id,
            "method": "workletStart",
            "payload": {
                "seedPhrase": "any phrase",
                "config": r#"{ "bitcoin": {} }"#
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_end_to_end_session() {
        let mut input = start_line(1);
        input.push('\n');
        input.push_str(
            &serde_json::json!({
                "id": 2,
                "method": "getAddress",
                "payload": { "network": "bitcoin", "accountIndex": 4 }
            })
            .to_string(),
        );
        input.push('\n');

        let frames = run_session(&input).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["id"], 1);
        assert_eq!(frames[0]["result"]["status"], "started");
        assert_eq!(frames[1]["id"], 2);
        assert_eq!(frames[1]["result"]["address"], "bc1q-4");
    }

    #[tokio::test]
    async fn test_addresses_are_deterministic_until_dispose() {
        let mut input = start_line(1);
        for id in 2..4 {
            input.push('\n');
            input.push_str(
                &serde_json::json!({
                    "id": id,
                    "method": "getAddress",
                    "payload": { "network": "bitcoin", "accountIndex": 0 }
                })
                .to_string(),
            );
        }
        input.push('\n');
        input.push_str(&serde_json::json!({ "id": 4, "method": "dispose" }).to_string());
        input.push('\n');
        input.push_str(
            &serde_json::json!({
                "id": 5,
                "method": "getAddress",
                "payload": { "network": "bitcoin", "accountIndex": 0 }
            })
            .to_string(),
        );
        input.push('\n');

        let frames = run_session(&input).await;
        // Four response frames: dispose never answers.
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1]["result"]["address"], frames[2]["result"]["address"]);
        assert_eq!(frames[3]["id"], 5);
        assert_eq!(frames[3]["error"]["code"], "WDK_MANAGER_INIT");
    }

    #[tokio::test]
    async fn test_malformed_line_with_id_answers_bad_request() {
        let frames = run_session("{\"id\": 9, \"method\": \"noSuchMethod\"}\n").await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["id"], 9);
        assert_eq!(frames[0]["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_garbage_line_is_dropped() {
        let mut input = "this is not json\n".to_owned();
        input.push_str(&start_line(1));
        input.push('\n');

        let frames = run_session(&input).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_log_frames_forwarded() {
        use crate::logger::ChannelLogger;

        let (logger, receiver) = ChannelLogger::new();
        let service = service().with_logger(logger);

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let loop_task = tokio::spawn(serve_with_logs(service, server_read, server_write, receiver));

        let mut input = start_line(1);
        input.push('\n');
        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        loop_task.await.unwrap().unwrap();

        let frames: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["result"]["status"], "started");
        assert_eq!(frames[1]["method"], "log");
        assert_eq!(frames[1]["payload"]["level"], "info");
        assert_eq!(frames[1]["payload"]["message"], "manager started");
    }

    #[tokio::test]
    async fn test_pending_logs_drained_at_shutdown() {
        use crate::logger::{ChannelLogger, LogLevel, WorkletLogger};

        let (logger, receiver) = ChannelLogger::new();
        let side_channel = logger.clone();
        let service = service().with_logger(logger);

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let loop_task = tokio::spawn(serve_with_logs(service, server_read, server_write, receiver));

        side_channel.log(LogLevel::Info, "shutting down");
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        loop_task.await.unwrap().unwrap();

        let frames: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["method"], "log");
        assert_eq!(frames[0]["payload"]["message"], "shutting down");
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let mut input = "\n\n".to_owned();
        input.push_str(&start_line(1));
        input.push('\n');

        let frames = run_session(&input).await;
        assert_eq!(frames.len(), 1);
    }
}

//! Request dispatch.
//!
//! [`WorkletService`] owns the manager lifecycle and translates between the
//! wire vocabulary and the core API: decimal strings become `u128` on the
//! way in, numeric results become decimal strings on the way out, and every
//! failure is folded into an [`ErrorPayload`].

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wdk_core::backend::{TransactionOptions, TransferOptions};
use wdk_core::{
    ApproveOptions, BackendRegistry, Blockchain, PaymasterToken, SeedMaterial, TransferConfig,
    WdkConfig, WdkManager,
};

use crate::error::{ErrorCode, ErrorPayload, stringify_error};
use crate::logger::{LogLevel, TracingLogger, WorkletLogger};
use crate::proto::{
    AbstractedSendRequest, AccountRequest, AddressResponse, ApproveRequest, ApproveResponse,
    BalanceResponse, FeeResponse, ReceiptRequest, ReceiptResponse, Request, SendRequest,
    SendResponse, StatusResponse, TokenBalanceRequest, TransferRequest, TxHexResponse,
    WireTransactionOptions, WireTransferConfig, WireTransferOptions, WorkletStartRequest,
};

/// Outcome of one dispatched request.
pub type HandlerResult = Result<serde_json::Value, ErrorPayload>;

/// The RPC-facing service: one manager at a time, rebuilt on each
/// `workletStart`.
pub struct WorkletService {
    manager: Option<WdkManager>,
    registry: BackendRegistry,
    logger: Arc<dyn WorkletLogger>,
    debug: bool,
}

impl std::fmt::Debug for WorkletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkletService")
            .field("started", &self.manager.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl WorkletService {
    /// Create a service over the given backend registry.
    #[must_use]
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            manager: None,
            registry,
            logger: Arc::new(TracingLogger),
            debug: false,
        }
    }

    /// Replace the log sink.
    #[must_use]
    pub fn with_logger(mut self, logger: impl WorkletLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Whether `workletStart` has produced a live manager.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.manager.is_some()
    }

    /// Dispatch one request.
    ///
    /// Returns `None` for fire-and-forget requests (`dispose`), which get no
    /// response frame.
    pub async fn handle(&mut self, request: Request) -> Option<HandlerResult> {
        if self.debug {
            self.logger
                .log(LogLevel::Debug, &format!("handling {}", request.method()));
        }
        let method = request.method();
        let outcome = self.dispatch(request).await?;
        if let Err(ref payload) = outcome {
            self.logger.log(
                LogLevel::Error,
                &format!("{method} failed: {}", payload.error),
            );
        }
        Some(outcome)
    }

    async fn dispatch(&mut self, request: Request) -> Option<HandlerResult> {
        let outcome = match request {
            Request::WorkletStart(payload) => self.worklet_start(payload).await,
            Request::GetAddress(payload) => self.get_address(payload).await,
            Request::GetAddressBalance(payload) => self.get_address_balance(payload).await,
            Request::QuoteSendTransaction(payload) => self.quote_send_transaction(payload).await,
            Request::QuoteSendTransactionTx(payload) => {
                self.quote_send_transaction_tx(payload).await
            }
            Request::QuoteSendTransactionWithMemo(payload) => {
                self.quote_send_transaction_with_memo(payload).await
            }
            Request::QuoteSendTransactionWithMemoTx(payload) => {
                self.quote_send_transaction_with_memo_tx(payload).await
            }
            Request::SendTransaction(payload) => self.send_transaction(payload).await,
            Request::SendTransactionWithMemo(payload) => {
                self.send_transaction_with_memo(payload).await
            }
            Request::GetAbstractedAddress(payload) => self.get_abstracted_address(payload).await,
            Request::GetAbstractedAddressBalance(payload) => {
                self.get_abstracted_address_balance(payload).await
            }
            Request::GetAbstractedAddressTokenBalance(payload) => {
                self.get_abstracted_address_token_balance(payload).await
            }
            Request::GetAbstractedAddressPaymasterTokenBalance(payload) => {
                self.get_abstracted_paymaster_token_balance(payload).await
            }
            Request::AbstractedAccountTransfer(payload) => {
                self.abstracted_account_transfer(payload).await
            }
            Request::AbstractedSendTransaction(payload) => {
                self.abstracted_send_transaction(payload).await
            }
            Request::AbstractedAccountQuoteTransfer(payload) => {
                self.abstracted_account_quote_transfer(payload).await
            }
            Request::GetTransactionReceipt(payload) => self.get_transaction_receipt(payload).await,
            Request::GetApproveTransaction(payload) => self.get_approve_transaction(payload).await,
            Request::Dispose => {
                self.dispose().await;
                return None;
            }
        };
        Some(outcome)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    async fn worklet_start(&mut self, payload: WorkletStartRequest) -> HandlerResult {
        // A restart replaces the previous manager; tear the old one down
        // first so its backends release their resources.
        if let Some(manager) = self.manager.take() {
            info!("restarting: disposing previous manager");
            manager.dispose().await;
        }

        self.debug = payload.enable_debug_logs.unwrap_or(0) != 0;

        let seed: SeedMaterial = match (payload.seed_phrase, payload.seed_buffer) {
            (Some(phrase), _) => SeedMaterial::from(phrase),
            (None, Some(bytes)) => SeedMaterial::from(bytes),
            (None, None) => {
                return Err(ErrorPayload::new(
                    ErrorCode::WdkManagerInit,
                    "no seed provided: expected seedPhrase or seedBuffer",
                ));
            }
        };

        let config = WdkConfig::from_json(&payload.config).map_err(|err| {
            ErrorPayload::new(ErrorCode::WdkManagerInit, stringify_error(&err))
        })?;

        self.manager = Some(WdkManager::new(seed, config, self.registry.clone()));
        self.logger.log(LogLevel::Info, "manager started");
        to_result(&StatusResponse { status: "started" })
    }

    async fn dispose(&mut self) {
        match self.manager.take() {
            Some(manager) => {
                manager.dispose().await;
                self.logger.log(LogLevel::Info, "manager disposed");
            }
            None => warn!("dispose requested but no manager is live"),
        }
    }

    fn manager(&self) -> Result<&WdkManager, ErrorPayload> {
        self.manager.as_ref().ok_or_else(|| {
            ErrorPayload::new(
                ErrorCode::WdkManagerInit,
                "manager not initialized: call workletStart first",
            )
        })
    }

    // ========================================================================
    // Standard operations
    // ========================================================================

    async fn get_address(&self, payload: AccountRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let address = self
            .manager()?
            .address(chain, payload.account_index)
            .await?;
        to_result(&AddressResponse { address })
    }

    async fn get_address_balance(&self, payload: AccountRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let balance = self
            .manager()?
            .address_balance(chain, payload.account_index)
            .await?;
        to_result(&BalanceResponse {
            balance: balance.to_string(),
        })
    }

    async fn quote_send_transaction(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let quote = self
            .manager()?
            .quote_send_transaction(chain, payload.account_index, &options)
            .await?;
        to_result(&FeeResponse {
            fee: quote.fee.to_string(),
        })
    }

    async fn quote_send_transaction_tx(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let tx_hex = self
            .manager()?
            .quote_send_transaction_tx(chain, payload.account_index, &options)
            .await?;
        to_result(&TxHexResponse { tx_hex })
    }

    async fn quote_send_transaction_with_memo(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let quote = self
            .manager()?
            .quote_send_transaction_with_memo(chain, payload.account_index, &options)
            .await?;
        to_result(&FeeResponse {
            fee: quote.fee.to_string(),
        })
    }

    async fn quote_send_transaction_with_memo_tx(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let tx_hex = self
            .manager()?
            .quote_send_transaction_with_memo_tx(chain, payload.account_index, &options)
            .await?;
        to_result(&TxHexResponse { tx_hex })
    }

    async fn send_transaction(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let result = self
            .manager()?
            .send_transaction(chain, payload.account_index, &options)
            .await?;
        to_result(&SendResponse {
            fee: result.fee.to_string(),
            hash: result.hash,
        })
    }

    async fn send_transaction_with_memo(&self, payload: SendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transaction_options(payload.options)?;
        let result = self
            .manager()?
            .send_transaction_with_memo(chain, payload.account_index, &options)
            .await?;
        to_result(&SendResponse {
            fee: result.fee.to_string(),
            hash: result.hash,
        })
    }

    // ========================================================================
    // Abstracted operations
    // ========================================================================

    async fn get_abstracted_address(&self, payload: AccountRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let address = self
            .manager()?
            .abstracted_address(chain, payload.account_index)
            .await?;
        to_result(&AddressResponse { address })
    }

    async fn get_abstracted_address_balance(&self, payload: AccountRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let balance = self
            .manager()?
            .abstracted_address_balance(chain, payload.account_index)
            .await?;
        to_result(&BalanceResponse {
            balance: balance.to_string(),
        })
    }

    async fn get_abstracted_address_token_balance(
        &self,
        payload: TokenBalanceRequest,
    ) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let balance = self
            .manager()?
            .abstracted_address_token_balance(chain, payload.account_index, &payload.token_address)
            .await?;
        to_result(&BalanceResponse {
            balance: balance.to_string(),
        })
    }

    async fn get_abstracted_paymaster_token_balance(
        &self,
        payload: AccountRequest,
    ) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let balance = self
            .manager()?
            .abstracted_address_paymaster_token_balance(chain, payload.account_index)
            .await?;
        to_result(&BalanceResponse {
            balance: balance.to_string(),
        })
    }

    async fn abstracted_account_transfer(&self, payload: TransferRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transfer_options(payload.options)?;
        let config = payload.config.map(decode_transfer_config).transpose()?;
        let result = self
            .manager()?
            .abstracted_account_transfer(chain, payload.account_index, &options, config.as_ref())
            .await?;
        to_result(&SendResponse {
            fee: result.fee.to_string(),
            hash: result.hash,
        })
    }

    async fn abstracted_send_transaction(&self, payload: AbstractedSendRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let batch = decode_transaction_batch(&payload.options)?;
        let config = payload.config.map(decode_transfer_config).transpose()?;
        let result = self
            .manager()?
            .abstracted_send_transaction(chain, payload.account_index, &batch, config.as_ref())
            .await?;
        to_result(&SendResponse {
            fee: result.fee.to_string(),
            hash: result.hash,
        })
    }

    async fn abstracted_account_quote_transfer(&self, payload: TransferRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let options = decode_transfer_options(payload.options)?;
        let config = payload.config.map(decode_transfer_config).transpose()?;
        let quote = self
            .manager()?
            .abstracted_account_quote_transfer(
                chain,
                payload.account_index,
                &options,
                config.as_ref(),
            )
            .await?;
        to_result(&FeeResponse {
            fee: quote.fee.to_string(),
        })
    }

    async fn get_transaction_receipt(&self, payload: ReceiptRequest) -> HandlerResult {
        let chain = parse_network(&payload.network)?;
        let receipt = self
            .manager()?
            .transaction_receipt(chain, payload.account_index, &payload.hash)
            .await?;
        let receipt = match receipt {
            Some(value) => Some(serde_json::to_string(&value).map_err(internal)?),
            None => None,
        };
        to_result(&ReceiptResponse { receipt })
    }

    // ========================================================================
    // Stateless helpers
    // ========================================================================

    async fn get_approve_transaction(&self, payload: ApproveRequest) -> HandlerResult {
        let options = ApproveOptions {
            token: payload.token,
            recipient: payload.recipient,
            amount: parse_amount("amount", &payload.amount)?,
        };
        let tx = self.manager()?.approve_transaction(&options).await?;
        to_result(&ApproveResponse {
            to: tx.to,
            value: tx.value.to_string(),
            data: tx.data,
        })
    }
}

// ============================================================================
// Wire conversions
// ============================================================================

fn parse_network(network: &str) -> Result<Blockchain, ErrorPayload> {
    Blockchain::from_str(network).map_err(ErrorPayload::from)
}

fn parse_amount(field: &str, raw: &str) -> Result<u128, ErrorPayload> {
    raw.trim().parse::<u128>().map_err(|_| {
        ErrorPayload::bad_request(format!("invalid {field}: expected a decimal string"))
    })
}

fn decode_transaction_options(
    wire: WireTransactionOptions,
) -> Result<TransactionOptions, ErrorPayload> {
    Ok(TransactionOptions {
        to: wire.to,
        value: parse_amount("value", &wire.value)?,
        memo: wire.memo,
        fee_rate: wire
            .fee_rate
            .as_deref()
            .map(|raw| parse_amount("feeRate", raw))
            .transpose()?,
        confirmation_target: wire.confirmation_target,
    })
}

fn decode_transfer_options(
    wire: WireTransferOptions,
) -> Result<TransferOptions, ErrorPayload> {
    Ok(TransferOptions {
        token: wire.token,
        recipient: wire.recipient,
        amount: parse_amount("amount", &wire.amount)?,
    })
}

fn decode_transfer_config(
    wire: WireTransferConfig,
) -> Result<TransferConfig, ErrorPayload> {
    Ok(TransferConfig {
        transfer_max_fee: wire
            .transfer_max_fee
            .as_deref()
            .map(|raw| parse_amount("transferMaxFee", raw))
            .transpose()?,
        paymaster_token: wire
            .paymaster_token
            .map(|token| PaymasterToken { address: token.address }),
    })
}

/// One transaction of an embedded batch. Hosts are loose about `value` here,
/// sending either a decimal string or a JSON number.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBatchTransaction {
    to: String,
    value: WireAmount,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    fee_rate: Option<WireAmount>,
    #[serde(default)]
    confirmation_target: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireAmount {
    Text(String),
    Number(u64),
}

impl WireAmount {
    fn parse(&self, field: &str) -> Result<u128, ErrorPayload> {
        match self {
            Self::Text(raw) => parse_amount(field, raw),
            Self::Number(n) => Ok(u128::from(*n)),
        }
    }
}

fn decode_transaction_batch(
    raw: &str,
) -> Result<Vec<TransactionOptions>, ErrorPayload> {
    let wire: Vec<WireBatchTransaction> = serde_json::from_str(raw).map_err(|err| {
        ErrorPayload::bad_request(format!("invalid options: expected a JSON transaction array: {err}"))
    })?;
    wire.into_iter()
        .map(|tx| {
            Ok(TransactionOptions {
                value: tx.value.parse("value")?,
                to: tx.to,
                memo: tx.memo,
                fee_rate: tx
                    .fee_rate
                    .as_ref()
                    .map(|raw| raw.parse("feeRate"))
                    .transpose()?,
                confirmation_target: tx.confirmation_target,
            })
        })
        .collect()
}

fn to_result<T: Serialize>(response: &T) -> HandlerResult {
    serde_json::to_value(response).map_err(internal)
}

fn internal(err: serde_json::Error) -> ErrorPayload {
    ErrorPayload::new(ErrorCode::Unknown, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use wdk_core::backend::{
        AbstractedAccount, AbstractedBackend, AbstractedFactory, BackendResult, FeeRates,
        StandardFactory, TransactionQuote, TransactionResult, TransferQuote, TransferResult,
        WalletAccount, WalletBackend,
    };
    use wdk_core::{BackendError, ChainConfig, Seed};

    struct EchoFactory;

    #[async_trait]
    impl StandardFactory for EchoFactory {
        async fn build(
            &self,
            _seed: &Seed,
            _config: &ChainConfig,
        ) -> BackendResult<Arc<dyn WalletBackend>> {
            Ok(Arc::new(EchoBackend))
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl WalletBackend for EchoBackend {
        async fn account(&self, index: u32) -> BackendResult<Box<dyn WalletAccount>> {
            Ok(Box::new(EchoAccount { index }))
        }

        async fn account_by_path(&self, _path: &str) -> BackendResult<Box<dyn WalletAccount>> {
            Ok(Box::new(EchoAccount { index: 0 }))
        }

        async fn fee_rates(&self) -> BackendResult<FeeRates> {
            Ok(FeeRates { normal: 1, fast: 2 })
        }

        async fn dispose(&self) -> BackendResult<()> {
            Ok(())
        }
    }

    struct EchoAccount {
        index: u32,
    }

    #[async_trait]
    impl WalletAccount for EchoAccount {
        async fn address(&self) -> BackendResult<String> {
            Ok(format!("addr-{}", self.index))
        }

        async fn balance(&self) -> BackendResult<u128> {
            Ok(1_000_000)
        }

        async fn token_balance(&self, _token_address: &str) -> BackendResult<u128> {
            Ok(5)
        }

        async fn quote_send_transaction(
            &self,
            options: &TransactionOptions,
        ) -> BackendResult<TransactionQuote> {
            Ok(TransactionQuote {
                fee: options.value / 100,
            })
        }

        async fn send_transaction(
            &self,
            options: &TransactionOptions,
        ) -> BackendResult<TransactionResult> {
            Ok(TransactionResult {
                fee: options.value / 100,
                hash: "0xstd".to_owned(),
            })
        }
    }

    struct EchoAbstractedFactory;

    #[async_trait]
    impl AbstractedFactory for EchoAbstractedFactory {
        async fn build(
            &self,
            _seed: &Seed,
            _config: &ChainConfig,
        ) -> BackendResult<Arc<dyn AbstractedBackend>> {
            Ok(Arc::new(EchoAbstractedBackend))
        }
    }

    struct EchoAbstractedBackend;

    #[async_trait]
    impl AbstractedBackend for EchoAbstractedBackend {
        async fn account(&self, index: u32) -> BackendResult<Box<dyn AbstractedAccount>> {
            Ok(Box::new(EchoAbstractedAccount { index }))
        }

        async fn account_by_path(&self, _path: &str) -> BackendResult<Box<dyn AbstractedAccount>> {
            Ok(Box::new(EchoAbstractedAccount { index: 0 }))
        }

        async fn dispose(&self) -> BackendResult<()> {
            Ok(())
        }
    }

    struct EchoAbstractedAccount {
        index: u32,
    }

    #[async_trait]
    impl AbstractedAccount for EchoAbstractedAccount {
        async fn address(&self) -> BackendResult<String> {
            Ok(format!("aa-{}", self.index))
        }

        async fn balance(&self) -> BackendResult<u128> {
            Ok(42)
        }

        async fn token_balance(&self, _token_address: &str) -> BackendResult<u128> {
            Ok(7)
        }

        async fn transfer(
            &self,
            options: &TransferOptions,
            config: Option<&TransferConfig>,
        ) -> BackendResult<TransferResult> {
            if let Some(max) = config.and_then(|c| c.transfer_max_fee)
                && options.amount / 100 > max
            {
                return Err(BackendError::msg("fee exceeds transferMaxFee"));
            }
            Ok(TransferResult {
                fee: options.amount / 100,
                hash: "0xaa".to_owned(),
            })
        }

        async fn send_transaction(
            &self,
            batch: &[TransactionOptions],
            _config: Option<&TransferConfig>,
        ) -> BackendResult<TransactionResult> {
            Ok(TransactionResult {
                fee: batch.iter().map(|tx| tx.value).sum::<u128>() / 100,
                hash: "0xbatch".to_owned(),
            })
        }

        async fn quote_transfer(
            &self,
            options: &TransferOptions,
            _config: Option<&TransferConfig>,
        ) -> BackendResult<TransferQuote> {
            Ok(TransferQuote {
                fee: options.amount / 100,
            })
        }

        async fn transaction_receipt(
            &self,
            hash: &str,
        ) -> BackendResult<Option<serde_json::Value>> {
            if hash == "0xpending" {
                return Ok(None);
            }
            Ok(Some(serde_json::json!({ "status": 1, "hash": hash })))
        }
    }

    fn registry() -> BackendRegistry {
        BackendRegistry::builder()
            .standard(Blockchain::Bitcoin, EchoFactory)
            .standard(Blockchain::Ethereum, EchoFactory)
            .abstracted(Blockchain::Ethereum, EchoAbstractedFactory)
            .build()
            .unwrap()
    }

    fn config_json() -> String {
        serde_json::json!({
            "bitcoin": {},
            "ethereum": { "paymasterToken": { "address": "0xToken" } }
        })
        .to_string()
    }

    async fn started_service() -> WorkletService {
        let mut service = WorkletService::new(registry());
        let outcome = service
            .handle(Request::WorkletStart(WorkletStartRequest {
                enable_debug_logs: None,
                seed_phrase: Some("test phrase".to_owned()),
                seed_buffer: None,
                config: config_json(),
            }))
            .await
            .unwrap();
        assert!(outcome.is_ok());
        service
    }

    fn request(json: serde_json::Value) -> Request {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_requires_start() {
        let mut service = WorkletService::new(registry());
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "getAddress",
                "payload": { "network": "bitcoin", "accountIndex": 0 }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::WdkManagerInit);
    }

    #[tokio::test]
    async fn test_start_then_address() {
        let mut service = started_service().await;
        let value = service
            .handle(request(serde_json::json!({
                "method": "getAddress",
                "payload": { "network": "bitcoin", "accountIndex": 3 }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["address"], "addr-3");
    }

    #[tokio::test]
    async fn test_balances_are_strings() {
        let mut service = started_service().await;
        let value = service
            .handle(request(serde_json::json!({
                "method": "getAddressBalance",
                "payload": { "network": "bitcoin", "accountIndex": 0 }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["balance"], "1000000");
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "getAddress",
                "payload": { "network": "dogecoin", "accountIndex": 0 }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::UnsupportedBlockchain);
    }

    #[tokio::test]
    async fn test_bad_amount_is_bad_request() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "quoteSendTransaction",
                "payload": {
                    "network": "bitcoin",
                    "accountIndex": 0,
                    "options": { "to": "bc1q", "value": "not-a-number" }
                }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::BadRequest);
    }

    #[tokio::test]
    async fn test_quote_and_send() {
        let mut service = started_service().await;
        let quote = service
            .handle(request(serde_json::json!({
                "method": "quoteSendTransaction",
                "payload": {
                    "network": "bitcoin",
                    "accountIndex": 0,
                    "options": { "to": "bc1q", "value": "5000" }
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quote["fee"], "50");

        let sent = service
            .handle(request(serde_json::json!({
                "method": "sendTransaction",
                "payload": {
                    "network": "bitcoin",
                    "accountIndex": 0,
                    "options": { "to": "bc1q", "value": "5000" }
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent["fee"], "50");
        assert_eq!(sent["hash"], "0xstd");
    }

    #[tokio::test]
    async fn test_memo_ops_rejected_off_bitcoin() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "quoteSendTransactionWithMemo",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 0,
                    "options": { "to": "0xdead", "value": "1", "memo": "hi" }
                }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::UnsupportedOperation);
    }

    #[tokio::test]
    async fn test_abstracted_transfer_and_quote() {
        let mut service = started_service().await;
        let quote = service
            .handle(request(serde_json::json!({
                "method": "abstractedAccountQuoteTransfer",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 1,
                    "options": { "token": "0xToken", "recipient": "0xdead", "amount": "200" }
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quote["fee"], "2");

        let sent = service
            .handle(request(serde_json::json!({
                "method": "abstractedAccountTransfer",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 1,
                    "options": { "token": "0xToken", "recipient": "0xdead", "amount": "200" },
                    "config": { "transferMaxFee": "10" }
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent["hash"], "0xaa");
    }

    #[tokio::test]
    async fn test_transfer_max_fee_enforced_by_backend() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "abstractedAccountTransfer",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 1,
                    "options": { "token": "0xToken", "recipient": "0xdead", "amount": "5000" },
                    "config": { "transferMaxFee": "10" }
                }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::BackendCall);
    }

    #[tokio::test]
    async fn test_abstracted_send_embedded_batch() {
        let mut service = started_service().await;
        let batch = serde_json::json!([
            { "to": "0xa", "value": "100" },
            { "to": "0xb", "value": 300 }
        ])
        .to_string();
        let sent = service
            .handle(request(serde_json::json!({
                "method": "abstractedSendTransaction",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 0,
                    "options": batch
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent["fee"], "4");
        assert_eq!(sent["hash"], "0xbatch");
    }

    #[tokio::test]
    async fn test_abstracted_send_rejects_malformed_batch() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({
                "method": "abstractedSendTransaction",
                "payload": {
                    "network": "ethereum",
                    "accountIndex": 0,
                    "options": "not json"
                }
            })))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::BadRequest);
    }

    #[tokio::test]
    async fn test_paymaster_token_balance() {
        let mut service = started_service().await;
        let value = service
            .handle(request(serde_json::json!({
                "method": "getAbstractedAddressPaymasterTokenBalance",
                "payload": { "network": "ethereum", "accountIndex": 0 }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["balance"], "7");
    }

    #[tokio::test]
    async fn test_receipt_stringified_and_pending() {
        let mut service = started_service().await;
        let value = service
            .handle(request(serde_json::json!({
                "method": "getTransactionReceipt",
                "payload": { "network": "ethereum", "accountIndex": 0, "hash": "0xdone" }
            })))
            .await
            .unwrap()
            .unwrap();
        let receipt: serde_json::Value =
            serde_json::from_str(value["receipt"].as_str().unwrap()).unwrap();
        assert_eq!(receipt["status"], 1);

        let pending = service
            .handle(request(serde_json::json!({
                "method": "getTransactionReceipt",
                "payload": { "network": "ethereum", "accountIndex": 0, "hash": "0xpending" }
            })))
            .await
            .unwrap()
            .unwrap();
        assert!(pending.get("receipt").is_none());
    }

    #[tokio::test]
    async fn test_approve_transaction_shape() {
        let mut service = started_service().await;
        let value = service
            .handle(request(serde_json::json!({
                "method": "getApproveTransaction",
                "payload": {
                    "token": "0x00000000000000000000000000000000000000aa",
                    "recipient": "0x00000000000000000000000000000000000000bb",
                    "amount": "100"
                }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["value"], "0");
        assert!(value["data"].as_str().unwrap().starts_with("0x095ea7b3"));
    }

    #[tokio::test]
    async fn test_dispose_is_fire_and_forget_and_terminal() {
        let mut service = started_service().await;
        let outcome = service
            .handle(request(serde_json::json!({ "method": "dispose" })))
            .await;
        assert!(outcome.is_none());

        let after = service
            .handle(request(serde_json::json!({
                "method": "getAddress",
                "payload": { "network": "bitcoin", "accountIndex": 0 }
            })))
            .await
            .unwrap();
        assert_eq!(after.unwrap_err().code, ErrorCode::WdkManagerInit);
    }

    #[tokio::test]
    async fn test_restart_replaces_manager() {
        let mut service = started_service().await;
        let outcome = service
            .handle(Request::WorkletStart(WorkletStartRequest {
                enable_debug_logs: Some(1),
                seed_phrase: None,
                seed_buffer: Some(vec![7; 32]),
                config: config_json(),
            }))
            .await
            .unwrap();
        assert!(outcome.is_ok());
        assert!(service.is_started());
    }

    #[tokio::test]
    async fn test_start_without_seed() {
        let mut service = WorkletService::new(registry());
        let outcome = service
            .handle(Request::WorkletStart(WorkletStartRequest {
                enable_debug_logs: None,
                seed_phrase: None,
                seed_buffer: None,
                config: config_json(),
            }))
            .await
            .unwrap();
        assert_eq!(outcome.unwrap_err().code, ErrorCode::WdkManagerInit);
    }
}

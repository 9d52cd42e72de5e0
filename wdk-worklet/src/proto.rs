//! Wire request/response shapes.
//!
//! Field names and types mirror the worklet schema: camelCase keys, every
//! numeric quantity (amounts, balances, fees, values) carried as a decimal
//! string. The adapter converts to the core's numeric form on the way in
//! and back to strings on the way out; the core itself never sees wire
//! strings.

use serde::{Deserialize, Serialize};

use crate::error::ErrorPayload;

/// One request frame read from the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestFrame {
    /// Correlation id echoed in the response frame.
    pub id: u64,
    /// The decoded request.
    #[serde(flatten)]
    pub request: Request,
}

/// One response frame written to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFrame {
    /// Correlation id of the request this answers.
    pub id: u64,
    /// Success payload, present iff the request succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Structured error, present iff the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl ResponseFrame {
    /// Build a success frame.
    #[must_use]
    pub fn ok(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build a failure frame.
    #[must_use]
    pub fn err(id: u64, error: ErrorPayload) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Outbound log frame. Fire-and-forget: carries no id, expects no reply.
#[derive(Debug, Clone, Serialize)]
pub struct LogFrame {
    /// Always `"log"`.
    pub method: &'static str,
    /// The log line.
    pub payload: LogPayload,
}

/// Payload of a [`LogFrame`].
#[derive(Debug, Clone, Serialize)]
pub struct LogPayload {
    /// Severity (`"info"`, `"error"`, `"debug"`).
    pub level: String,
    /// The log message.
    pub message: String,
}

impl LogFrame {
    /// Build a log frame.
    #[must_use]
    pub fn new(level: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self {
            method: "log",
            payload: LogPayload {
                level: level.to_string(),
                message: message.into(),
            },
        }
    }
}

/// The decoded operation vocabulary.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", content = "payload")]
pub enum Request {
    /// (Re)construct the manager from a seed and configuration.
    #[serde(rename = "workletStart")]
    WorkletStart(WorkletStartRequest),
    /// Address of an account.
    #[serde(rename = "getAddress")]
    GetAddress(AccountRequest),
    /// Native balance of an account.
    #[serde(rename = "getAddressBalance")]
    GetAddressBalance(AccountRequest),
    /// Fee quote for a standard transaction.
    #[serde(rename = "quoteSendTransaction")]
    QuoteSendTransaction(SendRequest),
    /// Raw transaction hex quote (Bitcoin).
    #[serde(rename = "quoteSendTransactionTX")]
    QuoteSendTransactionTx(SendRequest),
    /// Fee quote for a memo transaction (Bitcoin).
    #[serde(rename = "quoteSendTransactionWithMemo")]
    QuoteSendTransactionWithMemo(SendRequest),
    /// Raw hex quote for a memo transaction (Bitcoin).
    #[serde(rename = "quoteSendTransactionWithMemoTX")]
    QuoteSendTransactionWithMemoTx(SendRequest),
    /// Sign and broadcast a standard transaction.
    #[serde(rename = "sendTransaction")]
    SendTransaction(SendRequest),
    /// Sign and broadcast a memo transaction (Bitcoin).
    #[serde(rename = "sendTransactionWithMemo")]
    SendTransactionWithMemo(SendRequest),
    /// Address of an abstracted account.
    #[serde(rename = "getAbstractedAddress")]
    GetAbstractedAddress(AccountRequest),
    /// Native balance of an abstracted account.
    #[serde(rename = "getAbstractedAddressBalance")]
    GetAbstractedAddressBalance(AccountRequest),
    /// Token balance of an abstracted account.
    #[serde(rename = "getAbstractedAddressTokenBalance")]
    GetAbstractedAddressTokenBalance(TokenBalanceRequest),
    /// Paymaster token balance of an abstracted account.
    #[serde(rename = "getAbstractedAddressPaymasterTokenBalance")]
    GetAbstractedAddressPaymasterTokenBalance(AccountRequest),
    /// Abstracted token transfer.
    #[serde(rename = "abstractedAccountTransfer")]
    AbstractedAccountTransfer(TransferRequest),
    /// Abstracted transaction batch; options arrive as an embedded JSON
    /// string.
    #[serde(rename = "abstractedSendTransaction")]
    AbstractedSendTransaction(AbstractedSendRequest),
    /// Fee quote for an abstracted transfer.
    #[serde(rename = "abstractedAccountQuoteTransfer")]
    AbstractedAccountQuoteTransfer(TransferRequest),
    /// Receipt lookup for an abstracted transaction.
    #[serde(rename = "getTransactionReceipt")]
    GetTransactionReceipt(ReceiptRequest),
    /// Stateless ERC-20 approval builder.
    #[serde(rename = "getApproveTransaction")]
    GetApproveTransaction(ApproveRequest),
    /// Tear down the manager. Fire-and-forget: no response frame.
    #[serde(rename = "dispose")]
    Dispose,
}

impl Request {
    /// The wire method name, for logging.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::WorkletStart(_) => "workletStart",
            Self::GetAddress(_) => "getAddress",
            Self::GetAddressBalance(_) => "getAddressBalance",
            Self::QuoteSendTransaction(_) => "quoteSendTransaction",
            Self::QuoteSendTransactionTx(_) => "quoteSendTransactionTX",
            Self::QuoteSendTransactionWithMemo(_) => "quoteSendTransactionWithMemo",
            Self::QuoteSendTransactionWithMemoTx(_) => "quoteSendTransactionWithMemoTX",
            Self::SendTransaction(_) => "sendTransaction",
            Self::SendTransactionWithMemo(_) => "sendTransactionWithMemo",
            Self::GetAbstractedAddress(_) => "getAbstractedAddress",
            Self::GetAbstractedAddressBalance(_) => "getAbstractedAddressBalance",
            Self::GetAbstractedAddressTokenBalance(_) => "getAbstractedAddressTokenBalance",
            Self::GetAbstractedAddressPaymasterTokenBalance(_) => {
                "getAbstractedAddressPaymasterTokenBalance"
            }
            Self::AbstractedAccountTransfer(_) => "abstractedAccountTransfer",
            Self::AbstractedSendTransaction(_) => "abstractedSendTransaction",
            Self::AbstractedAccountQuoteTransfer(_) => "abstractedAccountQuoteTransfer",
            Self::GetTransactionReceipt(_) => "getTransactionReceipt",
            Self::GetApproveTransaction(_) => "getApproveTransaction",
            Self::Dispose => "dispose",
        }
    }
}

/// `workletStart` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkletStartRequest {
    /// Forward debug-level logs when nonzero.
    #[serde(default)]
    pub enable_debug_logs: Option<u32>,
    /// BIP-39 seed phrase shared by all chains.
    #[serde(default)]
    pub seed_phrase: Option<String>,
    /// Raw seed bytes shared by all chains.
    #[serde(default)]
    pub seed_buffer: Option<Vec<u8>>,
    /// JSON-encoded per-chain configuration.
    pub config: String,
}

/// Payload addressing one account on one chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
}

/// Standard transaction options as they appear on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransactionOptions {
    /// Recipient address.
    pub to: String,
    /// Amount in base units, as a decimal string.
    pub value: String,
    /// Memo (memo operations only).
    #[serde(default)]
    pub memo: Option<String>,
    /// Fee rate override, as a decimal string.
    #[serde(default)]
    pub fee_rate: Option<String>,
    /// Confirmation target in blocks.
    #[serde(default)]
    pub confirmation_target: Option<u32>,
}

/// Payload for quote/send operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
    /// Transaction options.
    pub options: WireTransactionOptions,
}

/// Payload for token balance lookups.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
    /// Token contract address.
    pub token_address: String,
}

/// Transfer options as they appear on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransferOptions {
    /// Token contract address.
    pub token: String,
    /// Recipient address.
    pub recipient: String,
    /// Amount in base units, as a decimal string.
    pub amount: String,
}

/// Per-call transfer configuration as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransferConfig {
    /// Maximum fee, as a decimal string.
    #[serde(default)]
    pub transfer_max_fee: Option<String>,
    /// Paymaster token override.
    #[serde(default)]
    pub paymaster_token: Option<WirePaymasterToken>,
}

/// Paymaster token reference on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePaymasterToken {
    /// Token contract address.
    pub address: String,
}

/// Payload for abstracted transfers and transfer quotes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
    /// Transfer options.
    pub options: WireTransferOptions,
    /// Per-call configuration override.
    #[serde(default)]
    pub config: Option<WireTransferConfig>,
}

/// Payload for abstracted transaction batches.
///
/// `options` is a JSON-encoded string (an array of transactions) decoded by
/// the adapter before dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractedSendRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
    /// JSON-encoded transaction array.
    pub options: String,
    /// Per-call configuration override, validated against the same shape as
    /// transfers.
    #[serde(default)]
    pub config: Option<WireTransferConfig>,
}

/// Payload for receipt lookups.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    /// Blockchain identifier.
    pub network: String,
    /// BIP-44 account index.
    pub account_index: u32,
    /// Transaction hash.
    pub hash: String,
}

/// Payload for the approval builder.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveRequest {
    /// Token contract to approve on.
    pub token: String,
    /// Spender being approved.
    pub recipient: String,
    /// Allowance amount in base units, as a decimal string.
    pub amount: String,
}

// ============================================================================
// Response payloads
// ============================================================================

/// `workletStart` response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Always `"started"` on success.
    pub status: &'static str,
}

/// Address responses.
#[derive(Debug, Clone, Serialize)]
pub struct AddressResponse {
    /// The account's address.
    pub address: String,
}

/// Balance responses; the amount is a decimal string.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    /// Balance in base units.
    pub balance: String,
}

/// Fee-only quote responses.
#[derive(Debug, Clone, Serialize)]
pub struct FeeResponse {
    /// Fee in base units.
    pub fee: String,
}

/// Raw-hex quote responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHexResponse {
    /// Raw transaction hex.
    pub tx_hex: String,
}

/// Broadcast responses.
#[derive(Debug, Clone, Serialize)]
pub struct SendResponse {
    /// Fee in base units.
    pub fee: String,
    /// Transaction hash.
    pub hash: String,
}

/// Receipt responses. `receipt` is absent while the transaction is pending.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResponse {
    /// JSON-encoded receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// Approval builder responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApproveResponse {
    /// Token contract address.
    pub to: String,
    /// Attached native value, as a decimal string (always `"0"`).
    pub value: String,
    /// Hex-encoded calldata.
    pub data: String,
}

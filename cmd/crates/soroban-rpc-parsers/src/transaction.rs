use std::fmt::Display;

use serde_aux::prelude::{deserialize_default_from_null, deserialize_number_from_string};
use stellar_xdr::curr::{
    self as xdr, DiagnosticEvent, ScVal, SorobanTransactionMeta, TransactionEnvelope,
    TransactionMeta, TransactionMetaV3, TransactionResult,
};

use crate::{from_xdr, from_xdr_list, Error};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    NotFound,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::NotFound => "NOT_FOUND",
        })
    }
}

/// The transaction fields shared by `getTransaction` and each entry of `getTransactions`.
///
/// The status lives next to these fields on the wire but is owned by the enclosing response.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct TransactionInfoRaw {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ledger: u32,
    #[serde(
        rename = "createdAt",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub created_at: i64,
    #[serde(rename = "applicationOrder")]
    pub application_order: u32,
    #[serde(rename = "feeBump")]
    pub fee_bump: bool,
    #[serde(rename = "envelopeXdr")]
    pub envelope_xdr: String,
    #[serde(rename = "resultXdr")]
    pub result_xdr: String,
    #[serde(rename = "resultMetaXdr")]
    pub result_meta_xdr: String,
    #[serde(
        rename = "diagnosticEventsXdr",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub diagnostic_events_xdr: Option<Vec<String>>,
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none", default)]
    pub tx_hash: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub ledger: u32,
    pub created_at: i64,
    pub application_order: u32,
    pub fee_bump: bool,
    pub envelope: TransactionEnvelope,
    pub result: TransactionResult,
    pub result_meta: TransactionMeta,
    /// Set only for `TransactionMeta::V3` carrying soroban meta.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_value: Option<ScVal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub diagnostic_events: Option<Vec<DiagnosticEvent>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_hash: Option<String>,
}

impl TransactionInfo {
    /// Diagnostic events reported alongside the transaction, falling back to the events
    /// recorded in its soroban meta.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        if let Some(events) = &self.diagnostic_events {
            return events.clone();
        }
        match &self.result_meta {
            TransactionMeta::V3(TransactionMetaV3 {
                soroban_meta: Some(meta),
                ..
            }) => {
                if meta.diagnostic_events.is_empty() {
                    meta.events
                        .iter()
                        .map(|e| DiagnosticEvent {
                            in_successful_contract_call: true,
                            event: e.clone(),
                        })
                        .collect()
                } else {
                    meta.diagnostic_events.to_vec()
                }
            }
            _ => Vec::new(),
        }
    }
}

impl TryFrom<TransactionInfoRaw> for TransactionInfo {
    type Error = xdr::Error;

    fn try_from(raw: TransactionInfoRaw) -> Result<Self, Self::Error> {
        tracing::trace!(ledger = raw.ledger, "parsing transaction info");
        // The meta is decoded first: it alone decides whether there is a return value.
        let result_meta: TransactionMeta = from_xdr(&raw.result_meta_xdr)?;
        let return_value = match &result_meta {
            TransactionMeta::V3(TransactionMetaV3 {
                soroban_meta: Some(SorobanTransactionMeta { return_value, .. }),
                ..
            }) => Some(return_value.clone()),
            _ => None,
        };
        Ok(TransactionInfo {
            ledger: raw.ledger,
            created_at: raw.created_at,
            application_order: raw.application_order,
            fee_bump: raw.fee_bump,
            envelope: from_xdr(&raw.envelope_xdr)?,
            result: from_xdr(&raw.result_xdr)?,
            result_meta,
            return_value,
            diagnostic_events: raw
                .diagnostic_events_xdr
                .as_deref()
                .map(from_xdr_list)
                .transpose()?,
            tx_hash: raw.tx_hash,
        })
    }
}

/// Decodes the XDR fields of a single transaction record.
///
/// # Errors
/// Any XDR payload that fails to decode.
pub fn parse_transaction_info(raw: TransactionInfoRaw) -> Result<TransactionInfo, xdr::Error> {
    raw.try_into()
}

/// A `getTransaction` response as sent on the wire.
///
/// The transaction fields sit next to the status. For any status other than `NOT_FOUND` they are
/// read strictly, so a malformed field is reported as a JSON error instead of being dropped.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(try_from = "GetTransactionResponseWire")]
pub struct GetTransactionResponseRaw {
    pub status: TransactionStatus,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: u32,
    #[serde(rename = "latestLedgerCloseTime")]
    pub latest_ledger_close_time: i64,
    #[serde(rename = "oldestLedger")]
    pub oldest_ledger: u32,
    #[serde(rename = "oldestLedgerCloseTime")]
    pub oldest_ledger_close_time: i64,
    /// Absent when the transaction is `NOT_FOUND`.
    #[serde(flatten)]
    pub transaction: Option<TransactionInfoRaw>,
}

#[derive(serde::Deserialize)]
struct GetTransactionResponseWire {
    status: TransactionStatus,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    latest_ledger: u32,
    #[serde(
        rename = "latestLedgerCloseTime",
        deserialize_with = "deserialize_number_from_string"
    )]
    latest_ledger_close_time: i64,
    #[serde(
        rename = "oldestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    oldest_ledger: u32,
    #[serde(
        rename = "oldestLedgerCloseTime",
        deserialize_with = "deserialize_number_from_string"
    )]
    oldest_ledger_close_time: i64,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<GetTransactionResponseWire> for GetTransactionResponseRaw {
    type Error = serde_json::Error;

    fn try_from(wire: GetTransactionResponseWire) -> Result<Self, Self::Error> {
        let transaction = if wire.status == TransactionStatus::NotFound || wire.rest.is_empty() {
            None
        } else {
            Some(serde_json::from_value(serde_json::Value::Object(wire.rest))?)
        };
        Ok(GetTransactionResponseRaw {
            status: wire.status,
            latest_ledger: wire.latest_ledger,
            latest_ledger_close_time: wire.latest_ledger_close_time,
            oldest_ledger: wire.oldest_ledger,
            oldest_ledger_close_time: wire.oldest_ledger_close_time,
            transaction,
        })
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    pub latest_ledger: u32,
    pub latest_ledger_close_time: i64,
    pub oldest_ledger: u32,
    pub oldest_ledger_close_time: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction: Option<TransactionInfo>,
}

impl GetTransactionResponse {
    #[must_use]
    pub fn return_value(&self) -> Option<&ScVal> {
        self.transaction.as_ref()?.return_value.as_ref()
    }

    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.transaction
            .as_ref()
            .map(TransactionInfo::events)
            .unwrap_or_default()
    }
}

impl TryFrom<GetTransactionResponseRaw> for GetTransactionResponse {
    type Error = Error;

    fn try_from(raw: GetTransactionResponseRaw) -> Result<Self, Self::Error> {
        tracing::trace!(status = %raw.status, "parsing getTransaction response");
        let transaction = match (raw.status, raw.transaction) {
            (TransactionStatus::NotFound, _) => None,
            (_, Some(info)) => Some(TransactionInfo::try_from(info)?),
            (status, None) => return Err(Error::MissingTransactionInfo { status }),
        };
        Ok(GetTransactionResponse {
            status: raw.status,
            latest_ledger: raw.latest_ledger,
            latest_ledger_close_time: raw.latest_ledger_close_time,
            oldest_ledger: raw.oldest_ledger,
            oldest_ledger_close_time: raw.oldest_ledger_close_time,
            transaction,
        })
    }
}

/// Parses a `getTransaction` response, decoding the transaction unless it was not found.
///
/// # Errors
/// Any XDR payload that fails to decode, or a found transaction without its XDR fields.
pub fn parse_raw_transaction(
    raw: GetTransactionResponseRaw,
) -> Result<GetTransactionResponse, Error> {
    raw.try_into()
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct TransactionWithStatusRaw {
    pub status: TransactionStatus,
    #[serde(flatten)]
    pub info: TransactionInfoRaw,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithStatus {
    pub status: TransactionStatus,
    #[serde(flatten)]
    pub info: TransactionInfo,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct GetTransactionsResponseRaw {
    #[serde(deserialize_with = "deserialize_default_from_null")]
    pub transactions: Vec<TransactionWithStatusRaw>,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger: u32,
    #[serde(
        rename = "latestLedgerCloseTimestamp",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger_close_timestamp: i64,
    #[serde(
        rename = "oldestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub oldest_ledger: u32,
    #[serde(
        rename = "oldestLedgerCloseTimestamp",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub oldest_ledger_close_timestamp: i64,
    pub cursor: String,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsResponse {
    pub transactions: Vec<TransactionWithStatus>,
    pub latest_ledger: u32,
    pub latest_ledger_close_timestamp: i64,
    pub oldest_ledger: u32,
    pub oldest_ledger_close_timestamp: i64,
    pub cursor: String,
}

impl TryFrom<GetTransactionsResponseRaw> for GetTransactionsResponse {
    type Error = xdr::Error;

    fn try_from(raw: GetTransactionsResponseRaw) -> Result<Self, Self::Error> {
        tracing::trace!(count = raw.transactions.len(), "parsing getTransactions response");
        Ok(GetTransactionsResponse {
            transactions: raw
                .transactions
                .into_iter()
                .map(|TransactionWithStatusRaw { status, info }| {
                    Ok(TransactionWithStatus {
                        status,
                        info: info.try_into()?,
                    })
                })
                .collect::<Result<Vec<_>, xdr::Error>>()?,
            latest_ledger: raw.latest_ledger,
            latest_ledger_close_timestamp: raw.latest_ledger_close_timestamp,
            oldest_ledger: raw.oldest_ledger,
            oldest_ledger_close_timestamp: raw.oldest_ledger_close_timestamp,
            cursor: raw.cursor,
        })
    }
}

/// Parses a page of `getTransactions`, pairing each decoded transaction with its status.
///
/// # Errors
/// Any XDR payload that fails to decode.
pub fn parse_raw_transactions(
    raw: GetTransactionsResponseRaw,
) -> Result<GetTransactionsResponse, xdr::Error> {
    raw.try_into()
}

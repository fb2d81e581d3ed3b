use serde_aux::prelude::deserialize_number_from_string;
use stellar_xdr::curr::{self as xdr, DiagnosticEvent, TransactionResult};

use crate::{from_xdr, from_xdr_list, log};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct SendTransactionResponseRaw {
    pub hash: String,
    pub status: String,
    #[serde(
        rename = "errorResultXdr",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub error_result_xdr: Option<String>,
    #[serde(
        rename = "diagnosticEventsXdr",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub diagnostic_events_xdr: Option<Vec<String>>,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger: u32,
    #[serde(
        rename = "latestLedgerCloseTime",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger_close_time: i64,
}

/// The transaction was accepted for submission (`PENDING`, `DUPLICATE`, `TRY_AGAIN_LATER`).
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionSuccess {
    pub hash: String,
    pub status: String,
    pub latest_ledger: u32,
    pub latest_ledger_close_time: i64,
}

/// The transaction was rejected before reaching the ledger.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionError {
    pub hash: String,
    pub status: String,
    pub latest_ledger: u32,
    pub latest_ledger_close_time: i64,
    pub error_result: TransactionResult,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub diagnostic_events: Option<Vec<DiagnosticEvent>>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SendTransactionResponse {
    Success(SendTransactionSuccess),
    Error(SendTransactionError),
}

impl SendTransactionResponse {
    #[must_use]
    pub fn hash(&self) -> &str {
        match self {
            Self::Success(SendTransactionSuccess { hash, .. })
            | Self::Error(SendTransactionError { hash, .. }) => hash,
        }
    }

    #[must_use]
    pub fn status(&self) -> &str {
        match self {
            Self::Success(SendTransactionSuccess { status, .. })
            | Self::Error(SendTransactionError { status, .. }) => status,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl TryFrom<SendTransactionResponseRaw> for SendTransactionResponse {
    type Error = xdr::Error;

    fn try_from(raw: SendTransactionResponseRaw) -> Result<Self, xdr::Error> {
        let SendTransactionResponseRaw {
            hash,
            status,
            error_result_xdr,
            diagnostic_events_xdr,
            latest_ledger,
            latest_ledger_close_time,
        } = raw;
        tracing::trace!(%hash, %status, "parsing sendTransaction response");

        let Some(error_result_xdr) = error_result_xdr.filter(|x| !x.is_empty()) else {
            return Ok(Self::Success(SendTransactionSuccess {
                hash,
                status,
                latest_ledger,
                latest_ledger_close_time,
            }));
        };

        let error_result = from_xdr(&error_result_xdr)?;
        let diagnostic_events = diagnostic_events_xdr
            .filter(|events| !events.is_empty())
            .map(|events| from_xdr_list(&events))
            .transpose()?;
        if let Some(events) = &diagnostic_events {
            log::diagnostic_events(events, tracing::Level::DEBUG);
        }
        Ok(Self::Error(SendTransactionError {
            hash,
            status,
            latest_ledger,
            latest_ledger_close_time,
            error_result,
            diagnostic_events,
        }))
    }
}

/// Decodes the error result and diagnostic events of a `sendTransaction` response.
///
/// # Errors
/// Any XDR payload that fails to decode.
pub fn parse_raw_send_transaction(
    raw: SendTransactionResponseRaw,
) -> Result<SendTransactionResponse, xdr::Error> {
    raw.try_into()
}

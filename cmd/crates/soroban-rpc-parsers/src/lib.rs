//! Decoding of Soroban RPC responses.
//!
//! Every RPC method whose response embeds base64 XDR has a `*Raw` type that deserializes the
//! wire JSON as-is, and a parsed counterpart holding decoded [`stellar_xdr::curr`] values. The
//! conversion is a `TryFrom` impl on the parsed type, with a `parse_*` free function alongside
//! for callers that prefer a named entry point.
//!
//! Nothing here talks to the network. Callers fetch the JSON, deserialize it into the raw type
//! and hand it over.
use stellar_xdr::curr::{self as xdr, Limits, ReadXdr};

pub mod events;
pub mod ledger_entries;
pub mod log;
pub mod send_transaction;
pub mod simulation;
pub mod transaction;

pub use events::{
    does_topic_match, parse_cursor, parse_raw_events, Event, EventRaw, GetEventsResponse,
    GetEventsResponseRaw,
};
pub use ledger_entries::{
    parse_raw_ledger_entries, GetLedgerEntriesResponse, GetLedgerEntriesResponseRaw,
    LedgerEntryResult, LedgerEntryResultRaw,
};
pub use send_transaction::{
    parse_raw_send_transaction, SendTransactionError, SendTransactionResponse,
    SendTransactionResponseRaw, SendTransactionSuccess,
};
pub use simulation::{
    parse_raw_simulation, Cost, LedgerEntryChange, LedgerEntryChangeRaw, LedgerEntryChangeType,
    ParsedMarker, RestorePreamble, RestorePreambleRaw, SimulateHostFunctionResult,
    SimulateHostFunctionResultRaw, SimulateTransactionError, SimulateTransactionResponse,
    SimulateTransactionResponseRaw, SimulateTransactionRestore, SimulateTransactionSuccess,
    SimulationBase, SimulationInput, PARSED_TAG,
};
pub use transaction::{
    parse_raw_transaction, parse_raw_transactions, parse_transaction_info, GetTransactionResponse,
    GetTransactionResponseRaw, GetTransactionsResponse, GetTransactionsResponseRaw,
    TransactionInfo, TransactionInfoRaw, TransactionStatus, TransactionWithStatus,
    TransactionWithStatusRaw,
};

/// Maximum nesting depth accepted when decoding any XDR payload from the RPC.
pub const MAX_DEPTH: u32 = 1000;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("xdr processing error: {0}")]
    Xdr(#[from] xdr::Error),
    #[error("ledger entry is missing its key or value: {0:?}")]
    MalformedLedgerEntry(Box<LedgerEntryResultRaw>),
    #[error("invalid contract id: {0}")]
    InvalidContractId(#[from] stellar_strkey::DecodeError),
    #[error("cursor is not valid")]
    InvalidCursor,
    #[error("transaction with status {status} is missing its envelope, result or meta")]
    MissingTransactionInfo { status: TransactionStatus },
    #[error("json decoding error: {0}")]
    Json(#[from] serde_json::Error),
}

fn from_xdr<T: ReadXdr>(x: &str) -> Result<T, xdr::Error> {
    T::from_xdr_base64(x, Limits::depth(MAX_DEPTH))
}

fn from_xdr_list<T: ReadXdr>(list: &[String]) -> Result<Vec<T>, xdr::Error> {
    list.iter().map(|x| from_xdr(x)).collect()
}

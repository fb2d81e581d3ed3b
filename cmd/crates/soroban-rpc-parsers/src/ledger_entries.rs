use serde_aux::prelude::{deserialize_number_from_string, deserialize_option_number_from_string};
use stellar_xdr::curr::{LedgerEntryData, LedgerKey};

use crate::{from_xdr, Error};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryResultRaw {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub xdr: Option<String>,
    #[serde(
        rename = "lastModifiedLedgerSeq",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub last_modified_ledger: u32,
    #[serde(
        rename = "liveUntilLedgerSeq",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_option_number_from_string",
        default
    )]
    pub live_until_ledger_seq: Option<u32>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: LedgerKey,
    pub val: LedgerEntryData,
    pub last_modified_ledger_seq: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub live_until_ledger_seq: Option<u32>,
}

impl TryFrom<LedgerEntryResultRaw> for LedgerEntryResult {
    type Error = Error;

    fn try_from(raw: LedgerEntryResultRaw) -> Result<Self, Self::Error> {
        let (Some(key), Some(xdr)) = (&raw.key, &raw.xdr) else {
            return Err(Error::MalformedLedgerEntry(Box::new(raw)));
        };
        Ok(LedgerEntryResult {
            key: from_xdr(key)?,
            val: from_xdr(xdr)?,
            last_modified_ledger_seq: raw.last_modified_ledger,
            live_until_ledger_seq: raw.live_until_ledger_seq,
        })
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct GetLedgerEntriesResponseRaw {
    /// `null` when none of the requested keys exist.
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResultRaw>>,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger: u32,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResponse {
    pub entries: Vec<LedgerEntryResult>,
    pub latest_ledger: u32,
}

impl TryFrom<GetLedgerEntriesResponseRaw> for GetLedgerEntriesResponse {
    type Error = Error;

    fn try_from(raw: GetLedgerEntriesResponseRaw) -> Result<Self, Self::Error> {
        let entries = raw.entries.unwrap_or_default();
        tracing::trace!(count = entries.len(), "parsing getLedgerEntries response");
        Ok(GetLedgerEntriesResponse {
            entries: entries
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<Vec<_>, _>>()?,
            latest_ledger: raw.latest_ledger,
        })
    }
}

/// Decodes every key/value pair of a `getLedgerEntries` response.
///
/// # Errors
/// An entry without its `key` or `xdr`, or any XDR payload that fails to decode.
pub fn parse_raw_ledger_entries(
    raw: GetLedgerEntriesResponseRaw,
) -> Result<GetLedgerEntriesResponse, Error> {
    raw.try_into()
}

use std::fmt::Display;

use itertools::Itertools;
use serde_aux::prelude::{deserialize_default_from_null, deserialize_number_from_string};
use serde_with::{serde_as, DisplayFromStr};
use stellar_xdr::curr::ScVal;

use crate::{from_xdr, from_xdr_list, Error};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct GetEventsResponseRaw {
    #[serde(deserialize_with = "deserialize_default_from_null")]
    pub events: Vec<EventRaw>,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cursor: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetEventsResponse {
    pub events: Vec<Event>,
    pub latest_ledger: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cursor: Option<String>,
}

impl TryFrom<GetEventsResponseRaw> for GetEventsResponse {
    type Error = Error;

    fn try_from(raw: GetEventsResponseRaw) -> Result<Self, Self::Error> {
        tracing::trace!(count = raw.events.len(), "parsing getEvents response");
        Ok(GetEventsResponse {
            events: raw
                .events
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<Vec<_>, _>>()?,
            latest_ledger: raw.latest_ledger,
            cursor: raw.cursor,
        })
    }
}

/// Decodes the topics and values of every event in a `getEvents` response.
///
/// # Errors
/// Any XDR payload that fails to decode, or a non-empty contract id that isn't a contract
/// strkey.
pub fn parse_raw_events(raw: GetEventsResponseRaw) -> Result<GetEventsResponse, Error> {
    raw.try_into()
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct EventRaw {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ledger: u32,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: String,
    /// Empty for events that aren't scoped to a contract.
    #[serde(rename = "contractId", default)]
    pub contract_id: String,
    pub id: String,
    #[serde(rename = "pagingToken", skip_serializing_if = "Option::is_none", default)]
    pub paging_token: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: bool,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub topic: Vec<String>,
    pub value: String,
}

#[serde_as]
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub ledger: u32,
    pub ledger_closed_at: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paging_token: Option<String>,
    pub in_successful_contract_call: bool,
    pub tx_hash: String,
    pub topic: Vec<ScVal>,
    pub value: ScVal,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<stellar_strkey::Contract>,
}

impl TryFrom<EventRaw> for Event {
    type Error = Error;

    fn try_from(raw: EventRaw) -> Result<Self, Self::Error> {
        let contract_id = if raw.contract_id.is_empty() {
            None
        } else {
            Some(stellar_strkey::Contract::from_string(&raw.contract_id)?)
        };
        Ok(Event {
            event_type: raw.event_type,
            ledger: raw.ledger,
            ledger_closed_at: raw.ledger_closed_at,
            id: raw.id,
            paging_token: raw.paging_token,
            in_successful_contract_call: raw.in_successful_contract_call,
            tx_hash: raw.tx_hash,
            topic: from_xdr_list(&raw.topic)?,
            value: from_xdr(&raw.value)?,
            contract_id,
        })
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Event {} [{}]:", self.id, self.event_type.to_ascii_uppercase())?;
        writeln!(
            f,
            "  Ledger:   {} (closed at {})",
            self.ledger, self.ledger_closed_at
        )?;
        if let Some(contract_id) = &self.contract_id {
            writeln!(f, "  Contract: {contract_id}")?;
        }
        writeln!(f, "  Topics:")?;
        for topic in &self.topic {
            writeln!(f, "            {topic:?}")?;
        }
        writeln!(f, "  Value:    {:?}", self.value)
    }
}

impl Event {
    /// Splits this event's id into its TOID and event index.
    ///
    /// # Errors
    /// When the id isn't a valid cursor.
    pub fn parse_cursor(&self) -> Result<(u64, i32), Error> {
        parse_cursor(&self.id)
    }
}

// Determines whether or not a particular filter matches a topic based on the
// same semantics as the RPC server:
//
//  - for an exact segment match, the filter is a base64-encoded ScVal
//  - for a wildcard, single-segment match, the string "*" matches exactly one
//    segment
//
// `filter` is expected to have been validated already, and `topic` is the raw
// (still encoded) topic list of an event.
#[must_use]
pub fn does_topic_match(topic: &[String], filter: &[String]) -> bool {
    filter.len() == topic.len()
        && filter
            .iter()
            .zip(topic)
            .all(|(segment, t)| segment == "*" || segment == t)
}

/// Splits an event id of the form `<toid>-<event index>`.
///
/// # Errors
/// When the id doesn't have exactly two numeric parts.
pub fn parse_cursor(c: &str) -> Result<(u64, i32), Error> {
    let (toid_part, event_index) = c.split('-').collect_tuple().ok_or(Error::InvalidCursor)?;
    let toid_part: u64 = toid_part.parse().map_err(|_| Error::InvalidCursor)?;
    let start_index: i32 = event_index.parse().map_err(|_| Error::InvalidCursor)?;
    Ok((toid_part, start_index))
}

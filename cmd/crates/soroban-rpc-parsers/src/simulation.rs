use serde::de::Error as _;
use serde_aux::prelude::{
    deserialize_default_from_null, deserialize_number_from_string,
    deserialize_option_number_from_string, deserialize_string_from_number,
};
use stellar_xdr::curr::{
    self as xdr, DiagnosticEvent, LedgerEntry, LedgerKey, ScVal, SorobanAuthorizationEntry,
    SorobanTransactionData,
};

use crate::{from_xdr, from_xdr_list, log, Error};

/// Name of the field every serialized [`SimulateTransactionResponse`] carries.
pub const PARSED_TAG: &str = "_parsed";

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cost {
    #[serde(
        rename = "cpuInsns",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub cpu_insns: u64,
    #[serde(
        rename = "memBytes",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub mem_bytes: u64,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct SimulateHostFunctionResultRaw {
    #[serde(deserialize_with = "deserialize_default_from_null", default)]
    pub auth: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub xdr: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SimulateHostFunctionResult {
    pub auth: Vec<SorobanAuthorizationEntry>,
    pub retval: ScVal,
}

impl TryFrom<SimulateHostFunctionResultRaw> for SimulateHostFunctionResult {
    type Error = xdr::Error;

    fn try_from(raw: SimulateHostFunctionResultRaw) -> Result<Self, Self::Error> {
        Ok(SimulateHostFunctionResult {
            auth: from_xdr_list(&raw.auth)?,
            retval: raw
                .xdr
                .as_deref()
                .map(from_xdr)
                .transpose()?
                .unwrap_or(ScVal::Void),
        })
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryChangeType {
    Created,
    Updated,
    Deleted,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct LedgerEntryChangeRaw {
    #[serde(rename = "type")]
    pub change_type: LedgerEntryChangeType,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub after: Option<String>,
}

/// A ledger entry touched by the simulated transaction. `before` is `None` for a creation and
/// `after` is `None` for a deletion.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryChange {
    #[serde(rename = "type")]
    pub change_type: LedgerEntryChangeType,
    pub key: LedgerKey,
    pub before: Option<LedgerEntry>,
    pub after: Option<LedgerEntry>,
}

impl TryFrom<LedgerEntryChangeRaw> for LedgerEntryChange {
    type Error = xdr::Error;

    fn try_from(raw: LedgerEntryChangeRaw) -> Result<Self, Self::Error> {
        Ok(LedgerEntryChange {
            change_type: raw.change_type,
            key: from_xdr(&raw.key)?,
            before: raw.before.as_deref().map(from_xdr).transpose()?,
            after: raw.after.as_deref().map(from_xdr).transpose()?,
        })
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct RestorePreambleRaw {
    /// Empty when no restoration is needed.
    #[serde(rename = "transactionData", default)]
    pub transaction_data: String,
    #[serde(
        rename = "minResourceFee",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub min_resource_fee: u64,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    pub min_resource_fee: u64,
    pub transaction_data: SorobanTransactionData,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct SimulateTransactionResponseRaw {
    #[serde(deserialize_with = "deserialize_string_from_number", default)]
    pub id: String,
    #[serde(
        rename = "latestLedger",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub latest_ledger: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(
        rename = "transactionData",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub transaction_data: Option<String>,
    #[serde(
        deserialize_with = "deserialize_default_from_null",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub events: Vec<String>,
    #[serde(
        rename = "minResourceFee",
        deserialize_with = "deserialize_option_number_from_string",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub min_resource_fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cost: Option<Cost>,
    #[serde(
        deserialize_with = "deserialize_default_from_null",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub results: Vec<SimulateHostFunctionResultRaw>,
    #[serde(
        rename = "restorePreamble",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub restore_preamble: Option<RestorePreambleRaw>,
    #[serde(
        rename = "stateChanges",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub state_changes: Option<Vec<LedgerEntryChangeRaw>>,
}

/// Discriminant carried by every parsed simulation. Serializes as `true` and refuses anything
/// else, so a parsed response can be told apart from a raw one by this field alone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedMarker;

impl serde::Serialize for ParsedMarker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> serde::Deserialize<'de> for ParsedMarker {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if bool::deserialize(deserializer)? {
            Ok(ParsedMarker)
        } else {
            Err(D::Error::custom(format!("`{PARSED_TAG}` must be true")))
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationBase {
    #[serde(rename = "_parsed")]
    pub parsed: ParsedMarker,
    pub id: String,
    pub latest_ledger: u32,
    pub events: Vec<DiagnosticEvent>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SimulateTransactionError {
    #[serde(flatten)]
    pub base: SimulationBase,
    pub error: String,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionSuccess {
    #[serde(flatten)]
    pub base: SimulationBase,
    pub transaction_data: SorobanTransactionData,
    pub min_resource_fee: u64,
    pub cost: Cost,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<SimulateHostFunctionResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state_changes: Option<Vec<LedgerEntryChange>>,
}

/// A successful simulation that will only succeed on-chain once archived entries are restored.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionRestore {
    #[serde(flatten)]
    pub success: SimulateTransactionSuccess,
    pub restore_preamble: RestorePreamble,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SimulateTransactionResponse {
    Error(SimulateTransactionError),
    Success(SimulateTransactionSuccess),
    Restore(SimulateTransactionRestore),
}

impl SimulateTransactionResponse {
    #[must_use]
    pub fn base(&self) -> &SimulationBase {
        match self {
            Self::Error(SimulateTransactionError { base, .. })
            | Self::Success(SimulateTransactionSuccess { base, .. })
            | Self::Restore(SimulateTransactionRestore {
                success: SimulateTransactionSuccess { base, .. },
                ..
            }) => base,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// True for both plain successes and successes that need a restore first.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    #[must_use]
    pub fn is_restore(&self) -> bool {
        matches!(self, Self::Restore(_))
    }

    #[must_use]
    pub fn success(&self) -> Option<&SimulateTransactionSuccess> {
        match self {
            Self::Error(_) => None,
            Self::Success(success) | Self::Restore(SimulateTransactionRestore { success, .. }) => {
                Some(success)
            }
        }
    }

    #[must_use]
    pub fn restore_preamble(&self) -> Option<&RestorePreamble> {
        match self {
            Self::Restore(SimulateTransactionRestore {
                restore_preamble, ..
            }) => Some(restore_preamble),
            Self::Error(_) | Self::Success(_) => None,
        }
    }
}

/// Input accepted by [`parse_raw_simulation`]: a response still in wire form, or one that has
/// already been parsed.
#[derive(Debug, Clone)]
pub enum SimulationInput {
    Raw(SimulateTransactionResponseRaw),
    Parsed(SimulateTransactionResponse),
}

impl SimulationInput {
    /// Reads a simulation from JSON. Objects carrying the [`PARSED_TAG`] field are read as
    /// parsed responses, everything else as raw wire responses.
    ///
    /// # Errors
    /// When the value doesn't deserialize into the shape its tag selects.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        if value.get(PARSED_TAG).is_some() {
            Ok(Self::Parsed(serde_json::from_value(value)?))
        } else {
            Ok(Self::Raw(serde_json::from_value(value)?))
        }
    }

    /// Same as [`SimulationInput::from_value`], starting from a JSON string.
    ///
    /// # Errors
    /// When `s` isn't JSON, or doesn't deserialize into the shape its tag selects.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        Self::from_value(serde_json::from_str(s)?)
    }
}

impl From<SimulateTransactionResponseRaw> for SimulationInput {
    fn from(raw: SimulateTransactionResponseRaw) -> Self {
        Self::Raw(raw)
    }
}

impl From<SimulateTransactionResponse> for SimulationInput {
    fn from(parsed: SimulateTransactionResponse) -> Self {
        Self::Parsed(parsed)
    }
}

impl TryFrom<SimulateTransactionResponseRaw> for SimulateTransactionResponse {
    type Error = xdr::Error;

    fn try_from(raw: SimulateTransactionResponseRaw) -> Result<Self, xdr::Error> {
        let SimulateTransactionResponseRaw {
            id,
            latest_ledger,
            error,
            transaction_data,
            events,
            min_resource_fee,
            cost,
            results,
            restore_preamble,
            state_changes,
        } = raw;
        tracing::trace!(%id, latest_ledger, "parsing simulateTransaction response");

        let base = SimulationBase {
            parsed: ParsedMarker,
            id,
            latest_ledger,
            events: from_xdr_list(&events)?,
        };
        log::diagnostic_events(&base.events, tracing::Level::DEBUG);

        if let Some(error) = error {
            return Ok(Self::Error(SimulateTransactionError { base, error }));
        }
        SuccessfulSimulationBuilder {
            transaction_data,
            min_resource_fee,
            cost,
            results,
            restore_preamble,
            state_changes,
        }
        .build(base)
    }
}

/// The fields of a raw simulation that only matter once it is known not to have failed.
struct SuccessfulSimulationBuilder {
    transaction_data: Option<String>,
    min_resource_fee: Option<u64>,
    cost: Option<Cost>,
    results: Vec<SimulateHostFunctionResultRaw>,
    restore_preamble: Option<RestorePreambleRaw>,
    state_changes: Option<Vec<LedgerEntryChangeRaw>>,
}

impl SuccessfulSimulationBuilder {
    fn build(self, base: SimulationBase) -> Result<SimulateTransactionResponse, xdr::Error> {
        // Only single-operation transactions can be simulated, so there is at most one result.
        if self.results.len() > 1 {
            tracing::warn!(
                count = self.results.len(),
                "simulation returned more than one result, ignoring all but the first"
            );
        }
        let result = self
            .results
            .into_iter()
            .next()
            .map(SimulateHostFunctionResult::try_from)
            .transpose()?;

        let state_changes = self
            .state_changes
            .map(|changes| {
                changes
                    .into_iter()
                    .map(LedgerEntryChange::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let success = SimulateTransactionSuccess {
            base,
            transaction_data: from_xdr(self.transaction_data.as_deref().unwrap_or_default())?,
            min_resource_fee: self.min_resource_fee.unwrap_or_default(),
            cost: self.cost.unwrap_or_default(),
            result,
            state_changes,
        };

        match self
            .restore_preamble
            .filter(|preamble| !preamble.transaction_data.is_empty())
        {
            Some(preamble) => Ok(SimulateTransactionResponse::Restore(
                SimulateTransactionRestore {
                    success,
                    restore_preamble: RestorePreamble {
                        min_resource_fee: preamble.min_resource_fee,
                        transaction_data: from_xdr(&preamble.transaction_data)?,
                    },
                },
            )),
            None => Ok(SimulateTransactionResponse::Success(success)),
        }
    }
}

/// Parses a `simulateTransaction` response. Already-parsed input is handed back untouched.
///
/// # Errors
/// Any XDR payload that fails to decode.
pub fn parse_raw_simulation(
    input: impl Into<SimulationInput>,
) -> Result<SimulateTransactionResponse, xdr::Error> {
    match input.into() {
        SimulationInput::Parsed(parsed) => Ok(parsed),
        SimulationInput::Raw(raw) => raw.try_into(),
    }
}

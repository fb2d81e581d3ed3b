use serde_json::json;
use soroban_rpc_parsers::{
    parse_raw_simulation, Cost, SimulateTransactionResponse, SimulateTransactionResponseRaw,
    SimulationInput,
};
use stellar_xdr::curr::ScVal;

use crate::util::{b64, diagnostic_event, transaction_data};

#[test]
fn empty_restore_preamble_parses_to_success() {
    let raw: SimulateTransactionResponseRaw = serde_json::from_value(json!({
        "id": "1",
        "latestLedger": 100,
        "results": [{ "xdr": b64(&ScVal::Void), "auth": [] }],
        "transactionData": b64(&transaction_data()),
        "minResourceFee": "100",
        "cost": { "cpuInsns": "1200", "memBytes": "3400" },
        "restorePreamble": { "transactionData": "", "minResourceFee": "0" },
    }))
    .unwrap();

    let parsed = parse_raw_simulation(raw).unwrap();
    let SimulateTransactionResponse::Success(success) = &parsed else {
        panic!("expected success simulation, got {parsed:#?}");
    };
    assert_eq!(success.base.id, "1");
    assert_eq!(success.base.latest_ledger, 100);
    assert_eq!(success.min_resource_fee, 100);
    assert_eq!(
        success.cost,
        Cost {
            cpu_insns: 1200,
            mem_bytes: 3400
        }
    );
    assert_eq!(success.transaction_data, transaction_data());
    assert_eq!(success.result.as_ref().unwrap().retval, ScVal::Void);
    assert_eq!(parsed.restore_preamble(), None);
}

#[test]
fn restore_preamble_parses_to_restore() {
    let raw: SimulateTransactionResponseRaw = serde_json::from_value(json!({
        "id": "2",
        "latestLedger": "100",
        "results": [],
        "events": [b64(&diagnostic_event())],
        "transactionData": b64(&transaction_data()),
        "minResourceFee": 100,
        "cost": { "cpuInsns": 1, "memBytes": 1 },
        "restorePreamble": {
            "transactionData": b64(&transaction_data()),
            "minResourceFee": "5000",
        },
    }))
    .unwrap();

    let parsed = parse_raw_simulation(raw).unwrap();
    assert!(parsed.is_restore());
    assert_eq!(parsed.base().events, vec![diagnostic_event()]);
    assert_eq!(parsed.restore_preamble().unwrap().min_resource_fee, 5000);
    assert_eq!(parsed.success().unwrap().result, None);
}

#[test]
fn state_changes_are_read_from_json() {
    use stellar_xdr::curr::{
        ContractDataDurability, Hash, LedgerKey, LedgerKeyContractData, ScAddress,
    };
    let key = LedgerKey::ContractData(LedgerKeyContractData {
        contract: ScAddress::Contract(Hash([8; 32])),
        key: ScVal::LedgerKeyContractInstance,
        durability: ContractDataDurability::Persistent,
    });
    let raw: SimulateTransactionResponseRaw = serde_json::from_value(json!({
        "latestLedger": 3,
        "transactionData": b64(&transaction_data()),
        "minResourceFee": "1",
        "cost": { "cpuInsns": "1", "memBytes": "1" },
        "stateChanges": [{ "type": "deleted", "key": b64(&key), "before": null, "after": null }],
    }))
    .unwrap();

    let parsed = parse_raw_simulation(raw).unwrap();
    let changes = parsed.success().unwrap().state_changes.as_ref().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, key);
    assert_eq!(changes[0].before, None);
    assert_eq!(changes[0].after, None);
}

#[test]
fn parsed_simulation_survives_json_boundary() {
    let input = SimulationInput::from_json(
        &json!({
            "id": "5",
            "latestLedger": 9,
            "error": "HostError: Error(WasmVm, InvalidAction)",
            "events": [b64(&diagnostic_event())],
        })
        .to_string(),
    )
    .unwrap();
    assert!(matches!(input, SimulationInput::Raw(_)));
    let parsed = parse_raw_simulation(input).unwrap();
    assert!(parsed.is_error());

    let serialized = serde_json::to_string(&parsed).unwrap();
    let again = SimulationInput::from_json(&serialized).unwrap();
    assert!(matches!(again, SimulationInput::Parsed(_)));
    assert_eq!(parse_raw_simulation(again).unwrap(), parsed);
}

#[test]
fn parsed_restore_survives_json_boundary() {
    let raw: SimulateTransactionResponseRaw = serde_json::from_value(json!({
        "id": "6",
        "latestLedger": 120,
        "results": [{ "xdr": b64(&ScVal::U64(u64::MAX)), "auth": null }],
        "events": [b64(&diagnostic_event())],
        "transactionData": b64(&transaction_data()),
        "minResourceFee": "90",
        "cost": { "cpuInsns": "10", "memBytes": "20" },
        "restorePreamble": {
            "transactionData": b64(&transaction_data()),
            "minResourceFee": "700",
        },
    }))
    .unwrap();
    let parsed = parse_raw_simulation(raw).unwrap();
    assert!(parsed.is_restore());

    let serialized = serde_json::to_string(&parsed).unwrap();
    let again = SimulationInput::from_json(&serialized).unwrap();
    assert!(matches!(again, SimulationInput::Parsed(_)));
    let again = parse_raw_simulation(again).unwrap();
    assert_eq!(again, parsed);
    assert_eq!(again.restore_preamble().unwrap().min_resource_fee, 700);
    assert_eq!(
        again.success().unwrap().result.as_ref().unwrap().retval,
        ScVal::U64(u64::MAX)
    );
}

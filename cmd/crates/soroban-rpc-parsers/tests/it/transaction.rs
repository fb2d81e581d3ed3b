use serde_json::json;
use soroban_rpc_parsers::{
    parse_raw_transaction, parse_raw_transactions, Error, GetTransactionResponseRaw,
    GetTransactionsResponseRaw, TransactionStatus,
};
use stellar_xdr::curr::{
    Memo, MuxedAccount, Preconditions, ScVal, SequenceNumber, Transaction, TransactionEnvelope,
    TransactionExt, TransactionResult, TransactionResultExt, TransactionResultResult,
    TransactionV1Envelope, Uint256, VecM,
};

use crate::util::{b64, b64_words};

// V3 meta whose soroban meta returns U32(7).
const META_V3_RETURNING_SEVEN: &[u32] = &[3, 0, 0, 0, 0, 1, 0, 0, 3, 7, 0];

fn envelope() -> TransactionEnvelope {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx: Transaction {
            source_account: MuxedAccount::Ed25519(Uint256([9; 32])),
            fee: 200,
            seq_num: SequenceNumber(12),
            cond: Preconditions::None,
            memo: Memo::Text("hi".try_into().unwrap()),
            operations: VecM::default(),
            ext: TransactionExt::V0,
        },
        signatures: VecM::default(),
    })
}

fn result() -> TransactionResult {
    TransactionResult {
        fee_charged: 150,
        result: TransactionResultResult::TxSuccess(VecM::default()),
        ext: TransactionResultExt::V0,
    }
}

fn transaction_fields() -> serde_json::Value {
    json!({
        "ledger": 1500,
        "createdAt": "1700000100",
        "applicationOrder": 2,
        "feeBump": false,
        "envelopeXdr": b64(&envelope()),
        "resultXdr": b64(&result()),
        "resultMetaXdr": b64_words(META_V3_RETURNING_SEVEN),
    })
}

fn with_fields(mut value: serde_json::Value, fields: serde_json::Value) -> serde_json::Value {
    if let (Some(target), serde_json::Value::Object(fields)) = (value.as_object_mut(), fields) {
        target.extend(fields);
    }
    value
}

fn ledger_window() -> serde_json::Value {
    json!({
        "latestLedger": 1600,
        "latestLedgerCloseTime": "1700000500",
        "oldestLedger": 1000,
        "oldestLedgerCloseTime": "1699990000",
    })
}

#[test]
fn found_transaction_is_decoded() {
    let raw: GetTransactionResponseRaw = serde_json::from_value(with_fields(
        with_fields(json!({ "status": "SUCCESS" }), ledger_window()),
        transaction_fields(),
    ))
    .unwrap();

    let parsed = parse_raw_transaction(raw).unwrap();
    assert_eq!(parsed.status, TransactionStatus::Success);
    assert_eq!(parsed.return_value(), Some(&ScVal::U32(7)));
    let info = parsed.transaction.as_ref().unwrap();
    assert_eq!(info.envelope, envelope());
    assert_eq!(info.result, result());
    assert_eq!(info.ledger, 1500);
    assert_eq!(info.created_at, 1_700_000_100);
    assert!(parsed.events().is_empty());
}

#[test]
fn not_found_has_no_transaction() {
    let raw: GetTransactionResponseRaw =
        serde_json::from_value(with_fields(json!({ "status": "NOT_FOUND" }), ledger_window()))
            .unwrap();

    let parsed = parse_raw_transaction(raw).unwrap();
    assert_eq!(parsed.status, TransactionStatus::NotFound);
    assert_eq!(parsed.transaction, None);
    assert_eq!(parsed.return_value(), None);
    assert_eq!(parsed.latest_ledger, 1600);
}

#[test]
fn failed_without_fields_is_rejected() {
    let raw: GetTransactionResponseRaw =
        serde_json::from_value(with_fields(json!({ "status": "FAILED" }), ledger_window()))
            .unwrap();

    assert!(matches!(
        parse_raw_transaction(raw),
        Err(Error::MissingTransactionInfo {
            status: TransactionStatus::Failed
        })
    ));
}

#[test]
fn transaction_page_is_decoded() {
    let raw: GetTransactionsResponseRaw = serde_json::from_value(json!({
        "transactions": [
            with_fields(json!({ "status": "SUCCESS", "txHash": "ff" }), transaction_fields()),
            with_fields(json!({ "status": "FAILED" }), transaction_fields()),
        ],
        "latestLedger": 1600,
        "latestLedgerCloseTimestamp": 1_700_000_500,
        "oldestLedger": 1000,
        "oldestLedgerCloseTimestamp": 1_699_990_000,
        "cursor": "6442450944",
    }))
    .unwrap();

    let parsed = parse_raw_transactions(raw).unwrap();
    assert_eq!(parsed.transactions.len(), 2);
    assert_eq!(parsed.transactions[0].status, TransactionStatus::Success);
    assert_eq!(parsed.transactions[0].info.tx_hash.as_deref(), Some("ff"));
    assert_eq!(parsed.transactions[1].status, TransactionStatus::Failed);
    assert_eq!(
        parsed.transactions[1].info.return_value,
        Some(ScVal::U32(7))
    );
    assert_eq!(parsed.cursor, "6442450944");
}

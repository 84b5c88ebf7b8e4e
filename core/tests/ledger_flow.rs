//! End-to-end invocation flow: registry, simulation and commit

use std::collections::BTreeSet;
use std::sync::Arc;

use meddata_core::{default_registry, CoreConfig, CoreError, Invocation, Ledger};
use serde_json::Value;

fn ledger() -> Ledger {
    let _ = env_logger::builder().is_test(true).try_init();
    Ledger::new(default_registry(Arc::new(CoreConfig::testing())).unwrap())
}

fn json(payload: Vec<u8>) -> Value {
    serde_json::from_slice(&payload).unwrap()
}

#[test]
fn register_upload_and_read_back() {
    let ledger = ledger();

    let registered = ledger.submit(&Invocation::new("register", &["dev-1"])).unwrap();
    let again = ledger.submit(&Invocation::new("register", &["dev-1"])).unwrap();
    assert_eq!(json(registered.payload)["result"], "success");
    assert_eq!(json(again.payload.clone())["result"], "exists");
    assert_eq!(json(again.payload)["hash"], registered.tx_id.as_str());

    for sub_key in ["a", "b", "c"] {
        ledger
            .submit(&Invocation::new("uploadData", &["dev-1", sub_key, "ecg", &format!("h-{}", sub_key)]))
            .unwrap();
    }

    let datum = json(ledger.evaluate(&Invocation::new("queryBySubkey", &["dev-1", "b"])).unwrap());
    assert_eq!(datum["key"], "dev-1");
    assert_eq!(datum["subKey"], "b");
    assert_eq!(datum["index"], "Subkey");

    let check = json(ledger.evaluate(&Invocation::new("checkBySubkey", &["dev-1", "zz"])).unwrap());
    assert_eq!(check, serde_json::json!({"result": false}));

    let history = json(ledger.evaluate(&Invocation::new("getHistory", &["dev-1"])).unwrap());
    let sub_keys: BTreeSet<String> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["Record"]["subKey"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(sub_keys, ["a", "b", "c"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>());

    // index entries live in the composite namespace, outside simple-key ranges
    let range = json(ledger.evaluate(&Invocation::new("getDataByRangeWithPagination", &["", "", "10", ""])).unwrap());
    assert_eq!(range["ResponseMetadata"]["RecordsCount"], 1);
    assert_eq!(range["result"][0]["Key"], "dev-1");
}

#[test]
fn range_pagination_over_five_records() {
    let ledger = ledger();
    for key in ["p1", "p2", "p3", "p4", "p5"] {
        ledger.submit(&Invocation::new("register", &[key])).unwrap();
    }

    let mut bookmark = String::new();
    let mut counts = Vec::new();
    let mut keys = Vec::new();
    loop {
        let page = json(
            ledger
                .evaluate(&Invocation::new("getDataByRangeWithPagination", &["p1", "p9", "2", &bookmark]))
                .unwrap(),
        );
        counts.push(page["ResponseMetadata"]["RecordsCount"].as_u64().unwrap());
        for entry in page["result"].as_array().unwrap() {
            keys.push(entry["Key"].as_str().unwrap().to_string());
        }
        bookmark = page["ResponseMetadata"]["Bookmark"].as_str().unwrap().to_string();
        if bookmark.is_empty() {
            break;
        }
    }

    assert_eq!(counts, vec![2, 2, 1]);
    assert_eq!(keys, vec!["p1", "p2", "p3", "p4", "p5"]);
}

#[test]
fn concurrent_register_second_commit_conflicts() {
    let ledger = ledger();
    let invocation = Invocation::new("register", &["dev-1"]);

    let (_, first) = ledger.simulate(&invocation).unwrap();
    let (_, second) = ledger.simulate(&invocation).unwrap();

    ledger.commit(first).unwrap();
    let err = ledger.commit(second).unwrap_err();
    assert!(matches!(err, CoreError::CommitConflict(_)));
    assert_eq!(err.kind(), "CommitConflict");
}

#[test]
fn delete_and_key_history() {
    let ledger = ledger();
    let registered = ledger.submit(&Invocation::new("register", &["dev-1"])).unwrap();
    let deleted = ledger.submit(&Invocation::new("delete", &["dev-1"])).unwrap();
    assert_eq!(json(deleted.payload), serde_json::json!({"result": true}));

    let history = json(ledger.evaluate(&Invocation::new("getKeyHistory", &["dev-1"])).unwrap());
    assert_eq!(history[0]["TxId"], deleted.tx_id.as_str());
    assert_eq!(history[0]["IsDelete"], true);
    assert_eq!(history[1]["TxId"], registered.tx_id.as_str());
    assert_eq!(history[1]["Value"]["key"], "dev-1");

    let err = ledger.evaluate(&Invocation::new("queryKey", &["dev-1"])).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn task_contract_by_qualified_name() {
    let ledger = ledger();
    ledger.submit(&Invocation::new("org.ttdata.assettask:InitTask", &[])).unwrap();
    ledger
        .submit(
            &Invocation::new("TransferTask", &["Task-3", "Worker 2"]).with_contract("org.ttdata.assettask"),
        )
        .unwrap();

    let task = json(ledger.evaluate(&Invocation::new("org.ttdata.assettask:ReadTask", &["Task-3"])).unwrap());
    assert_eq!(task["Owner"], "Worker 2");
    assert_eq!(task["Done"], false);

    let all = json(ledger.evaluate(&Invocation::new("org.ttdata.assettask:GetAllTasks", &[])).unwrap());
    assert_eq!(all.as_array().map(Vec::len), Some(3));

    let err = ledger.evaluate(&Invocation::new("ReadTask", &["Task-3"])).unwrap_err();
    assert!(matches!(err, CoreError::UnknownFunction(_)));
}

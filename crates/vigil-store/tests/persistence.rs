//! Persist-and-rehydrate tests: a run record travels through the
//! serialization engine, into the store, and back out intact.

use serde_json::json;
use vigil_core::{FixedClock, RunId};
use vigil_run::{
    AwsSetupDetails, CloudInstanceDetails, CloudNodesInfo, CloudResource, CloudSetup,
    PackageVersion, ResourceState, TestDetails, TestLogs, TestResources, TestResourcesSetup,
    TestResults, TestRunInfo, TestStatus,
};
use vigil_schema::{decode, encode, Persisted};
use vigil_store::{KeySpec, MemoryStore, RunStore, SortOrder, StoreError};

static RUN_KEYS: KeySpec = KeySpec {
    partition: &["id"],
    clustering: &[],
};

fn sample_run() -> TestRunInfo {
    let mut details = TestDetails::new(
        "773413dead",
        "k0machi",
        "https://notarealjob.url/jobs/vigil-test/vigil/vigil-testing",
        chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
        240,
        vec!["tests/config.yaml".to_string()],
        vec![PackageVersion::new("scylla-db", "4.4", "20210901", "deadbeef", "")],
    );
    details.set_end_time(&FixedClock::at(1_600_003_600));

    let node_group = |image: &str, amount| CloudNodesInfo::new(image, "spot", amount, "terminate");
    let setup = TestResourcesSetup::new(
        CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 7734),
        vec!["us-east-1".to_string()],
        CloudSetup::Aws(AwsSetupDetails::new(
            node_group("ami-abcdef99", 3),
            node_group("ami-deadbeef", 1),
            node_group("ami-abdcef60", 1),
        )),
    );

    let mut logs = TestLogs::new();
    logs.add_log("syslog", "https://backups.example.com/logz-abcdef331.tar.gz");

    let mut resources = TestResources::new();
    resources
        .attach_resource(CloudResource::new(
            "vigil-testing_spot_1",
            ResourceState::Running,
            "db-node",
            CloudInstanceDetails::new("54.2.1.8", "10.10.10.1", "us-east-1", "aws", 7734),
        ))
        .unwrap();

    let mut results = TestResults::new(TestStatus::Created);
    results.add_event("ERROR", "Something went wrong...");
    results.set_status(TestStatus::Failed);

    TestRunInfo::new(RunId::generate(), details, setup, logs, resources, results)
}

#[test]
fn schema_sync_accepts_the_run_key() {
    let store = MemoryStore::new();
    store
        .sync_schema(TestRunInfo::schema(), &RUN_KEYS)
        .unwrap();
}

#[test]
fn schema_sync_rejects_an_undescribed_key_column() {
    let store = MemoryStore::new();
    let bad_keys = KeySpec {
        partition: &["id"],
        clustering: &[("timer", SortOrder::Descending)],
    };

    let err = store
        .sync_schema(TestRunInfo::schema(), &bad_keys)
        .unwrap_err();
    assert_eq!(err, StoreError::UnknownKeyColumn { column: "timer" });
}

#[test]
fn stored_run_rehydrates_identically() {
    let store = MemoryStore::new();
    store
        .sync_schema(TestRunInfo::schema(), &RUN_KEYS)
        .unwrap();

    let run = sample_run();
    let doc = encode(&run).unwrap();
    store.put_run(run.id, doc).unwrap();

    let stored = store.get_run(&run.id).unwrap().unwrap();
    let rehydrated: TestRunInfo = decode(&stored).unwrap();
    assert_eq!(rehydrated, run);
}

#[test]
fn stored_document_is_keyed_by_the_id_column() {
    let store = MemoryStore::new();
    let run = sample_run();
    let doc = encode(&run).unwrap();

    assert_eq!(doc["id"], json!(run.id.to_string()));
    store.put_run(run.id, doc).unwrap();
    assert_eq!(store.get_run(&RunId::generate()).unwrap(), None);
}

//! End-to-end document tests for a complete run record.
//!
//! These build a full `TestRunInfo` the way a test harness would, verify
//! the literal document shapes, and check the whole aggregate round
//! trips through encode and decode.

use serde_json::json;
use vigil_core::{FixedClock, RunId};
use vigil_run::{
    AwsSetupDetails, CloudInstanceDetails, CloudNodesInfo, CloudResource, CloudSetup,
    EventsBySeverity, NemesisRunInfo, NemesisStatus, NodeDescription, PackageVersion,
    ResourceState, TestDetails, TestLogs, TestResources, TestResourcesSetup, TestResults,
    TestRunInfo, TestStatus,
};
use vigil_schema::{decode, encode, Persisted, SchemaError};

fn runner_host() -> CloudInstanceDetails {
    CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 7734)
}

fn preset_setup() -> TestResourcesSetup {
    TestResourcesSetup::new(
        runner_host(),
        vec!["us-east-1".to_string()],
        CloudSetup::Aws(AwsSetupDetails::new(
            CloudNodesInfo::new("ami-abcdef99", "spot", 6, "keep-on-failure"),
            CloudNodesInfo::new("ami-deadbeef", "spot", 2, "terminate"),
            CloudNodesInfo::new("ami-abdcef60", "spot", 1, "keep-on-failure"),
        )),
    )
}

fn completed_run() -> TestRunInfo {
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

    let mut logs = TestLogs::new();
    logs.add_log("syslog", "https://backups.example.com/logz-abcdef331.tar.gz");

    let mut resources = TestResources::new();
    for number in 1..=3 {
        let instance = CloudInstanceDetails::new(
            format!("54.2.1.{number}"),
            "10.10.10.1",
            "us-east-1",
            "aws",
            7734,
        )
        .with_shards_amount(8);
        resources
            .attach_resource(CloudResource::new(
                format!("vigil-testing_spot_{number}"),
                ResourceState::Running,
                "db-node",
                instance,
            ))
            .unwrap();
    }
    resources
        .detach_resource("vigil-testing_spot_2", "Test reason", &FixedClock::at(7_800))
        .unwrap();

    let mut nemesis_runs = Vec::new();
    for (index, class_name) in ["SisyphusMonkey", "ChaosMonkey", "NotVeryCoolMonkey"]
        .iter()
        .enumerate()
    {
        let target = &resources.allocated_resources[index];
        let node = NodeDescription::new(
            target.name.clone(),
            target.instance_info.public_ip.clone(),
            10,
        );
        let mut nemesis = NemesisRunInfo::new(
            *class_name,
            "disrupt_something",
            42,
            node,
            NemesisStatus::Running,
            16_000,
        );
        nemesis.complete("", &FixedClock::at(16_030));
        nemesis_runs.push(nemesis);
    }

    let mut results = TestResults::new(TestStatus::Created);
    results.events.push(EventsBySeverity {
        severity: "INFO".to_string(),
        event_amount: 66_000,
        last_events: vec!["Nothing here after all".to_string()],
    });
    for nemesis in nemesis_runs {
        results.add_nemesis(nemesis);
    }
    results.add_screenshot("https://example.com/screenshot.jpg");
    results.set_status(TestStatus::Passed);

    TestRunInfo::new(
        RunId::generate(),
        details,
        preset_setup(),
        logs,
        resources,
        results,
    )
}

#[test]
fn setup_document_matches_the_expected_shape() {
    let doc = encode(&preset_setup()).unwrap();
    assert_eq!(
        doc,
        json!({
            "sct_runner_host": {
                "public_ip": "1.1.1.1",
                "region": "us-east-1",
                "provider": "aws",
                "private_ip": "10.10.10.1",
                "creation_time": 7734,
                "termination_time": 0,
                "termination_reason": "",
                "shards_amount": 0,
            },
            "region_name": ["us-east-1"],
            "cloud_setup": {
                "backend": "aws",
                "db_node": {
                    "image_id": "ami-abcdef99",
                    "instance_type": "spot",
                    "node_amount": 6,
                    "post_behaviour": "keep-on-failure",
                },
                "loader_node": {
                    "image_id": "ami-deadbeef",
                    "instance_type": "spot",
                    "node_amount": 2,
                    "post_behaviour": "terminate",
                },
                "monitor_node": {
                    "image_id": "ami-abdcef60",
                    "instance_type": "spot",
                    "node_amount": 1,
                    "post_behaviour": "keep-on-failure",
                },
            },
        })
    );
}

#[test]
fn completed_run_round_trips() {
    let run = completed_run();
    let doc = encode(&run).unwrap();
    let back: TestRunInfo = decode(&doc).unwrap();
    assert_eq!(back, run);
}

#[test]
fn completed_run_document_details() {
    let run = completed_run();
    let doc = encode(&run).unwrap();

    assert_eq!(doc["details"]["end_time"], json!(1_600_003_600));
    assert_eq!(
        doc["logs"]["logs"],
        json!([["syslog", "https://backups.example.com/logz-abcdef331.tar.gz"]])
    );
    assert_eq!(doc["results"]["status"], json!("passed"));

    let allocated = doc["resources"]["allocated_resources"].as_array().unwrap();
    assert_eq!(allocated.len(), 3);
    assert_eq!(allocated[1]["state"], json!("terminated"));
    assert_eq!(
        allocated[1]["instance_info"]["termination_reason"],
        json!("Test reason")
    );
    assert_eq!(allocated[0]["state"], json!("running"));

    for nemesis in doc["results"]["nemesis_data"].as_array().unwrap() {
        assert_eq!(nemesis["status"], json!("succeeded"));
        assert_eq!(nemesis["end_time"], json!(16_030));
    }
}

#[test]
fn decoding_tolerates_future_keys_everywhere() {
    let run = completed_run();
    let mut doc = encode(&run).unwrap();
    doc["deployment_tier"] = json!("staging");
    doc["details"]["added_later"] = json!({"nested": [1, 2, 3]});

    let back: TestRunInfo = decode(&doc).unwrap();
    assert_eq!(back, run);
}

#[test]
fn decoding_a_corrupt_status_names_the_field() {
    let run = completed_run();
    let mut doc = encode(&run).unwrap();
    doc["results"]["status"] = json!("exploded");

    let err = decode::<TestRunInfo>(&doc).unwrap_err();
    assert_eq!(
        err,
        SchemaError::TypeMismatch {
            field: "status".to_string(),
            expected: "test status".to_string(),
            got: "\"exploded\"".to_string(),
        }
    );
}

#[test]
fn schema_tables_describe_every_field() {
    let schema = TestDetails::schema();
    assert_eq!(schema.entity, "test_details");
    assert!(schema.column("packages").is_some());
    assert!(schema.column("end_time").is_some());
    assert!(schema.column("nonexistent").is_none());

    assert_eq!(TestRunInfo::schema().columns.len(), 6);
}

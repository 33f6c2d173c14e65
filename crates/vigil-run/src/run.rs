//! Run record entities and the top-level aggregate.
//!
//! A [`TestRunInfo`] is created once at run start, mutated throughout the
//! run by the single owning test process, and persisted (and later
//! rehydrated) as one document. The five entities it binds each own their
//! fields and the small state transitions that mutate them; this module
//! provides no internal locking, so an application sharing one record
//! across threads must supply its own mutual exclusion.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use vigil_core::{Clock, RunId};
use vigil_schema::{
    encode, encode_list, encode_poly, pairs_value, timestamp_value, Column, CollectionHint,
    Constraint, FieldReader, Persisted, Result as SchemaResult, ScalarKind, Schema, SchemaError,
    WireEnum,
};

use crate::cloud::{CloudInstanceDetails, CloudResource, CloudSetup};
use crate::error::{Result, RunError};
use crate::types::{EventsBySeverity, NemesisRunInfo, PackageVersion, TestStatus};

/// Static facts about the test: where it came from and when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDetails {
    /// Source revision the test ran against.
    pub scm_revision_id: String,
    /// Who or what triggered the run.
    pub started_by: String,
    /// Address of the CI job that executed the run.
    pub build_job_url: String,
    /// Start instant of the run.
    pub start_time: DateTime<Utc>,
    /// Duration requested by the test configuration, in seconds.
    pub yaml_test_duration: i64,
    /// Configuration files the run was launched with.
    pub config_files: Vec<String>,
    /// Packages under test and their versions.
    pub packages: Vec<PackageVersion>,
    /// End instant of the run; stays at the epoch origin until the run
    /// is explicitly closed.
    pub end_time: DateTime<Utc>,
}

static TEST_DETAILS_SCHEMA: Schema = Schema {
    entity: "test_details",
    columns: &[
        Column::text("scm_revision_id"),
        Column::text("started_by"),
        Column::text("build_job_url"),
        Column::timestamp("start_time"),
        Column::integer("yaml_test_duration").with_constraints(&[Constraint::NonNegative]),
        Column::collection("config_files", CollectionHint::scalar(ScalarKind::Text)),
        Column::collection("packages", CollectionHint::entity(PackageVersion::ENTITY)),
        Column::timestamp("end_time"),
    ],
};

impl TestDetails {
    /// Create the details record for a run that is starting now.
    #[must_use]
    pub fn new(
        scm_revision_id: impl Into<String>,
        started_by: impl Into<String>,
        build_job_url: impl Into<String>,
        start_time: DateTime<Utc>,
        yaml_test_duration: i64,
        config_files: Vec<String>,
        packages: Vec<PackageVersion>,
    ) -> Self {
        Self {
            scm_revision_id: scm_revision_id.into(),
            started_by: started_by.into(),
            build_job_url: build_job_url.into(),
            start_time,
            yaml_test_duration,
            config_files,
            packages,
            end_time: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Stamp the end of the run.
    pub fn set_end_time(&mut self, clock: &dyn Clock) {
        self.end_time = clock.now();
        tracing::info!(end_time = self.end_time.timestamp(), "Closed test run");
    }
}

impl Persisted for TestDetails {
    const ENTITY: &'static str = "test_details";

    fn schema() -> &'static Schema {
        &TEST_DETAILS_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert(
            "scm_revision_id".into(),
            Value::from(self.scm_revision_id.clone()),
        );
        fields.insert("started_by".into(), Value::from(self.started_by.clone()));
        fields.insert(
            "build_job_url".into(),
            Value::from(self.build_job_url.clone()),
        );
        fields.insert("start_time".into(), timestamp_value(self.start_time));
        fields.insert(
            "yaml_test_duration".into(),
            Value::from(self.yaml_test_duration),
        );
        fields.insert("config_files".into(), Value::from(self.config_files.clone()));
        fields.insert("packages".into(), encode_list(&self.packages)?);
        fields.insert("end_time".into(), timestamp_value(self.end_time));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            scm_revision_id: fields.text("scm_revision_id")?,
            started_by: fields.text("started_by")?,
            build_job_url: fields.text("build_job_url")?,
            start_time: fields.timestamp("start_time")?,
            yaml_test_duration: fields.integer("yaml_test_duration")?,
            config_files: fields.texts("config_files")?,
            packages: fields.entities("packages")?,
            end_time: fields.timestamp("end_time")?,
        })
    }
}

/// What the run asked the cloud for, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResourcesSetup {
    /// The instance driving the test.
    pub sct_runner_host: CloudInstanceDetails,
    /// Regions the run provisions into.
    pub region_name: Vec<String>,
    /// Provider-specific node group requests.
    pub cloud_setup: CloudSetup,
}

static TEST_RESOURCES_SETUP_SCHEMA: Schema = Schema {
    entity: "test_resources_setup",
    columns: &[
        Column::entity("sct_runner_host", CloudInstanceDetails::ENTITY),
        Column::collection("region_name", CollectionHint::scalar(ScalarKind::Text)),
        Column::entity("cloud_setup", "cloud_setup"),
    ],
};

impl TestResourcesSetup {
    /// Create the setup record.
    #[must_use]
    pub fn new(
        sct_runner_host: CloudInstanceDetails,
        region_name: Vec<String>,
        cloud_setup: CloudSetup,
    ) -> Self {
        Self {
            sct_runner_host,
            region_name,
            cloud_setup,
        }
    }
}

impl Persisted for TestResourcesSetup {
    const ENTITY: &'static str = "test_resources_setup";

    fn schema() -> &'static Schema {
        &TEST_RESOURCES_SETUP_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("sct_runner_host".into(), encode(&self.sct_runner_host)?);
        fields.insert("region_name".into(), Value::from(self.region_name.clone()));
        fields.insert("cloud_setup".into(), encode_poly(&self.cloud_setup)?);
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            sct_runner_host: fields.entity("sct_runner_host")?,
            region_name: fields.texts("region_name")?,
            cloud_setup: fields.poly("cloud_setup")?,
        })
    }
}

/// Log artifacts collected during the run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestLogs {
    /// `(log_type, log_url)` pairs, in collection order.
    pub logs: Vec<(String, String)>,
}

static TEST_LOGS_SCHEMA: Schema = Schema {
    entity: "test_logs",
    columns: &[Column::collection(
        "logs",
        CollectionHint::tuple(&[ScalarKind::Text, ScalarKind::Text]),
    )],
};

impl TestLogs {
    /// Create an empty log collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one collected log artifact.
    pub fn add_log(&mut self, log_type: impl Into<String>, log_url: impl Into<String>) {
        let log_type = log_type.into();
        let log_url = log_url.into();
        tracing::debug!(log_type = %log_type, log_url = %log_url, "Collected log");
        self.logs.push((log_type, log_url));
    }
}

impl Persisted for TestLogs {
    const ENTITY: &'static str = "test_logs";

    fn schema() -> &'static Schema {
        &TEST_LOGS_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("logs".into(), pairs_value(&self.logs));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            logs: fields.string_pairs("logs")?,
        })
    }
}

/// Resources the run has allocated, kept as an append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestResources {
    /// Every resource ever attached to the run, including terminated
    /// ones.
    pub allocated_resources: Vec<CloudResource>,
}

static TEST_RESOURCES_SCHEMA: Schema = Schema {
    entity: "test_resources",
    columns: &[Column::collection(
        "allocated_resources",
        CollectionHint::entity(CloudResource::ENTITY),
    )],
};

impl TestResources {
    /// Create an empty resource collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a newly allocated resource.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::DuplicateResource`] if a resource with the
    /// same name is already attached.
    pub fn attach_resource(&mut self, resource: CloudResource) -> Result<()> {
        if self
            .allocated_resources
            .iter()
            .any(|attached| attached.name == resource.name)
        {
            return Err(RunError::DuplicateResource(resource.name));
        }

        tracing::info!(
            name = %resource.name,
            resource_type = %resource.resource_type,
            "Attached resource"
        );
        self.allocated_resources.push(resource);
        Ok(())
    }

    /// Detach the named resource: stamp its termination time and reason
    /// and transition it to terminated.
    ///
    /// The resource stays in the allocated list; detaching is a status
    /// transition, not a removal.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ResourceNotFound`] if no attached resource
    /// carries `name`.
    pub fn detach_resource(&mut self, name: &str, reason: &str, clock: &dyn Clock) -> Result<()> {
        let resource = self
            .allocated_resources
            .iter_mut()
            .find(|attached| attached.name == name)
            .ok_or_else(|| RunError::ResourceNotFound(name.to_string()))?;

        resource.terminate(reason, clock.now());
        tracing::info!(name = %name, reason = %reason, "Detached resource");
        Ok(())
    }
}

impl Persisted for TestResources {
    const ENTITY: &'static str = "test_resources";

    fn schema() -> &'static Schema {
        &TEST_RESOURCES_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert(
            "allocated_resources".into(),
            encode_list(&self.allocated_resources)?,
        );
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            allocated_resources: fields.entities("allocated_resources")?,
        })
    }
}

/// Outcome of the run: status, aggregated events, nemesis runs, and
/// captured screenshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResults {
    /// Overall run status, assigned explicitly by the owning caller.
    pub status: TestStatus,
    /// Event counts and trailing messages, one bucket per severity.
    pub events: Vec<EventsBySeverity>,
    /// Every nemesis run executed against the cluster.
    pub nemesis_data: Vec<NemesisRunInfo>,
    /// Screenshot URLs captured during the run.
    pub screenshots: Vec<String>,
}

static TEST_RESULTS_SCHEMA: Schema = Schema {
    entity: "test_results",
    columns: &[
        Column::text("status").with_constraints(&[Constraint::OneOf(TestStatus::WIRE_NAMES)]),
        Column::collection("events", CollectionHint::entity(EventsBySeverity::ENTITY)),
        Column::collection(
            "nemesis_data",
            CollectionHint::entity(NemesisRunInfo::ENTITY),
        ),
        Column::collection("screenshots", CollectionHint::scalar(ScalarKind::Text)),
    ],
};

impl TestResults {
    /// Create an empty results record with the given initial status.
    #[must_use]
    pub fn new(status: TestStatus) -> Self {
        Self {
            status,
            events: Vec::new(),
            nemesis_data: Vec::new(),
            screenshots: Vec::new(),
        }
    }

    /// Count one event, bucketed by severity.
    ///
    /// The severity's bucket is created on first use; afterwards its
    /// count grows and its trailing message window advances.
    pub fn add_event(&mut self, severity: &str, message: &str) {
        tracing::debug!(severity = %severity, "Recorded event");
        if let Some(bucket) = self
            .events
            .iter_mut()
            .find(|bucket| bucket.severity == severity)
        {
            bucket.record(message);
        } else {
            let mut bucket = EventsBySeverity::new(severity);
            bucket.record(message);
            self.events.push(bucket);
        }
    }

    /// Record a nemesis run.
    pub fn add_nemesis(&mut self, nemesis: NemesisRunInfo) {
        tracing::info!(
            nemesis = %nemesis.name,
            status = nemesis.status.as_wire(),
            "Recorded nemesis run"
        );
        self.nemesis_data.push(nemesis);
    }

    /// Record a captured screenshot.
    pub fn add_screenshot(&mut self, url: impl Into<String>) {
        self.screenshots.push(url.into());
    }

    /// Assign the overall run status.
    pub fn set_status(&mut self, status: TestStatus) {
        tracing::info!(
            from = self.status.as_wire(),
            to = status.as_wire(),
            "Test status changed"
        );
        self.status = status;
    }
}

impl Persisted for TestResults {
    const ENTITY: &'static str = "test_results";

    fn schema() -> &'static Schema {
        &TEST_RESULTS_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("status".into(), Value::from(self.status.as_wire()));
        fields.insert("events".into(), encode_list(&self.events)?);
        fields.insert("nemesis_data".into(), encode_list(&self.nemesis_data)?);
        fields.insert("screenshots".into(), Value::from(self.screenshots.clone()));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            status: fields.wire_enum("status")?,
            events: fields.entities("events")?,
            nemesis_data: fields.entities("nemesis_data")?,
            screenshots: fields.texts("screenshots")?,
        })
    }
}

/// The complete record of one test run.
///
/// Created once at run start with an externally supplied identity,
/// mutated through its entities' operations, and persisted as a single
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunInfo {
    /// Stable identity of the run.
    pub id: RunId,
    /// Static facts about the test.
    pub details: TestDetails,
    /// What the run asked the cloud for.
    pub setup: TestResourcesSetup,
    /// Collected log artifacts.
    pub logs: TestLogs,
    /// Allocated resources.
    pub resources: TestResources,
    /// Outcome, events, and nemesis runs.
    pub results: TestResults,
}

static TEST_RUN_INFO_SCHEMA: Schema = Schema {
    entity: "test_run_info",
    columns: &[
        Column::text("id").with_constraints(&[Constraint::NotEmpty]),
        Column::entity("details", TestDetails::ENTITY),
        Column::entity("setup", TestResourcesSetup::ENTITY),
        Column::entity("logs", TestLogs::ENTITY),
        Column::entity("resources", TestResources::ENTITY),
        Column::entity("results", TestResults::ENTITY),
    ],
};

impl TestRunInfo {
    /// Bind the five entities into one run record.
    #[must_use]
    pub fn new(
        id: RunId,
        details: TestDetails,
        setup: TestResourcesSetup,
        logs: TestLogs,
        resources: TestResources,
        results: TestResults,
    ) -> Self {
        Self {
            id,
            details,
            setup,
            logs,
            resources,
            results,
        }
    }
}

impl Persisted for TestRunInfo {
    const ENTITY: &'static str = "test_run_info";

    fn schema() -> &'static Schema {
        &TEST_RUN_INFO_SCHEMA
    }

    fn encode_fields(&self) -> SchemaResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::from(self.id.to_string()));
        fields.insert("details".into(), encode(&self.details)?);
        fields.insert("setup".into(), encode(&self.setup)?);
        fields.insert("logs".into(), encode(&self.logs)?);
        fields.insert("resources".into(), encode(&self.resources)?);
        fields.insert("results".into(), encode(&self.results)?);
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> SchemaResult<Self> {
        let id_text = fields.text("id")?;
        let id = RunId::parse(&id_text).map_err(|_| SchemaError::TypeMismatch {
            field: "id".to_string(),
            expected: "run id".to_string(),
            got: format!("{id_text:?}"),
        })?;

        Ok(Self {
            id,
            details: fields.entity("details")?,
            setup: fields.entity("setup")?,
            logs: fields.entity("logs")?,
            resources: fields.entity("resources")?,
            results: fields.entity("results")?,
        })
    }
}

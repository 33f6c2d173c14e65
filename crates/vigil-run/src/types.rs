//! Statuses, value objects, and nemesis records.
//!
//! These are the leaf shapes embedded inside run entities: closed status
//! enumerations with lowercase wire names, immutable value objects, and
//! the nemesis run record with its completion transition.

use serde_json::{Map, Value};
use vigil_core::Clock;
use vigil_schema::{
    encode, Column, ColumnDefault, CollectionHint, Constraint, FieldReader, Persisted, Result,
    ScalarKind, Schema, WireEnum,
};

/// Overall outcome of a test run.
///
/// The owning test process assigns the status explicitly as the run
/// progresses: Created, then Running, then one of the terminal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    /// The run record exists but the test has not started.
    Created,
    /// The test is executing.
    Running,
    /// The test finished and met its acceptance criteria.
    Passed,
    /// The test finished and did not meet its acceptance criteria.
    Failed,
    /// The run was cut short by an operator or the harness.
    Aborted,
    /// The harness itself failed.
    Error,
}

impl TestStatus {
    /// Wire names accepted for this enumeration.
    pub const WIRE_NAMES: &'static [&'static str] =
        &["created", "running", "passed", "failed", "aborted", "error"];

    /// Whether this status is a terminal outcome.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::Aborted | Self::Error
        )
    }
}

impl WireEnum for TestStatus {
    const EXPECTED: &'static str = "test status";

    fn as_wire(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Error => "error",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "aborted" => Some(Self::Aborted),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Outcome of a single nemesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NemesisStatus {
    /// The nemesis is still disrupting its target.
    Running,
    /// The nemesis completed without an error.
    Succeeded,
    /// The nemesis completed with an error.
    Failed,
}

impl NemesisStatus {
    /// Wire names accepted for this enumeration.
    pub const WIRE_NAMES: &'static [&'static str] = &["running", "succeeded", "failed"];
}

impl WireEnum for NemesisStatus {
    const EXPECTED: &'static str = "nemesis status";

    fn as_wire(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Version descriptor of one software package involved in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    /// Package name.
    pub name: String,
    /// Released version string.
    pub version: String,
    /// Build date string, as reported by the packaging system.
    pub date: String,
    /// Source revision the package was built from.
    pub revision_id: String,
    /// Build identifier, empty when the packaging system reports none.
    pub build_id: String,
}

static PACKAGE_VERSION_SCHEMA: Schema = Schema {
    entity: "package_version",
    columns: &[
        Column::text("name").with_constraints(&[Constraint::NotEmpty]),
        Column::text("version"),
        Column::text("date"),
        Column::text("revision_id"),
        Column::text("build_id"),
    ],
};

impl PackageVersion {
    /// Create a package version descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        date: impl Into<String>,
        revision_id: impl Into<String>,
        build_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            date: date.into(),
            revision_id: revision_id.into(),
            build_id: build_id.into(),
        }
    }
}

impl Persisted for PackageVersion {
    const ENTITY: &'static str = "package_version";

    fn schema() -> &'static Schema {
        &PACKAGE_VERSION_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("version".into(), Value::from(self.version.clone()));
        fields.insert("date".into(), Value::from(self.date.clone()));
        fields.insert("revision_id".into(), Value::from(self.revision_id.clone()));
        fields.insert("build_id".into(), Value::from(self.build_id.clone()));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.text("name")?,
            version: fields.text("version")?,
            date: fields.text("date")?,
            revision_id: fields.text("revision_id")?,
            build_id: fields.text("build_id")?,
        })
    }
}

/// A point-in-time reference to a node a nemesis targeted.
///
/// This is a snapshot, not an ownership link: the referenced resource may
/// be detached later without invalidating the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescription {
    /// Node name.
    pub name: String,
    /// Address the node was reachable at.
    pub ip: String,
    /// Shard count the node carried.
    pub shards: i64,
}

static NODE_DESCRIPTION_SCHEMA: Schema = Schema {
    entity: "node_description",
    columns: &[
        Column::text("name"),
        Column::text("ip"),
        Column::integer("shards").with_constraints(&[Constraint::NonNegative]),
    ],
};

impl NodeDescription {
    /// Create a node description.
    #[must_use]
    pub fn new(name: impl Into<String>, ip: impl Into<String>, shards: i64) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            shards,
        }
    }
}

impl Persisted for NodeDescription {
    const ENTITY: &'static str = "node_description";

    fn schema() -> &'static Schema {
        &NODE_DESCRIPTION_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("ip".into(), Value::from(self.ip.clone()));
        fields.insert("shards".into(), Value::from(self.shards));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.text("name")?,
            ip: fields.text("ip")?,
            shards: fields.integer("shards")?,
        })
    }
}

/// Aggregated events of one severity.
///
/// The total count is unbounded; only a trailing window of messages is
/// retained. Severity is a free-form label preserved verbatim, not a
/// closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsBySeverity {
    /// Severity label, e.g. `"ERROR"`.
    pub severity: String,
    /// Total number of events seen at this severity.
    pub event_amount: i64,
    /// Most recent event messages, oldest first.
    pub last_events: Vec<String>,
}

static EVENTS_BY_SEVERITY_SCHEMA: Schema = Schema {
    entity: "events_by_severity",
    columns: &[
        Column::text("severity").with_constraints(&[Constraint::NotEmpty]),
        Column::integer("event_amount").with_constraints(&[Constraint::NonNegative]),
        Column::collection("last_events", CollectionHint::scalar(ScalarKind::Text)),
    ],
};

impl EventsBySeverity {
    /// Number of trailing event messages retained per severity.
    pub const WINDOW: usize = 100;

    /// Create an empty bucket for the given severity.
    #[must_use]
    pub fn new(severity: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            event_amount: 0,
            last_events: Vec::new(),
        }
    }

    /// Count one event and retain its message in the trailing window.
    ///
    /// Once the window is full the oldest retained message is evicted;
    /// the count keeps growing regardless.
    pub fn record(&mut self, message: impl Into<String>) {
        self.event_amount += 1;
        self.last_events.push(message.into());
        if self.last_events.len() > Self::WINDOW {
            self.last_events.remove(0);
        }
    }
}

impl Persisted for EventsBySeverity {
    const ENTITY: &'static str = "events_by_severity";

    fn schema() -> &'static Schema {
        &EVENTS_BY_SEVERITY_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("severity".into(), Value::from(self.severity.clone()));
        fields.insert("event_amount".into(), Value::from(self.event_amount));
        fields.insert("last_events".into(), Value::from(self.last_events.clone()));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            severity: fields.text("severity")?,
            event_amount: fields.integer("event_amount")?,
            last_events: fields.texts("last_events")?,
        })
    }
}

/// One injected-failure (nemesis) run and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NemesisRunInfo {
    /// Nemesis class that produced the disruption.
    pub class_name: String,
    /// Name of the disruption performed.
    pub name: String,
    /// Planned duration of the disruption, in seconds.
    pub duration: i64,
    /// The node the disruption targeted.
    pub target_node: NodeDescription,
    /// Current status of the run.
    pub status: NemesisStatus,
    /// Start instant, seconds past the epoch.
    pub start_time: i64,
    /// End instant, seconds past the epoch; unset until completed.
    pub end_time: Option<i64>,
    /// Stack trace of the failure, empty for successful runs.
    pub stack_trace: String,
}

static NEMESIS_RUN_INFO_SCHEMA: Schema = Schema {
    entity: "nemesis_run_info",
    columns: &[
        Column::text("class_name"),
        Column::text("name"),
        Column::integer("duration"),
        Column::entity("target_node", NodeDescription::ENTITY),
        Column::text("status").with_constraints(&[Constraint::OneOf(NemesisStatus::WIRE_NAMES)]),
        Column::integer("start_time"),
        Column::integer("end_time").with_default(ColumnDefault::Null),
        Column::text("stack_trace"),
    ],
};

impl NemesisRunInfo {
    /// Create a nemesis run record with the supplied initial status.
    #[must_use]
    pub fn new(
        class_name: impl Into<String>,
        name: impl Into<String>,
        duration: i64,
        target_node: NodeDescription,
        status: NemesisStatus,
        start_time: i64,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            duration,
            target_node,
            status,
            start_time,
            end_time: None,
            stack_trace: String::new(),
        }
    }

    /// Complete the run, stamping its end time.
    ///
    /// A non-empty `message` records the failure and marks the run
    /// failed; an empty message marks it succeeded. Completion always
    /// overwrites any previously assigned status, and there is no
    /// transition out of a completed run.
    pub fn complete(&mut self, message: &str, clock: &dyn Clock) {
        self.end_time = Some(clock.now().timestamp());
        self.stack_trace = message.to_string();
        self.status = if message.is_empty() {
            NemesisStatus::Succeeded
        } else {
            NemesisStatus::Failed
        };
        tracing::info!(
            nemesis = %self.name,
            status = self.status.as_wire(),
            "Completed nemesis run"
        );
    }
}

impl Persisted for NemesisRunInfo {
    const ENTITY: &'static str = "nemesis_run_info";

    fn schema() -> &'static Schema {
        &NEMESIS_RUN_INFO_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("class_name".into(), Value::from(self.class_name.clone()));
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("duration".into(), Value::from(self.duration));
        fields.insert("target_node".into(), encode(&self.target_node)?);
        fields.insert("status".into(), Value::from(self.status.as_wire()));
        fields.insert("start_time".into(), Value::from(self.start_time));
        fields.insert(
            "end_time".into(),
            self.end_time.map_or(Value::Null, Value::from),
        );
        fields.insert("stack_trace".into(), Value::from(self.stack_trace.clone()));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            class_name: fields.text("class_name")?,
            name: fields.text("name")?,
            duration: fields.integer("duration")?,
            target_node: fields.entity("target_node")?,
            status: fields.wire_enum("status")?,
            start_time: fields.integer("start_time")?,
            end_time: fields.optional_integer("end_time")?,
            stack_trace: fields.text("stack_trace")?,
        })
    }
}

//! Cloud provisioning shapes: instances, node groups, provider setups,
//! and allocated resources.
//!
//! The provider-specific setup is a tagged union discriminated by the
//! `backend` field, so decoding dispatches on the tag instead of
//! open-ended subtype inspection.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use vigil_schema::{
    decode, encode, Column, Constraint, FieldReader, Persisted, Polymorphic, Result, Schema,
    SchemaError, WireEnum,
};

/// Lifecycle state of an allocated cloud resource.
///
/// The machine is one-way: a running resource can be terminated, and a
/// terminated resource never runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// The resource is provisioned and in use.
    Running,
    /// The resource has been released.
    Terminated,
}

impl ResourceState {
    /// Wire names accepted for this enumeration.
    pub const WIRE_NAMES: &'static [&'static str] = &["running", "terminated"];
}

impl WireEnum for ResourceState {
    const EXPECTED: &'static str = "resource state";

    fn as_wire(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Terminated => "terminated",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }
}

/// Details of one provisioned cloud instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudInstanceDetails {
    /// Public address of the instance.
    pub public_ip: String,
    /// Private address of the instance.
    pub private_ip: String,
    /// Region the instance was provisioned in.
    pub region: String,
    /// Cloud provider name.
    pub provider: String,
    /// Creation instant, seconds past the epoch.
    pub creation_time: i64,
    /// Termination instant, seconds past the epoch; zero while running.
    pub termination_time: i64,
    /// Reason the instance was terminated, empty while running.
    pub termination_reason: String,
    /// Number of shards the instance carries.
    pub shards_amount: i64,
}

static CLOUD_INSTANCE_DETAILS_SCHEMA: Schema = Schema {
    entity: "cloud_instance_details",
    columns: &[
        Column::text("public_ip"),
        Column::text("private_ip"),
        Column::text("region"),
        Column::text("provider"),
        Column::integer("creation_time"),
        Column::integer("termination_time"),
        Column::text("termination_reason"),
        Column::integer("shards_amount").with_constraints(&[Constraint::NonNegative]),
    ],
};

impl CloudInstanceDetails {
    /// Create instance details for a freshly provisioned instance.
    ///
    /// Termination fields start zeroed and the shard count starts at
    /// zero; use [`CloudInstanceDetails::with_shards_amount`] when the
    /// count is known at creation.
    #[must_use]
    pub fn new(
        public_ip: impl Into<String>,
        private_ip: impl Into<String>,
        region: impl Into<String>,
        provider: impl Into<String>,
        creation_time: i64,
    ) -> Self {
        Self {
            public_ip: public_ip.into(),
            private_ip: private_ip.into(),
            region: region.into(),
            provider: provider.into(),
            creation_time,
            termination_time: 0,
            termination_reason: String::new(),
            shards_amount: 0,
        }
    }

    /// Set the shard count.
    #[must_use]
    pub fn with_shards_amount(mut self, shards_amount: i64) -> Self {
        self.shards_amount = shards_amount;
        self
    }
}

impl Persisted for CloudInstanceDetails {
    const ENTITY: &'static str = "cloud_instance_details";

    fn schema() -> &'static Schema {
        &CLOUD_INSTANCE_DETAILS_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("public_ip".into(), Value::from(self.public_ip.clone()));
        fields.insert("private_ip".into(), Value::from(self.private_ip.clone()));
        fields.insert("region".into(), Value::from(self.region.clone()));
        fields.insert("provider".into(), Value::from(self.provider.clone()));
        fields.insert("creation_time".into(), Value::from(self.creation_time));
        fields.insert(
            "termination_time".into(),
            Value::from(self.termination_time),
        );
        fields.insert(
            "termination_reason".into(),
            Value::from(self.termination_reason.clone()),
        );
        fields.insert("shards_amount".into(), Value::from(self.shards_amount));
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            public_ip: fields.text("public_ip")?,
            private_ip: fields.text("private_ip")?,
            region: fields.text("region")?,
            provider: fields.text("provider")?,
            creation_time: fields.integer("creation_time")?,
            termination_time: fields.integer("termination_time")?,
            termination_reason: fields.text("termination_reason")?,
            shards_amount: fields.integer("shards_amount")?,
        })
    }
}

/// A homogeneous group of nodes to provision for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudNodesInfo {
    /// Machine image the nodes boot from.
    pub image_id: String,
    /// Instance type requested for the group.
    pub instance_type: String,
    /// Number of nodes in the group.
    pub node_amount: i64,
    /// What happens to the nodes when the run ends.
    pub post_behaviour: String,
}

static CLOUD_NODES_INFO_SCHEMA: Schema = Schema {
    entity: "cloud_nodes_info",
    columns: &[
        Column::text("image_id"),
        Column::text("instance_type"),
        Column::integer("node_amount").with_constraints(&[Constraint::NonNegative]),
        Column::text("post_behaviour"),
    ],
};

impl CloudNodesInfo {
    /// Create a node group description.
    #[must_use]
    pub fn new(
        image_id: impl Into<String>,
        instance_type: impl Into<String>,
        node_amount: i64,
        post_behaviour: impl Into<String>,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            instance_type: instance_type.into(),
            node_amount,
            post_behaviour: post_behaviour.into(),
        }
    }
}

impl Persisted for CloudNodesInfo {
    const ENTITY: &'static str = "cloud_nodes_info";

    fn schema() -> &'static Schema {
        &CLOUD_NODES_INFO_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("image_id".into(), Value::from(self.image_id.clone()));
        fields.insert(
            "instance_type".into(),
            Value::from(self.instance_type.clone()),
        );
        fields.insert("node_amount".into(), Value::from(self.node_amount));
        fields.insert(
            "post_behaviour".into(),
            Value::from(self.post_behaviour.clone()),
        );
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            image_id: fields.text("image_id")?,
            instance_type: fields.text("instance_type")?,
            node_amount: fields.integer("node_amount")?,
            post_behaviour: fields.text("post_behaviour")?,
        })
    }
}

/// AWS node groups for the three provisioned roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSetupDetails {
    /// Database node group.
    pub db_node: CloudNodesInfo,
    /// Load-generator node group.
    pub loader_node: CloudNodesInfo,
    /// Monitoring node group.
    pub monitor_node: CloudNodesInfo,
}

static AWS_SETUP_DETAILS_SCHEMA: Schema = Schema {
    entity: "aws_setup_details",
    columns: &[
        Column::entity("db_node", CloudNodesInfo::ENTITY),
        Column::entity("loader_node", CloudNodesInfo::ENTITY),
        Column::entity("monitor_node", CloudNodesInfo::ENTITY),
    ],
};

impl AwsSetupDetails {
    /// Create an AWS setup from its three role groups.
    #[must_use]
    pub fn new(
        db_node: CloudNodesInfo,
        loader_node: CloudNodesInfo,
        monitor_node: CloudNodesInfo,
    ) -> Self {
        Self {
            db_node,
            loader_node,
            monitor_node,
        }
    }
}

impl Persisted for AwsSetupDetails {
    const ENTITY: &'static str = "aws_setup_details";

    fn schema() -> &'static Schema {
        &AWS_SETUP_DETAILS_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("db_node".into(), encode(&self.db_node)?);
        fields.insert("loader_node".into(), encode(&self.loader_node)?);
        fields.insert("monitor_node".into(), encode(&self.monitor_node)?);
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            db_node: fields.entity("db_node")?,
            loader_node: fields.entity("loader_node")?,
            monitor_node: fields.entity("monitor_node")?,
        })
    }
}

/// GCE node groups for the three provisioned roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GceSetupDetails {
    /// Database node group.
    pub db_node: CloudNodesInfo,
    /// Load-generator node group.
    pub loader_node: CloudNodesInfo,
    /// Monitoring node group.
    pub monitor_node: CloudNodesInfo,
}

static GCE_SETUP_DETAILS_SCHEMA: Schema = Schema {
    entity: "gce_setup_details",
    columns: &[
        Column::entity("db_node", CloudNodesInfo::ENTITY),
        Column::entity("loader_node", CloudNodesInfo::ENTITY),
        Column::entity("monitor_node", CloudNodesInfo::ENTITY),
    ],
};

impl GceSetupDetails {
    /// Create a GCE setup from its three role groups.
    #[must_use]
    pub fn new(
        db_node: CloudNodesInfo,
        loader_node: CloudNodesInfo,
        monitor_node: CloudNodesInfo,
    ) -> Self {
        Self {
            db_node,
            loader_node,
            monitor_node,
        }
    }
}

impl Persisted for GceSetupDetails {
    const ENTITY: &'static str = "gce_setup_details";

    fn schema() -> &'static Schema {
        &GCE_SETUP_DETAILS_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("db_node".into(), encode(&self.db_node)?);
        fields.insert("loader_node".into(), encode(&self.loader_node)?);
        fields.insert("monitor_node".into(), encode(&self.monitor_node)?);
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            db_node: fields.entity("db_node")?,
            loader_node: fields.entity("loader_node")?,
            monitor_node: fields.entity("monitor_node")?,
        })
    }
}

/// Provider-specific cloud setup, discriminated by the `backend` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudSetup {
    /// Amazon Web Services.
    Aws(AwsSetupDetails),
    /// Google Compute Engine.
    Gce(GceSetupDetails),
}

impl Polymorphic for CloudSetup {
    const DISCRIMINATOR: &'static str = "backend";

    fn variant_tag(&self) -> &'static str {
        match self {
            Self::Aws(_) => "aws",
            Self::Gce(_) => "gce",
        }
    }

    fn encode_variant(&self) -> Result<Value> {
        match self {
            Self::Aws(setup) => encode(setup),
            Self::Gce(setup) => encode(setup),
        }
    }

    fn decode_variant(tag: &str, doc: &Value) -> Result<Self> {
        match tag {
            "aws" => decode(doc).map(Self::Aws),
            "gce" => decode(doc).map(Self::Gce),
            other => Err(SchemaError::UnsupportedVariant {
                field: Self::DISCRIMINATOR,
                variant: other.to_string(),
            }),
        }
    }
}

/// One allocated cloud resource tracked by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudResource {
    /// Resource name, unique among the run's attached resources.
    pub name: String,
    /// Current lifecycle state.
    pub state: ResourceState,
    /// Kind of resource, e.g. `"db-node"`.
    pub resource_type: String,
    /// The backing cloud instance.
    pub instance_info: CloudInstanceDetails,
}

static CLOUD_RESOURCE_SCHEMA: Schema = Schema {
    entity: "cloud_resource",
    columns: &[
        Column::text("name").with_constraints(&[Constraint::NotEmpty]),
        Column::text("state").with_constraints(&[Constraint::OneOf(ResourceState::WIRE_NAMES)]),
        Column::text("resource_type"),
        Column::entity("instance_info", CloudInstanceDetails::ENTITY),
    ],
};

impl CloudResource {
    /// Create a resource record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        state: ResourceState,
        resource_type: impl Into<String>,
        instance_info: CloudInstanceDetails,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            resource_type: resource_type.into(),
            instance_info,
        }
    }

    /// Terminate the resource, stamping the termination time and reason.
    ///
    /// This is the only state transition a resource has; there is no way
    /// back to running.
    pub fn terminate(&mut self, reason: &str, at: DateTime<Utc>) {
        self.instance_info.termination_time = at.timestamp();
        self.instance_info.termination_reason = reason.to_string();
        self.state = ResourceState::Terminated;
    }
}

impl Persisted for CloudResource {
    const ENTITY: &'static str = "cloud_resource";

    fn schema() -> &'static Schema {
        &CLOUD_RESOURCE_SCHEMA
    }

    fn encode_fields(&self) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("state".into(), Value::from(self.state.as_wire()));
        fields.insert(
            "resource_type".into(),
            Value::from(self.resource_type.clone()),
        );
        fields.insert("instance_info".into(), encode(&self.instance_info)?);
        Ok(fields)
    }

    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.text("name")?,
            state: fields.wire_enum("state")?,
            resource_type: fields.text("resource_type")?,
            instance_info: fields.entity("instance_info")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_schema::{decode_poly, encode_poly};

    fn node_group(image_id: &str, amount: i64, post_behaviour: &str) -> CloudNodesInfo {
        CloudNodesInfo::new(image_id, "spot", amount, post_behaviour)
    }

    fn aws_setup() -> CloudSetup {
        CloudSetup::Aws(AwsSetupDetails::new(
            node_group("ami-abcdef99", 6, "keep-on-failure"),
            node_group("ami-deadbeef", 2, "terminate"),
            node_group("ami-abdcef60", 1, "keep-on-failure"),
        ))
    }

    #[test]
    fn setup_document_carries_backend_discriminator() {
        let doc = encode_poly(&aws_setup()).unwrap();
        assert_eq!(doc["backend"], json!("aws"));
        assert_eq!(
            doc["db_node"],
            json!({
                "image_id": "ami-abcdef99",
                "instance_type": "spot",
                "node_amount": 6,
                "post_behaviour": "keep-on-failure",
            })
        );
    }

    #[test]
    fn setup_round_trip_both_backends() {
        for setup in [
            aws_setup(),
            CloudSetup::Gce(GceSetupDetails::new(
                node_group("debian-11", 3, "terminate"),
                node_group("debian-11", 1, "terminate"),
                node_group("debian-11", 1, "keep-on-failure"),
            )),
        ] {
            let doc = encode_poly(&setup).unwrap();
            let back: CloudSetup = decode_poly(&doc).unwrap();
            assert_eq!(back, setup);
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut doc = encode_poly(&aws_setup()).unwrap();
        doc["backend"] = json!("azure");

        let err = decode_poly::<CloudSetup>(&doc).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedVariant {
                field: "backend",
                variant: "azure".to_string(),
            }
        );
    }

    #[test]
    fn terminate_stamps_the_instance() {
        let instance =
            CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 7734);
        let mut resource =
            CloudResource::new("example_resource", ResourceState::Running, "db-node", instance);

        resource.terminate(
            "Test reason",
            chrono::DateTime::from_timestamp(10_000, 0).unwrap(),
        );

        assert_eq!(resource.state, ResourceState::Terminated);
        assert_eq!(resource.instance_info.termination_time, 10_000);
        assert_eq!(resource.instance_info.termination_reason, "Test reason");
    }

    #[test]
    fn resource_document_shape() {
        let instance = CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 7734)
            .with_shards_amount(10);
        let resource =
            CloudResource::new("example_resource", ResourceState::Running, "example_type", instance);

        let doc = encode(&resource).unwrap();
        assert_eq!(
            doc,
            json!({
                "name": "example_resource",
                "state": "running",
                "resource_type": "example_type",
                "instance_info": {
                    "public_ip": "1.1.1.1",
                    "region": "us-east-1",
                    "provider": "aws",
                    "private_ip": "10.10.10.1",
                    "creation_time": 7734,
                    "termination_time": 0,
                    "termination_reason": "",
                    "shards_amount": 10,
                },
            })
        );

        let back: CloudResource = decode(&doc).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn empty_resource_name_fails_validation() {
        let instance = CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 0);
        let resource = CloudResource::new("", ResourceState::Running, "db-node", instance);

        let err = encode(&resource).unwrap_err();
        assert!(matches!(err, SchemaError::Validation { field, .. } if field == "name"));
    }
}

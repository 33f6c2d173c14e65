//! Test run records for vigil.
//!
//! This crate models the lifecycle of one automated test run: its
//! configuration, provisioned cloud resources, log artifacts, aggregated
//! events, injected-failure (nemesis) runs, and outcome. The top-level
//! [`TestRunInfo`] aggregate binds five entities into one persisted unit;
//! every entity carries a static schema table, so the whole record
//! encodes to (and decodes from) a primitive document through
//! `vigil-schema`.
//!
//! # Example
//!
//! ```
//! use vigil_core::FixedClock;
//! use vigil_run::{CloudInstanceDetails, CloudResource, ResourceState, TestResources};
//!
//! let mut resources = TestResources::new();
//! let instance = CloudInstanceDetails::new("1.1.1.1", "10.10.10.1", "us-east-1", "aws", 7734);
//! let node = CloudResource::new("db-node-1", ResourceState::Running, "db-node", instance);
//!
//! resources.attach_resource(node).unwrap();
//! resources
//!     .detach_resource("db-node-1", "run finished", &FixedClock::at(8000))
//!     .unwrap();
//!
//! let detached = &resources.allocated_resources[0];
//! assert_eq!(detached.state, ResourceState::Terminated);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cloud;
pub mod error;
pub mod run;
pub mod types;

pub use cloud::{
    AwsSetupDetails, CloudInstanceDetails, CloudNodesInfo, CloudResource, CloudSetup,
    GceSetupDetails, ResourceState,
};
pub use error::{Result, RunError};
pub use run::{
    TestDetails, TestLogs, TestResources, TestResourcesSetup, TestResults, TestRunInfo,
};
pub use types::{
    EventsBySeverity, NemesisRunInfo, NemesisStatus, NodeDescription, PackageVersion, TestStatus,
};

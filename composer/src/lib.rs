//! Compose the resource graph for a load-balanced container cluster.
//!
//! Given an [AppClusterSpec], the composer declares every resource required to run a
//! containerized web application behind a public load balancer with a fleet of compute
//! instances: a security group, a load balancer, a container and task definition, a
//! cluster, a service role, an instance role (and profile), a service, a launch
//! configuration, and an autoscaling group.
//!
//! Nothing is provisioned here. Each resource is recorded in a [graph::Graph] as a
//! declaration with a deterministic name and explicit dependency edges. A provisioning
//! engine is expected to walk [graph::Graph::waves] and create each resource once,
//! using the derived name as its idempotency key.
//!
//! # Topology
//!
//! ```txt
//!   security group ──┬──────────────► load balancer ──┐
//!                    │                                 │
//!   container ─► task definition ─────────────────────┤
//!                                                      ▼
//!   cluster ───────────────────────────────────────► service ◄── service role
//!      │
//!      └─(name)─► launch configuration ◄── instance profile ◄── instance role
//!                        │
//!                        ▼
//!                 autoscaling group
//! ```
//!
//! # Example
//!
//! ```rust
//! use appcluster_composer::{AppCluster, AppClusterSpec, Network, Region};
//!
//! let spec = AppClusterSpec {
//!     name: "foo".into(),
//!     region: Region::UsEast1,
//!     network: Network {
//!         vpc: "vpc-1".into(),
//!         public_subnets: vec!["subnet-a".into()],
//!         private_subnets: vec!["subnet-b".into()],
//!     },
//!     container_image: "img:1".into(),
//!     container_memory: None,
//!     container_managed_policies: vec![],
//!     container_log_group_name: "lg".into(),
//!     scaling: Default::default(),
//!     image_id: None,
//! };
//! let app = AppCluster::new(&spec).unwrap();
//! assert_eq!(app.graph.name(app.cluster), Some("foo-cluster"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod balancer;
pub mod composer;
pub use composer::{compose, AppCluster, Outputs};
pub mod config;
pub use config::{AppClusterSpec, Network, Region, ScalingBounds};
pub mod graph;
pub mod identity;
pub mod scaling;
pub mod security;
pub mod service;
pub mod template;
pub mod workload;

/// Port the application listens on (and is exposed through the load balancer).
pub const HTTP_PORT: u16 = 80;

/// Network protocol used by rules, listeners, and health checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Http,
}

impl Protocol {
    /// Returns the upper-case representation used in health check targets.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Http => "HTTP",
        }
    }
}

/// Errors that can occur while composing an app cluster.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("no machine image known for region {0}")]
    UnknownImage(Region),
    #[error("template error: {0}")]
    Template(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

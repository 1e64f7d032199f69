//! Launch configuration and autoscaling group providing the cluster's compute capacity.

use crate::{
    graph::{Declare, Handle},
    identity::{self, InstanceProfile, Role},
    security::SecurityGroup,
    template, Error, Region, ScalingBounds,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Instance class launched into the group.
pub const INSTANCE_TYPE: &str = "t2.micro";

/// Seconds between scaling activities.
pub const COOLDOWN: u32 = 300;

/// Boot script registering each instance with the cluster.
pub const BOOTSTRAP_TEMPLATE: &str = r#"#!/bin/bash
echo ECS_CLUSTER={{ cluster }} >> /etc/ecs/ecs.config
"#;

/// Container-optimized machine images by region.
const CONTAINER_IMAGES: &[(Region, &str)] = &[
    (Region::UsEast1, "ami-aff65ad2"),
    (Region::UsEast2, "ami-64300001"),
    (Region::UsWest1, "ami-69677709"),
    (Region::UsWest2, "ami-40ddb938"),
    (Region::CaCentral1, "ami-897ff9ed"),
    (Region::SaEast1, "ami-4a7e2826"),
    (Region::EuWest1, "ami-2d386654"),
    (Region::EuWest2, "ami-2218f945"),
    (Region::EuWest3, "ami-250eb858"),
    (Region::EuCentral1, "ami-9fc39c74"),
    (Region::ApSouth1, "ami-72edc81d"),
    (Region::ApNortheast1, "ami-a99d8ad5"),
    (Region::ApNortheast2, "ami-9d56f9f3"),
    (Region::ApSoutheast1, "ami-846144f8"),
    (Region::ApSoutheast2, "ami-efda148d"),
];

/// Source of scaling-group health checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HealthCheckType {
    #[serde(rename = "EC2")]
    Instance,
    #[serde(rename = "ELB")]
    LoadBalancer,
}

/// Lookup of the machine image to launch, keyed by region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageCatalog {
    images: BTreeMap<Region, String>,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self {
            images: CONTAINER_IMAGES
                .iter()
                .map(|(region, image)| (*region, image.to_string()))
                .collect(),
        }
    }
}

impl ImageCatalog {
    /// Create a catalog from explicit entries.
    pub fn new(images: BTreeMap<Region, String>) -> Self {
        Self { images }
    }

    /// Resolve the image for `region`, preferring `image_override` when provided.
    pub fn resolve(&self, region: Region, image_override: Option<&str>) -> Result<String, Error> {
        if let Some(image) = image_override {
            return Ok(image.to_string());
        }
        self.images
            .get(&region)
            .cloned()
            .ok_or(Error::UnknownImage(region))
    }
}

/// Template for instances launched by the group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LaunchConfiguration {
    pub image_id: String,
    pub instance_type: String,
    pub security_groups: Vec<Handle<SecurityGroup>>,
    pub instance_profile: Handle<InstanceProfile>,
    pub user_data: String,
}

/// Supervisor maintaining the fleet of compute instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AutoScalingGroup {
    pub launch_configuration: Handle<LaunchConfiguration>,
    pub subnets: Vec<String>,
    pub min_size: u32,
    pub max_size: u32,
    pub default_cooldown: u32,
    pub health_check_type: HealthCheckType,

    /// Classic load balancers attached to the group (none, load balancing is handled by the
    /// service).
    pub load_balancers: Vec<String>,
}

/// Machine image and boot script of the launch configuration, resolved before anything is
/// declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launch {
    pub image_id: String,
    pub user_data: String,
}

impl Launch {
    /// Resolve the image for `region` and render the boot script for `cluster_name`.
    pub fn prepare(
        images: &ImageCatalog,
        region: Region,
        image_override: Option<&str>,
        cluster_name: &str,
    ) -> Result<Self, Error> {
        let image_id = images.resolve(region, image_override)?;
        debug!(image = image_id.as_str(), %region, "resolved machine image");
        Ok(Self {
            image_id,
            user_data: bootstrap_script(cluster_name)?,
        })
    }
}

/// Inputs of [build].
pub struct Config<'a> {
    pub name: &'a str,
    pub launch: Launch,
    pub security_group: Handle<SecurityGroup>,
    pub instance_role: Handle<Role>,
    pub subnets: &'a [String],
    pub bounds: ScalingBounds,
}

/// Render the boot script registering an instance with `cluster_name`.
pub fn bootstrap_script(cluster_name: &str) -> Result<String, Error> {
    let variables = BTreeMap::from([("cluster", cluster_name.to_string())]);
    template::render(BOOTSTRAP_TEMPLATE, &variables)
}

/// Declare the instance profile, launch configuration, and autoscaling group.
pub fn build<D: Declare>(graph: &mut D, config: Config<'_>) -> Handle<AutoScalingGroup> {
    if config.bounds.min == config.bounds.max {
        warn!(
            name = config.name,
            size = config.bounds.min,
            "autoscaling group has fixed capacity and will not scale"
        );
    }

    let instance_profile = identity::instance_profile(graph, config.name, config.instance_role);
    let launch_configuration = graph.declare(
        format!("{}-launch-config", config.name),
        LaunchConfiguration {
            image_id: config.launch.image_id,
            instance_type: INSTANCE_TYPE.to_string(),
            security_groups: vec![config.security_group],
            instance_profile,
            user_data: config.launch.user_data,
        },
        &[config.security_group.id(), instance_profile.id()],
    );
    graph.declare(
        format!("{}-asg", config.name),
        AutoScalingGroup {
            launch_configuration,
            subnets: config.subnets.to_vec(),
            min_size: config.bounds.min,
            max_size: config.bounds.max,
            default_cooldown: COOLDOWN,
            health_check_type: HealthCheckType::Instance,
            load_balancers: Vec::new(),
        },
        &[launch_configuration.id()],
    )
}

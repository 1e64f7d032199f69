//! Cluster and the managed service running the task behind the load balancer.

use crate::{
    balancer::LoadBalancer,
    graph::{Declare, Handle},
    identity::Role,
    workload::TaskDefinition,
};
use serde::Serialize;

/// Number of tasks the service keeps running.
pub const DESIRED_COUNT: u32 = 1;

/// Capacity bounds honored while the service replaces tasks.
pub const DEPLOYMENT: DeploymentPolicy = DeploymentPolicy {
    minimum_healthy_percent: 60,
    maximum_percent: 150,
};

/// Logical grouping of the compute capacity that runs tasks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Cluster {}

/// Percentages of the desired count that must (and may) run during a deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentPolicy {
    pub minimum_healthy_percent: u32,
    pub maximum_percent: u32,
}

/// Registration of a container port with a load balancer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadBalancerBinding {
    pub load_balancer: Handle<LoadBalancer>,
    pub container_name: String,
    pub container_port: u16,
}

/// Supervisor keeping the task running and registered with the load balancer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Service {
    pub cluster: Handle<Cluster>,
    pub task_definition: Handle<TaskDefinition>,
    pub role: Handle<Role>,
    pub desired_count: u32,
    pub deployment: DeploymentPolicy,
    pub load_balancers: Vec<LoadBalancerBinding>,
}

/// Returns the name of the cluster declared for `name`.
pub fn cluster_name(name: &str) -> String {
    format!("{name}-cluster")
}

/// Declare the cluster for `name`.
pub fn cluster<D: Declare>(graph: &mut D, name: &str) -> Handle<Cluster> {
    graph.declare(cluster_name(name), Cluster::default(), &[])
}

/// Declare the service for `name`.
///
/// The cluster, task definition, role, and load balancer must already be declared.
pub fn service<D: Declare>(
    graph: &mut D,
    name: &str,
    cluster: Handle<Cluster>,
    task_definition: Handle<TaskDefinition>,
    role: Handle<Role>,
    binding: LoadBalancerBinding,
) -> Handle<Service> {
    let dependencies = [
        cluster.id(),
        task_definition.id(),
        role.id(),
        binding.load_balancer.id(),
    ];
    graph.declare(
        format!("{name}-service"),
        Service {
            cluster,
            task_definition,
            role,
            desired_count: DESIRED_COUNT,
            deployment: DEPLOYMENT,
            load_balancers: vec![binding],
        },
        &dependencies,
    )
}

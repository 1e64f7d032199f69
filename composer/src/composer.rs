//! Compose every resource of an app cluster in dependency order.

use crate::{
    balancer,
    graph::{Declaration, Declare, Graph, Handle},
    identity,
    scaling::{self, AutoScalingGroup, ImageCatalog, Launch},
    security,
    service::{self, Cluster, LoadBalancerBinding, Service},
    workload, AppClusterSpec, Error, HTTP_PORT,
};
use tracing::info;

/// Handles returned by [compose].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outputs {
    pub cluster: Handle<Cluster>,
    pub service: Handle<Service>,
    pub asg: Handle<AutoScalingGroup>,
}

/// Declare every resource described by `spec` into `graph`.
///
/// The spec is validated, the machine image resolved, and the boot script rendered before the
/// first declaration, so on error nothing has been declared.
///
/// Resources are declared in dependency order: security group, load balancer, workload
/// definitions, cluster, roles, service, and finally compute scaling.
pub fn compose<D: Declare>(
    spec: &AppClusterSpec,
    images: &ImageCatalog,
    graph: &mut D,
) -> Result<Outputs, Error> {
    spec.validate()?;
    let name = spec.name.as_str();
    let cluster_name = service::cluster_name(name);
    let launch = Launch::prepare(images, spec.region, spec.image_id.as_deref(), &cluster_name)?;
    info!(name, region = %spec.region, "composing app cluster");

    // Front door
    let security_group = security::build(graph, name, &spec.network.vpc);
    let load_balancer =
        balancer::build(graph, name, &spec.network.public_subnets, security_group);

    // Workload
    let (_, task_definition) = workload::build(
        graph,
        name,
        &spec.container_image,
        spec.container_memory,
        &spec.container_log_group_name,
        spec.region,
    );
    let cluster = service::cluster(graph, name);
    let (service_role, instance_role) =
        identity::build(graph, name, &spec.container_managed_policies);
    let binding = LoadBalancerBinding {
        load_balancer,
        container_name: workload::container_name(name),
        container_port: HTTP_PORT,
    };
    let service = service::service(graph, name, cluster, task_definition, service_role, binding);

    // Compute
    let asg = scaling::build(
        graph,
        scaling::Config {
            name,
            launch,
            security_group,
            instance_role,
            subnets: &spec.network.private_subnets,
            bounds: spec.scaling,
        },
    );
    info!(name, cluster = cluster_name.as_str(), "composed app cluster");

    Ok(Outputs {
        cluster,
        service,
        asg,
    })
}

/// Resources of a composed app cluster.
///
/// Every resource other than the cluster, services, and autoscaling group is reachable through
/// the dependencies recorded in `graph`.
#[derive(Clone, Debug)]
pub struct AppCluster {
    pub cluster: Handle<Cluster>,
    pub services: Vec<Handle<Service>>,
    pub asg: Handle<AutoScalingGroup>,
    pub graph: Graph,
}

impl AppCluster {
    /// Compose `spec` using the default [ImageCatalog].
    pub fn new(spec: &AppClusterSpec) -> Result<Self, Error> {
        Self::with_images(spec, &ImageCatalog::default())
    }

    /// Compose `spec`, resolving machine images from `images`.
    pub fn with_images(spec: &AppClusterSpec, images: &ImageCatalog) -> Result<Self, Error> {
        let mut graph = Graph::new();
        let outputs = compose(spec, images, &mut graph)?;
        Ok(Self {
            cluster: outputs.cluster,
            services: vec![outputs.service],
            asg: outputs.asg,
            graph,
        })
    }

    /// Serialize every declaration as YAML.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(&self.graph)?)
    }

    /// Serialize every declaration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.graph)?)
    }

    /// Returns each declaration paired with the creation wave it belongs to, wave by wave.
    pub fn plan(&self) -> Vec<(usize, &Declaration)> {
        self.graph
            .waves()
            .into_iter()
            .enumerate()
            .flat_map(|(wave, ids)| {
                ids.into_iter()
                    .filter_map(move |id| self.graph.declaration(id).map(|d| (wave, d)))
            })
            .collect()
    }
}

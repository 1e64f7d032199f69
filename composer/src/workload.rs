//! Container and task definitions for the application.

use crate::{
    graph::{Declare, Handle},
    Protocol, Region, HTTP_PORT,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Memory limit (in MiB) applied when the spec does not provide one.
pub const DEFAULT_CONTAINER_MEMORY: u32 = 256;

/// Log driver forwarding container output to the platform's log service.
pub const LOG_DRIVER: &str = "awslogs";

/// Port exposed by a container and the host port it is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: Protocol,
}

/// Destination of container logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogConfiguration {
    pub driver: String,
    pub options: BTreeMap<String, String>,
}

/// Single container run by the task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContainerDefinition {
    pub image: String,
    pub memory: u32,
    pub port_mappings: Vec<PortMapping>,
    pub log_configuration: LogConfiguration,
}

/// Template for the task run by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskDefinition {
    pub family: String,
    pub region: Region,
    pub container_definitions: Vec<Handle<ContainerDefinition>>,
}

/// Returns the name of the container declared for `name`.
pub fn container_name(name: &str) -> String {
    format!("{name}-container")
}

/// Declare the container definition for `name` and the task definition that owns it.
pub fn build<D: Declare>(
    graph: &mut D,
    name: &str,
    image: &str,
    memory: Option<u32>,
    log_group: &str,
    region: Region,
) -> (Handle<ContainerDefinition>, Handle<TaskDefinition>) {
    let options = BTreeMap::from([
        ("awslogs-group".to_string(), log_group.to_string()),
        ("awslogs-region".to_string(), region.to_string()),
    ]);
    let container = graph.declare(
        container_name(name),
        ContainerDefinition {
            image: image.to_string(),
            memory: memory.unwrap_or(DEFAULT_CONTAINER_MEMORY),
            port_mappings: vec![PortMapping {
                container_port: HTTP_PORT,
                host_port: HTTP_PORT,
                protocol: Protocol::Tcp,
            }],
            log_configuration: LogConfiguration {
                driver: LOG_DRIVER.to_string(),
                options,
            },
        },
        &[],
    );
    let family = format!("{name}-task");
    let task = graph.declare(
        family.clone(),
        TaskDefinition {
            family,
            region,
            container_definitions: vec![container],
        },
        &[container.id()],
    );
    (container, task)
}

//! Public load balancer fronting the service.

use crate::{
    graph::{Declare, Handle},
    security::SecurityGroup,
    Protocol, HTTP_PORT,
};
use serde::Serialize;

/// Health check applied to every registered target.
pub const HEALTH_CHECK: HealthCheck = HealthCheck {
    protocol: Protocol::Tcp,
    port: HTTP_PORT,
    interval: 15,
    timeout: 3,
    unhealthy_threshold: 3,
    healthy_threshold: 3,
};

/// Whether a load balancer is reachable from the internet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    InternetFacing,
    Internal,
}

/// Port forwarding rule of a load balancer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Listener {
    pub protocol: Protocol,
    pub port: u16,
    pub instance_protocol: Protocol,
    pub instance_port: u16,
}

/// Periodic probe of registered targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub protocol: Protocol,
    pub port: u16,

    /// Seconds between probes.
    pub interval: u32,

    /// Seconds before a probe is considered failed.
    pub timeout: u32,
    pub unhealthy_threshold: u32,
    pub healthy_threshold: u32,
}

impl HealthCheck {
    /// Returns the probe target (e.g. `TCP:80`).
    pub fn target(&self) -> String {
        format!("{}:{}", self.protocol.as_str(), self.port)
    }
}

/// Load balancer distributing traffic across the service's tasks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadBalancer {
    pub scheme: Scheme,
    pub subnets: Vec<String>,
    pub security_groups: Vec<Handle<SecurityGroup>>,
    pub listeners: Vec<Listener>,
    pub health_check: HealthCheck,
}

/// Declare the internet-facing load balancer for `name` in `subnets`.
pub fn build<D: Declare>(
    graph: &mut D,
    name: &str,
    subnets: &[String],
    security_group: Handle<SecurityGroup>,
) -> Handle<LoadBalancer> {
    let listener = Listener {
        protocol: Protocol::Http,
        port: HTTP_PORT,
        instance_protocol: Protocol::Http,
        instance_port: HTTP_PORT,
    };
    graph.declare(
        format!("{name}-web"),
        LoadBalancer {
            scheme: Scheme::InternetFacing,
            subnets: subnets.to_vec(),
            security_groups: vec![security_group],
            listeners: vec![listener],
            health_check: HEALTH_CHECK,
        },
        &[security_group.id()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::Graph, security};

    #[test]
    fn test_build() {
        let mut graph = Graph::new();
        let sg = security::build(&mut graph, "foo", "vpc-1");
        let subnets = vec!["subnet-a".to_string(), "subnet-b".to_string()];
        let lb = build(&mut graph, "foo", &subnets, sg);
        assert_eq!(graph.name(lb), Some("foo-web"));
        assert_eq!(graph.declaration(lb.id()).unwrap().dependencies, vec![sg.id()]);

        let lb = graph.get(lb).unwrap();
        assert_eq!(lb.scheme, Scheme::InternetFacing);
        assert_eq!(lb.subnets, subnets);
        assert_eq!(lb.security_groups, vec![sg]);
        assert_eq!(lb.listeners.len(), 1);
        assert_eq!(lb.listeners[0].port, 80);
        assert_eq!(lb.listeners[0].instance_port, 80);
        assert_eq!(lb.listeners[0].protocol, Protocol::Http);
    }

    #[test]
    fn test_health_check_is_fixed() {
        let mut graph = Graph::new();
        let sg = security::build(&mut graph, "bar", "vpc-2");
        let lb = build(&mut graph, "bar", &["subnet-z".to_string()], sg);
        let health_check = graph.get(lb).unwrap().health_check;
        assert_eq!(health_check.protocol, Protocol::Tcp);
        assert_eq!(health_check.port, 80);
        assert_eq!(health_check.interval, 15);
        assert_eq!(health_check.timeout, 3);
        assert_eq!(health_check.unhealthy_threshold, 3);
        assert_eq!(health_check.healthy_threshold, 3);
        assert_eq!(health_check.target(), "TCP:80");
    }
}

//! Roles assumed by the service scheduler and by compute instances.

use crate::graph::{Declare, Handle};
use serde::Serialize;
use serde_json::{json, Value};

/// Principal of the container orchestration service.
pub const SERVICE_PRINCIPAL: &str = "ecs.amazonaws.com";

/// Principal of the compute instance service.
pub const INSTANCE_PRINCIPAL: &str = "ec2.amazonaws.com";

/// Managed policy allowing the scheduler to register tasks with the load balancer.
pub const SERVICE_ROLE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonEC2ContainerServiceRole";

/// Managed policy allowing instances to join a cluster. Always first on the instance role.
pub const INSTANCE_ROLE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonEC2ContainerServiceforEC2Role";

/// Identity with a trust policy and a list of managed policies.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Role {
    pub assume_role_policy: Value,

    /// Managed policies, in attachment order.
    pub managed_policy_arns: Vec<String>,
}

impl Role {
    /// Returns the service principal trusted by this role.
    pub fn principal(&self) -> Option<&str> {
        self.assume_role_policy["Statement"][0]["Principal"]["Service"].as_str()
    }
}

/// Wrapper allowing compute instances to assume a role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceProfile {
    pub role: Handle<Role>,
}

/// Trust policy allowing `principal` to assume a role.
fn assume_role_policy(principal: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": principal
                },
                "Action": "sts:AssumeRole"
            }
        ]
    })
}

/// Declare the service role and the instance role for `name`.
///
/// The instance role attaches [INSTANCE_ROLE_POLICY] first, followed by each of
/// `extra_policies` in the order provided.
pub fn build<D: Declare>(
    graph: &mut D,
    name: &str,
    extra_policies: &[String],
) -> (Handle<Role>, Handle<Role>) {
    let service_role = graph.declare(
        format!("{name}-service-role"),
        Role {
            assume_role_policy: assume_role_policy(SERVICE_PRINCIPAL),
            managed_policy_arns: vec![SERVICE_ROLE_POLICY.to_string()],
        },
        &[],
    );
    let managed_policy_arns = std::iter::once(INSTANCE_ROLE_POLICY.to_string())
        .chain(extra_policies.iter().cloned())
        .collect();
    let instance_role = graph.declare(
        format!("{name}-instance-role"),
        Role {
            assume_role_policy: assume_role_policy(INSTANCE_PRINCIPAL),
            managed_policy_arns,
        },
        &[],
    );
    (service_role, instance_role)
}

/// Declare the instance profile wrapping `instance_role`.
pub fn instance_profile<D: Declare>(
    graph: &mut D,
    name: &str,
    instance_role: Handle<Role>,
) -> Handle<InstanceProfile> {
    graph.declare(
        format!("{name}-instance-profile"),
        InstanceProfile {
            role: instance_role,
        },
        &[instance_role.id()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn test_trust_policies() {
        let mut graph = Graph::new();
        let (service_role, instance_role) = build(&mut graph, "foo", &[]);
        assert_eq!(graph.name(service_role), Some("foo-service-role"));
        assert_eq!(graph.name(instance_role), Some("foo-instance-role"));

        let service_role = graph.get(service_role).unwrap();
        assert_eq!(service_role.principal(), Some("ecs.amazonaws.com"));
        assert_eq!(service_role.managed_policy_arns, vec![SERVICE_ROLE_POLICY]);
        assert_eq!(
            service_role.assume_role_policy["Statement"][0]["Action"],
            "sts:AssumeRole"
        );

        let instance_role = graph.get(instance_role).unwrap();
        assert_eq!(instance_role.principal(), Some("ec2.amazonaws.com"));
    }

    #[test]
    fn test_instance_policies_base_first() {
        let mut graph = Graph::new();
        let (_, role) = build(&mut graph, "foo", &[]);
        assert_eq!(
            graph.get(role).unwrap().managed_policy_arns,
            vec![INSTANCE_ROLE_POLICY]
        );

        let mut graph = Graph::new();
        let extra = vec!["p2".to_string(), "p1".to_string(), "p3".to_string()];
        let (_, role) = build(&mut graph, "foo", &extra);
        assert_eq!(
            graph.get(role).unwrap().managed_policy_arns,
            vec![INSTANCE_ROLE_POLICY, "p2", "p1", "p3"]
        );
    }

    #[test]
    fn test_instance_profile() {
        let mut graph = Graph::new();
        let (_, role) = build(&mut graph, "foo", &[]);
        let profile = instance_profile(&mut graph, "foo", role);
        assert_eq!(graph.name(profile), Some("foo-instance-profile"));
        assert_eq!(graph.get(profile).unwrap().role, role);
        assert_eq!(
            graph.declaration(profile.id()).unwrap().dependencies,
            vec![role.id()]
        );
    }
}

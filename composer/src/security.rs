//! Security group guarding the compute tier.

use crate::{
    graph::{Declare, Handle},
    Protocol, HTTP_PORT,
};
use serde::Serialize;

/// CIDR block matching any IPv4 address.
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// Inbound traffic allowed by a security group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngressRule {
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr_blocks: Vec<String>,
}

/// Security group scoped to a VPC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecurityGroup {
    pub vpc: String,
    pub ingress: Vec<IngressRule>,
}

/// Declare the security group for `name`, allowing inbound HTTP from anywhere.
pub fn build<D: Declare>(graph: &mut D, name: &str, vpc: &str) -> Handle<SecurityGroup> {
    let ingress = IngressRule {
        protocol: Protocol::Tcp,
        from_port: HTTP_PORT,
        to_port: HTTP_PORT,
        cidr_blocks: vec![ANY_IPV4.to_string()],
    };
    graph.declare(
        format!("{name}-sg"),
        SecurityGroup {
            vpc: vpc.to_string(),
            ingress: vec![ingress],
        },
        &[],
    )
}

//! Input configuration for the composer.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, fs::File, path::Path};

/// Region in which every resource of the app cluster is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "us-east-1")]
    UsEast1,
    #[serde(rename = "us-east-2")]
    UsEast2,
    #[serde(rename = "us-west-1")]
    UsWest1,
    #[serde(rename = "us-west-2")]
    UsWest2,
    #[serde(rename = "ca-central-1")]
    CaCentral1,
    #[serde(rename = "sa-east-1")]
    SaEast1,
    #[serde(rename = "eu-west-1")]
    EuWest1,
    #[serde(rename = "eu-west-2")]
    EuWest2,
    #[serde(rename = "eu-west-3")]
    EuWest3,
    #[serde(rename = "eu-central-1")]
    EuCentral1,
    #[serde(rename = "ap-south-1")]
    ApSouth1,
    #[serde(rename = "ap-northeast-1")]
    ApNortheast1,
    #[serde(rename = "ap-northeast-2")]
    ApNortheast2,
    #[serde(rename = "ap-southeast-1")]
    ApSoutheast1,
    #[serde(rename = "ap-southeast-2")]
    ApSoutheast2,
}

impl Region {
    /// Returns the platform identifier of the region.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsWest1 => "us-west-1",
            Self::UsWest2 => "us-west-2",
            Self::CaCentral1 => "ca-central-1",
            Self::SaEast1 => "sa-east-1",
            Self::EuWest1 => "eu-west-1",
            Self::EuWest2 => "eu-west-2",
            Self::EuWest3 => "eu-west-3",
            Self::EuCentral1 => "eu-central-1",
            Self::ApSouth1 => "ap-south-1",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::ApNortheast2 => "ap-northeast-2",
            Self::ApSoutheast1 => "ap-southeast-1",
            Self::ApSoutheast2 => "ap-southeast-2",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network the app cluster is placed into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub vpc: String,

    /// Subnets the load balancer is placed into.
    pub public_subnets: Vec<String>,

    /// Subnets compute instances are launched into.
    pub private_subnets: Vec<String>,
}

/// Size bounds of the autoscaling group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for ScalingBounds {
    fn default() -> Self {
        Self { min: 2, max: 2 }
    }
}

/// Description of the app cluster to compose.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClusterSpec {
    /// Base of every derived resource name.
    pub name: String,
    pub region: Region,
    pub network: Network,
    pub container_image: String,

    /// Memory limit of the container (in MiB). Defaults to
    /// [crate::workload::DEFAULT_CONTAINER_MEMORY] when absent.
    #[serde(default)]
    pub container_memory: Option<u32>,

    /// Managed policies attached to the instance role after the base policy, in order.
    #[serde(default)]
    pub container_managed_policies: Vec<String>,
    pub container_log_group_name: String,

    #[serde(default)]
    pub scaling: ScalingBounds,

    /// Machine image used for compute instances. When absent, the image is resolved from the
    /// region.
    #[serde(default)]
    pub image_id: Option<String>,
}

impl AppClusterSpec {
    /// Load a spec from a YAML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Validates that all configuration values are valid.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidConfiguration] describing the first invalid value found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if self.container_image.is_empty() {
            return Err(invalid("container_image", "must not be empty"));
        }
        if self.network.public_subnets.is_empty() {
            return Err(invalid(
                "network.public_subnets",
                "at least one subnet is required",
            ));
        }
        if self.network.private_subnets.is_empty() {
            return Err(invalid(
                "network.private_subnets",
                "at least one subnet is required",
            ));
        }
        for (field, subnets) in [
            ("network.public_subnets", &self.network.public_subnets),
            ("network.private_subnets", &self.network.private_subnets),
        ] {
            let mut seen = HashSet::new();
            for subnet in subnets {
                if !seen.insert(subnet) {
                    return Err(invalid(field, format!("duplicate subnet {subnet}")));
                }
            }
        }
        if self.container_memory == Some(0) {
            return Err(invalid("container_memory", "must be greater than zero"));
        }
        if self.scaling.min == 0 {
            return Err(invalid("scaling.min", "must be greater than zero"));
        }
        if self.scaling.max == 0 {
            return Err(invalid("scaling.max", "must be greater than zero"));
        }
        if self.scaling.min > self.scaling.max {
            return Err(invalid(
                "scaling",
                format!(
                    "min ({}) must be less than or equal to max ({})",
                    self.scaling.min, self.scaling.max
                ),
            ));
        }
        let mut policies = HashSet::new();
        for policy in &self.container_managed_policies {
            if !policies.insert(policy) {
                return Err(invalid(
                    "container_managed_policies",
                    format!("duplicate policy {policy}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfiguration {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_YAML: &str = r#"
name: foo
region: us-east-1
network:
  vpc: vpc-1
  public_subnets: [subnet-a, subnet-b]
  private_subnets: [subnet-c]
container_image: img:1
container_log_group_name: lg
"#;

    fn spec() -> AppClusterSpec {
        serde_yaml::from_str(SPEC_YAML).unwrap()
    }

    fn assert_invalid(spec: &AppClusterSpec, expected: &str) {
        match spec.validate() {
            Err(Error::InvalidConfiguration { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected invalid {expected}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let spec = spec();
        assert_eq!(spec.name, "foo");
        assert_eq!(spec.region, Region::UsEast1);
        assert_eq!(spec.network.public_subnets, vec!["subnet-a", "subnet-b"]);
        assert_eq!(spec.container_memory, None);
        assert!(spec.container_managed_policies.is_empty());
        assert_eq!(spec.scaling, ScalingBounds { min: 2, max: 2 });
        assert_eq!(spec.image_id, None);
        spec.validate().unwrap();
    }

    #[test]
    fn test_parse_overrides() {
        let yaml = format!(
            "{SPEC_YAML}container_memory: 512\ncontainer_managed_policies: [p1, p2]\nscaling:\n  min: 1\n  max: 4\nimage_id: ami-123\n"
        );
        let spec: AppClusterSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(spec.container_memory, Some(512));
        assert_eq!(spec.container_managed_policies, vec!["p1", "p2"]);
        assert_eq!(spec.scaling, ScalingBounds { min: 1, max: 4 });
        assert_eq!(spec.image_id.as_deref(), Some("ami-123"));
        spec.validate().unwrap();
    }

    #[test]
    fn test_parse_unknown_region() {
        let yaml = SPEC_YAML.replace("us-east-1", "mars-north-1");
        assert!(serde_yaml::from_str::<AppClusterSpec>(&yaml).is_err());
    }

    #[test]
    fn test_region_display() {
        assert_eq!(Region::UsEast1.to_string(), "us-east-1");
        assert_eq!(Region::ApSoutheast2.to_string(), "ap-southeast-2");
    }

    #[test]
    fn test_validate() {
        let mut s = spec();
        s.name.clear();
        assert_invalid(&s, "name");

        let mut s = spec();
        s.container_image.clear();
        assert_invalid(&s, "container_image");

        let mut s = spec();
        s.network.public_subnets.clear();
        assert_invalid(&s, "network.public_subnets");

        let mut s = spec();
        s.network.private_subnets.clear();
        assert_invalid(&s, "network.private_subnets");

        let mut s = spec();
        let subnet = s.network.public_subnets[0].clone();
        s.network.public_subnets.push(subnet);
        assert_invalid(&s, "network.public_subnets");

        let mut s = spec();
        let subnet = s.network.private_subnets[0].clone();
        s.network.private_subnets.push(subnet);
        assert_invalid(&s, "network.private_subnets");

        let mut s = spec();
        s.container_memory = Some(0);
        assert_invalid(&s, "container_memory");

        let mut s = spec();
        s.scaling.min = 0;
        assert_invalid(&s, "scaling.min");

        let mut s = spec();
        s.scaling = ScalingBounds { min: 3, max: 0 };
        assert_invalid(&s, "scaling.max");

        let mut s = spec();
        s.scaling = ScalingBounds { min: 3, max: 2 };
        assert_invalid(&s, "scaling");

        let mut s = spec();
        s.container_managed_policies = vec!["p1".into(), "p2".into(), "p1".into()];
        assert_invalid(&s, "container_managed_policies");
    }
}

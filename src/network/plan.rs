//! VPC subnet planning
//!
//! Lays out one public and one private subnet per availability zone
//! inside a VPC range, using a fresh `CidrBlockAllocator` for every plan.

use crate::error::{Error, Result};
use crate::network::alloc::CidrBlockAllocator;
use crate::network::cidr::CidrBlock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default VPC range
pub const DEFAULT_VPC_CIDR: &str = "172.16.0.0/16";
/// Default region
pub const DEFAULT_REGION: &str = "us-west-2";
/// Default availability zone suffixes
pub const DEFAULT_AVAILABILITY_ZONES: [&str; 3] = ["a", "b", "c"];
/// Default public subnet size
pub const DEFAULT_PUBLIC_SIZE: u32 = 1024;
/// Default private subnet size
pub const DEFAULT_PRIVATE_SIZE: u32 = 2048;

/// Resolve an availability zone suffix against a region
///
/// `("us-west-2", "b")` becomes `us-west-2b`; names that already carry
/// the region are returned unchanged.
pub fn az_name(region: &str, az: &str) -> String {
    if az.starts_with(region) {
        az.to_string()
    } else {
        format!("{}{}", region, az.to_lowercase())
    }
}

/// Subnet role within the VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Public,
    Private,
}

impl Tier {
    fn label(self) -> &'static str {
        match self {
            Tier::Public => "Public",
            Tier::Private => "Private",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Public => write!(f, "public"),
            Tier::Private => write!(f, "private"),
        }
    }
}

/// Order in which subnets are carved out of the VPC range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubnetOrder {
    /// Public then private, zone by zone
    #[default]
    Interleaved,
    /// Every private subnet first, then every public subnet
    Grouped,
}

/// One subnet in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSubnet {
    pub name: String,
    pub tier: Tier,
    pub availability_zone: String,
    pub cidr: CidrBlock,
}

/// Address plan for one VPC
#[derive(Debug, Clone, Serialize)]
pub struct SubnetPlan {
    pub name: String,
    pub vpc_cidr: CidrBlock,
    pub region: String,
    pub subnets: Vec<PlannedSubnet>,
    /// Addresses left after the last subnet
    pub unallocated: u64,
}

impl SubnetPlan {
    /// Subnets of one tier, in allocation order
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &PlannedSubnet> {
        self.subnets.iter().filter(move |s| s.tier == tier)
    }

    /// Look up a subnet by name
    pub fn get(&self, name: &str) -> Option<&PlannedSubnet> {
        self.subnets.iter().find(|s| s.name == name)
    }
}

/// Builds subnet plans for a VPC
#[derive(Debug, Clone)]
pub struct SubnetPlanner {
    name: String,
    vpc_cidr: CidrBlock,
    region: String,
    availability_zones: Vec<String>,
    public_size: u32,
    private_size: u32,
    order: SubnetOrder,
}

impl SubnetPlanner {
    /// Create a planner with default region, zones and sizes
    pub fn new(name: impl Into<String>, vpc_cidr: CidrBlock) -> Self {
        Self {
            name: name.into(),
            vpc_cidr,
            region: DEFAULT_REGION.to_string(),
            availability_zones: DEFAULT_AVAILABILITY_ZONES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            public_size: DEFAULT_PUBLIC_SIZE,
            private_size: DEFAULT_PRIVATE_SIZE,
            order: SubnetOrder::default(),
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn availability_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability_zones = zones.into_iter().map(Into::into).collect();
        self
    }

    pub fn public_size(mut self, size: u32) -> Self {
        self.public_size = size;
        self
    }

    pub fn private_size(mut self, size: u32) -> Self {
        self.private_size = size;
        self
    }

    pub fn order(mut self, order: SubnetOrder) -> Self {
        self.order = order;
        self
    }

    /// Allocate every subnet and return the resulting plan
    pub fn plan(&self) -> Result<SubnetPlan> {
        let zones = self.resolve_zones()?;
        let mut alloc = CidrBlockAllocator::new(self.vpc_cidr);
        let mut subnets = Vec::with_capacity(zones.len() * 2);

        let steps: Vec<(Tier, &String)> = match self.order {
            SubnetOrder::Interleaved => zones
                .iter()
                .flat_map(|az| [(Tier::Public, az), (Tier::Private, az)])
                .collect(),
            SubnetOrder::Grouped => zones
                .iter()
                .map(|az| (Tier::Private, az))
                .chain(zones.iter().map(|az| (Tier::Public, az)))
                .collect(),
        };

        for (tier, az) in steps {
            let size = match tier {
                Tier::Public => self.public_size,
                Tier::Private => self.private_size,
            };
            let cidr = alloc.alloc(size)?;
            let subnet = PlannedSubnet {
                name: self.subnet_name(tier, az),
                tier,
                availability_zone: az.clone(),
                cidr,
            };
            log::info!("{} {} -> {}", subnet.name, subnet.availability_zone, subnet.cidr);
            subnets.push(subnet);
        }

        Ok(SubnetPlan {
            name: self.name.clone(),
            vpc_cidr: self.vpc_cidr,
            region: self.region.clone(),
            subnets,
            unallocated: alloc.remaining(),
        })
    }

    fn resolve_zones(&self) -> Result<Vec<String>> {
        if self.name.is_empty() {
            return Err(Error::ConfigValidation("VPC name must not be empty".into()));
        }
        if self.availability_zones.is_empty() {
            return Err(Error::ConfigValidation(
                "At least one availability zone is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        let mut names = HashSet::new();
        let mut zones = Vec::with_capacity(self.availability_zones.len());
        for az in &self.availability_zones {
            if az.is_empty() {
                return Err(Error::ConfigValidation("Empty availability zone name".into()));
            }
            let full = az_name(&self.region, az);
            if !seen.insert(full.clone()) {
                return Err(Error::ConfigValidation(format!(
                    "Duplicate availability zone: {}",
                    full
                )));
            }

            // Subnet names only carry the zone's last letter
            let name = self.subnet_name(Tier::Public, &full);
            if !names.insert(name) {
                return Err(Error::ConfigValidation(format!(
                    "Availability zone {} reuses the subnet suffix of an earlier zone",
                    full
                )));
            }
            zones.push(full);
        }

        Ok(zones)
    }

    /// `{name}{Public|Private}Subnet{AZ letter}`
    fn subnet_name(&self, tier: Tier, az: &str) -> String {
        let suffix: String = az
            .chars()
            .last()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();
        format!("{}{}Subnet{}", self.name, tier.label(), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> CidrBlock {
        CidrBlock::parse(s).unwrap()
    }

    fn default_planner() -> SubnetPlanner {
        SubnetPlanner::new("Core", block(DEFAULT_VPC_CIDR))
    }

    #[test]
    fn test_az_name() {
        assert_eq!(az_name("us-west-2", "a"), "us-west-2a");
        assert_eq!(az_name("us-west-2", "B"), "us-west-2b");
        assert_eq!(az_name("us-west-2", "us-west-2c"), "us-west-2c");
    }

    #[test]
    fn test_interleaved_defaults() {
        let plan = default_planner().plan().unwrap();
        let got: Vec<(&str, String)> = plan
            .subnets
            .iter()
            .map(|s| (s.name.as_str(), s.cidr.to_string()))
            .collect();

        assert_eq!(
            got,
            vec![
                ("CorePublicSubnetA", "172.16.0.0/22".to_string()),
                ("CorePrivateSubnetA", "172.16.8.0/21".to_string()),
                ("CorePublicSubnetB", "172.16.16.0/22".to_string()),
                ("CorePrivateSubnetB", "172.16.24.0/21".to_string()),
                ("CorePublicSubnetC", "172.16.32.0/22".to_string()),
                ("CorePrivateSubnetC", "172.16.40.0/21".to_string()),
            ]
        );
        assert_eq!(plan.region, "us-west-2");
        assert_eq!(plan.subnets[0].availability_zone, "us-west-2a");
        assert_eq!(plan.unallocated, 65536 - 12 * 1024);
    }

    #[test]
    fn test_grouped_order() {
        let plan = default_planner()
            .order(SubnetOrder::Grouped)
            .plan()
            .unwrap();

        let private: Vec<String> = plan.tier(Tier::Private).map(|s| s.cidr.to_string()).collect();
        let public: Vec<String> = plan.tier(Tier::Public).map(|s| s.cidr.to_string()).collect();

        assert_eq!(private, ["172.16.0.0/21", "172.16.8.0/21", "172.16.16.0/21"]);
        assert_eq!(public, ["172.16.24.0/22", "172.16.28.0/22", "172.16.32.0/22"]);
    }

    #[test]
    fn test_full_zone_names() {
        let plan = default_planner()
            .region("eu-west-1")
            .availability_zones(["eu-west-1a", "b"])
            .plan()
            .unwrap();

        assert_eq!(plan.subnets.len(), 4);
        assert_eq!(plan.get("CorePublicSubnetB").unwrap().availability_zone, "eu-west-1b");
    }

    #[test]
    fn test_exhaustion_propagates() {
        let err = SubnetPlanner::new("Tiny", block("10.0.0.0/24"))
            .public_size(128)
            .private_size(128)
            .plan()
            .unwrap_err();

        assert!(matches!(err, Error::AddressSpaceExhausted { requested: 128, .. }));
    }

    #[test]
    fn test_duplicate_zones_rejected() {
        let err = default_planner()
            .availability_zones(["a", "us-west-2a"])
            .plan()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_shared_zone_suffix_rejected() {
        let err = default_planner()
            .availability_zones(["a", "xa"])
            .plan()
            .unwrap_err();
        match err {
            Error::ConfigValidation(msg) => assert!(msg.contains("us-west-2xa")),
            other => panic!("expected ConfigValidation, got {:?}", other),
        }

        let err = default_planner()
            .region("eu-west-1")
            .availability_zones(["eu-west-1a", "us-east-1a"])
            .plan()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_subnet_names_unique() {
        let plan = default_planner()
            .availability_zones(["a", "b", "c", "d"])
            .plan()
            .unwrap();
        let names: HashSet<&str> = plan.subnets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), plan.subnets.len());
    }

    #[test]
    fn test_no_zones_rejected() {
        let err = default_planner()
            .availability_zones(Vec::<String>::new())
            .plan()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_plan_json() {
        let plan = default_planner().availability_zones(["a"]).plan().unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["vpc_cidr"], "172.16.0.0/16");
        assert_eq!(json["subnets"][0]["tier"], "public");
        assert_eq!(json["subnets"][1]["cidr"], "172.16.8.0/21");
    }
}

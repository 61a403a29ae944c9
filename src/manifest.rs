//! Configuration file parsing for Scaffold
//!
//! Parses `scaffold.toml` configuration files using serde

use crate::error::{Error, Result};
use crate::network::alloc::MAX_BLOCK_SIZE;
use crate::network::cidr::CidrBlock;
use crate::network::plan::{
    DEFAULT_AVAILABILITY_ZONES, DEFAULT_PRIVATE_SIZE, DEFAULT_PUBLIC_SIZE, DEFAULT_REGION,
    DEFAULT_VPC_CIDR, SubnetOrder, SubnetPlanner,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// VPC name used when neither the file nor its directory provides one
pub const DEFAULT_VPC_NAME: &str = "Vpc";

/// Load configuration from a file
pub fn load(path: &Path) -> Result<ScaffoldConfig> {
    let mut config = read(path)?;

    if config.vpc.name.is_none() {
        config.vpc.name = Some(vpc_name_from_path(path));
    }

    config.validate()?;
    Ok(config)
}

/// Load and merge multiple configuration files
///
/// Files are merged in order; later files only override the fields they set.
pub fn load_merged(paths: &[PathBuf]) -> Result<ScaffoldConfig> {
    let Some(first_path) = paths.first() else {
        return Err(Error::ConfigValidation("No configuration files provided".into()));
    };

    let mut config = read(first_path)?;
    for path in &paths[1..] {
        config = config.merge(read(path)?);
    }

    if config.vpc.name.is_none() {
        config.vpc.name = Some(vpc_name_from_path(first_path));
    }

    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<ScaffoldConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: ScaffoldConfig = toml::from_str(&content)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Name a VPC after the directory holding its config file
fn vpc_name_from_path(path: &Path) -> String {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty() && p.as_os_str() != ".")
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_VPC_NAME.to_string())
}

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct ScaffoldConfig {
    /// VPC to plan
    #[serde(default)]
    pub vpc: VpcConfig,
}

impl ScaffoldConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let vpc = &self.vpc;

        if let Some(name) = &vpc.name {
            if name.is_empty() {
                return Err(Error::ConfigValidation("VPC name must not be empty".into()));
            }
        }

        for (field, size) in [("public_size", vpc.public_size), ("private_size", vpc.private_size)] {
            if let Some(size) = size {
                if size == 0 || size > MAX_BLOCK_SIZE {
                    return Err(Error::ConfigValidation(format!(
                        "{} must be between 1 and {} ({} given)",
                        field, MAX_BLOCK_SIZE, size
                    )));
                }
            }
        }

        if let Some(zones) = &vpc.availability_zones {
            if zones.is_empty() {
                return Err(Error::ConfigValidation(
                    "availability_zones must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one, field by field
    pub fn merge(self, other: ScaffoldConfig) -> ScaffoldConfig {
        ScaffoldConfig {
            vpc: self.vpc.merge(other.vpc),
        }
    }

    /// Build a planner with defaults filled in
    pub fn planner(&self) -> Result<SubnetPlanner> {
        let vpc = &self.vpc;
        let cidr = match vpc.cidr {
            Some(cidr) => cidr,
            None => CidrBlock::parse(DEFAULT_VPC_CIDR)?,
        };

        let zones = vpc.availability_zones.clone().unwrap_or_else(|| {
            DEFAULT_AVAILABILITY_ZONES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        Ok(SubnetPlanner::new(vpc.name.as_deref().unwrap_or(DEFAULT_VPC_NAME), cidr)
            .region(vpc.region.as_deref().unwrap_or(DEFAULT_REGION))
            .availability_zones(zones)
            .public_size(vpc.public_size.unwrap_or(DEFAULT_PUBLIC_SIZE))
            .private_size(vpc.private_size.unwrap_or(DEFAULT_PRIVATE_SIZE))
            .order(vpc.order.unwrap_or_default()))
    }
}

/// VPC settings; unset fields fall back to planner defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpcConfig {
    /// Prefix for subnet names
    pub name: Option<String>,

    /// Address range of the whole VPC
    pub cidr: Option<CidrBlock>,

    /// Region used to qualify zone suffixes
    pub region: Option<String>,

    /// Zone suffixes (`a`) or full zone names (`us-west-2a`)
    pub availability_zones: Option<Vec<String>>,

    /// Addresses per public subnet
    pub public_size: Option<u32>,

    /// Addresses per private subnet
    pub private_size: Option<u32>,

    /// Allocation order
    pub order: Option<SubnetOrder>,
}

impl VpcConfig {
    fn merge(self, other: VpcConfig) -> VpcConfig {
        VpcConfig {
            name: other.name.or(self.name),
            cidr: other.cidr.or(self.cidr),
            region: other.region.or(self.region),
            availability_zones: other.availability_zones.or(self.availability_zones),
            public_size: other.public_size.or(self.public_size),
            private_size: other.private_size.or(self.private_size),
            order: other.order.or(self.order),
        }
    }
}

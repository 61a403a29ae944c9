//! Address planning for VPC networks
//!
//! Provides:
//! - IPv4 CIDR block parsing and formatting
//! - Sequential, aligned subnet allocation from a VPC range
//! - Public/private subnet layout across availability zones

pub mod alloc;
pub mod cidr;
pub mod plan;

pub use alloc::{CidrBlockAllocator, normalize_block_size};
pub use cidr::CidrBlock;
pub use plan::{PlannedSubnet, SubnetOrder, SubnetPlan, SubnetPlanner, Tier, az_name};

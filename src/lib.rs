//! Scaffold - CIDR address planning for VPC templates
//!
//! Carves a VPC range into naturally aligned subnets with a bump
//! allocator, and lays those subnets out across availability zones.

pub mod error;
pub mod manifest;
pub mod network;

pub use error::{Error, Result};
pub use network::{CidrBlock, CidrBlockAllocator};

//! Unified error types for Scaffold

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Scaffold operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    // CIDR errors
    #[error("{0} is not a valid cidr block expression")]
    MalformedCidr(String),

    #[error("Base address {base} has bits set outside a /{prefix_len} mask")]
    MisalignedBlock { base: String, prefix_len: u8 },

    #[error("Prefix length must be <= 32 ({0} given)")]
    InvalidPrefixLength(u8),

    // Allocation errors
    #[error("Block size must be <= 65536 ({0} given)")]
    RequestTooLarge(u32),

    #[error("Less than {requested} free ips available ({available} available, {requested} requested)")]
    AddressSpaceExhausted { requested: u32, available: u64 },

    // Output errors
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Scaffold operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_too_large_reports_value() {
        let msg = Error::RequestTooLarge(66000).to_string();
        assert!(msg.contains("66000"));
    }

    #[test]
    fn test_exhausted_reports_request() {
        let err = Error::AddressSpaceExhausted {
            requested: 512,
            available: 256,
        };
        assert!(err.to_string().contains("512 requested"));
    }
}

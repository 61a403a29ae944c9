//! Subnet allocation from a VPC address range
//!
//! Provides:
//! - Block size normalization onto a fixed power-of-two ladder
//! - Sequential, naturally aligned sub-block allocation
//! - Exhaustion detection without partial allocation
//!
//! The allocator is append-only: it never frees or back-fills the gaps
//! left behind when a larger block forces the cursor up to its alignment.

use crate::error::{Error, Result};
use crate::network::cidr::{ADDRESS_BITS, CidrBlock};
use std::str::FromStr;

/// Block sizes the allocator issues, smallest first (/28 down to /16)
pub const BLOCK_SIZES: [u32; 13] = [
    16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536,
];

/// Smallest issuable block size
pub const MIN_BLOCK_SIZE: u32 = BLOCK_SIZES[0];

/// Largest issuable block size
pub const MAX_BLOCK_SIZE: u32 = BLOCK_SIZES[BLOCK_SIZES.len() - 1];

/// Round a requested address count up to the next ladder entry.
///
/// `0` normalizes to the smallest entry.
pub fn normalize_block_size(requested: u32) -> Result<u32> {
    let idx = BLOCK_SIZES.partition_point(|&size| size < requested);
    BLOCK_SIZES
        .get(idx)
        .copied()
        .ok_or(Error::RequestTooLarge(requested))
}

/// Prefix length of a ladder block size
fn prefix_len_for(block_size: u32) -> u8 {
    debug_assert!(block_size.is_power_of_two());
    ADDRESS_BITS - block_size.trailing_zeros() as u8
}

/// Bump allocator over one CIDR block
///
/// `alloc` takes `&mut self`; share an allocator across threads only
/// behind a lock.
#[derive(Debug, Clone)]
pub struct CidrBlockAllocator {
    /// Arena the allocator carves from
    initial: CidrBlock,
    /// Next unallocated address
    free_ptr: u64,
    /// Exclusive upper bound of the arena
    limit: u64,
}

impl CidrBlockAllocator {
    /// Create an allocator spanning `initial`
    pub fn new(initial: CidrBlock) -> Self {
        Self {
            initial,
            free_ptr: u64::from(initial.base()),
            limit: initial.end(),
        }
    }

    /// Create an allocator from a CIDR string such as `172.16.0.0/16`
    pub fn from_cidr_str(s: &str) -> Result<Self> {
        Ok(Self::new(CidrBlock::parse(s)?))
    }

    /// Allocate the next block that holds at least `requested_block_size` addresses
    ///
    /// The request is rounded up onto the ladder and the block is placed at
    /// the first address past the cursor that is a multiple of its size.
    /// On failure the cursor is left where it was.
    pub fn alloc(&mut self, requested_block_size: u32) -> Result<CidrBlock> {
        let block_size = normalize_block_size(requested_block_size)?;
        let prefix_len = prefix_len_for(block_size);

        let size = u64::from(block_size);
        let align_mask = !(size - 1);
        let candidate_base = (self.free_ptr + size - 1) & align_mask;
        let candidate_limit = candidate_base + size;

        if candidate_limit > self.limit {
            return Err(Error::AddressSpaceExhausted {
                requested: requested_block_size,
                available: self.limit - self.free_ptr,
            });
        }

        if candidate_base > self.free_ptr {
            log::debug!(
                "Skipping {} addresses to align a /{} block",
                candidate_base - self.free_ptr,
                prefix_len
            );
        }

        // candidate_limit <= limit <= 2^32, so the base fits in 32 bits
        let base = u32::try_from(candidate_base).map_err(|_| Error::AddressSpaceExhausted {
            requested: requested_block_size,
            available: self.limit - self.free_ptr,
        })?;

        self.free_ptr = candidate_limit;
        let block = CidrBlock::from_parts(base, prefix_len);
        log::debug!(
            "Allocated {} for {} requested addresses from {}",
            block,
            requested_block_size,
            self.initial
        );
        Ok(block)
    }

    /// The arena this allocator was built from
    pub fn initial_block(&self) -> CidrBlock {
        self.initial
    }

    /// Next unallocated address
    pub fn free_ptr(&self) -> u64 {
        self.free_ptr
    }

    /// Exclusive upper bound of the arena
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Addresses past the cursor, ignoring alignment
    pub fn remaining(&self) -> u64 {
        self.limit - self.free_ptr
    }
}

impl From<CidrBlock> for CidrBlockAllocator {
    fn from(initial: CidrBlock) -> Self {
        Self::new(initial)
    }
}

impl FromStr for CidrBlockAllocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cidr_str(s)
    }
}

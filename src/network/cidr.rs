//! IPv4 CIDR block value type
//!
//! A `CidrBlock` is a network base address plus a prefix length. It is
//! immutable once built and compares structurally on both fields.

use crate::error::{Error, Result};
use ipnet::Ipv4Net;
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    Parser,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Number of bits in an IPv4 address
pub const ADDRESS_BITS: u8 = 32;

/// An IPv4 network block (`a.b.c.d/len`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    base: u32,
    prefix_len: u8,
}

impl CidrBlock {
    /// Create a block from a base address and prefix length
    ///
    /// Fails if the prefix is longer than 32 bits or if `base` has host
    /// bits set for that prefix.
    pub fn new(base: u32, prefix_len: u8) -> Result<Self> {
        if prefix_len > ADDRESS_BITS {
            return Err(Error::InvalidPrefixLength(prefix_len));
        }

        let block = Self::from_parts(base, prefix_len);
        if base & !block.mask() != 0 {
            return Err(Error::MisalignedBlock {
                base: Ipv4Addr::from(base).to_string(),
                prefix_len,
            });
        }

        Ok(block)
    }

    /// Build a block without checking alignment.
    ///
    /// Callers must guarantee `prefix_len <= 32` and `base == base & mask`.
    pub(crate) const fn from_parts(base: u32, prefix_len: u8) -> Self {
        Self { base, prefix_len }
    }

    /// Parse the canonical `a.b.c.d/len` form
    ///
    /// Only the grammar is checked: host bits below the prefix are kept
    /// as given (`10.0.0.1/8` parses). Use `new` for an aligned block.
    pub fn parse(s: &str) -> Result<Self> {
        match all_consuming(cidr).parse(s) {
            Ok((_, (quad, prefix_len))) => Ok(Self::from_parts(u32::from_be_bytes(quad), prefix_len)),
            Err(_) => Err(Error::MalformedCidr(s.to_string())),
        }
    }

    /// Network base address as a 32-bit integer
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Network base address
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.base)
    }

    /// Netmask with the top `prefix_len` bits set
    pub fn mask(&self) -> u32 {
        mask_bits(self.prefix_len)
    }

    /// Dotted-quad form of the base address
    pub fn ip_str(&self) -> String {
        self.network().to_string()
    }

    /// Dotted-quad form of the netmask
    pub fn mask_str(&self) -> String {
        Ipv4Addr::from(self.mask()).to_string()
    }

    /// Prefix length in bits
    pub fn mask_size(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses covered by the block.
    ///
    /// `u64` so that `0.0.0.0/0` can report 2^32.
    pub fn block_size(&self) -> u64 {
        1u64 << (ADDRESS_BITS - self.prefix_len)
    }

    /// Exclusive upper bound of the block's address range
    pub fn end(&self) -> u64 {
        u64::from(self.base) + self.block_size()
    }
}

/// A 32-bit mask with the top `prefix_len` bits set
pub(crate) fn mask_bits(prefix_len: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(ADDRESS_BITS - prefix_len))
        .unwrap_or(0)
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip_str(), self.prefix_len)
    }
}

impl FromStr for CidrBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<CidrBlock> for Ipv4Net {
    fn from(block: CidrBlock) -> Self {
        Ipv4Net::new_assert(block.network(), block.prefix_len)
    }
}

impl TryFrom<Ipv4Net> for CidrBlock {
    type Error = Error;

    fn try_from(net: Ipv4Net) -> Result<Self> {
        Self::new(u32::from(net.addr()), net.prefix_len())
    }
}

impl Serialize for CidrBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CidrBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// Nom parsers for the `a.b.c.d/len` grammar

fn cidr(input: &str) -> nom::IResult<&str, ([u8; 4], u8)> {
    let (input, (a, _, b, _, c, _, d)) =
        (octet, char('.'), octet, char('.'), octet, char('.'), octet).parse(input)?;
    let (input, _) = char('/').parse(input)?;
    let (input, prefix_len) = prefix(input)?;

    Ok((input, ([a, b, c, d], prefix_len)))
}

fn octet(input: &str) -> nom::IResult<&str, u8> {
    map_res(digit1, |s: &str| {
        canonical_decimal(s)
            .and_then(|v| u8::try_from(v).ok())
            .ok_or(())
    })
    .parse(input)
}

fn prefix(input: &str) -> nom::IResult<&str, u8> {
    map_res(digit1, |s: &str| {
        canonical_decimal(s)
            .filter(|&v| v <= u32::from(ADDRESS_BITS))
            .and_then(|v| u8::try_from(v).ok())
            .ok_or(())
    })
    .parse(input)
}

/// Decimal with at most three digits and no leading zero (a lone `0` is fine)
fn canonical_decimal(s: &str) -> Option<u32> {
    if s.len() > 3 || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse().ok()
}

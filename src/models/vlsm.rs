//! VLSM request/result records and allocation policy types.

use super::cidr::NormalisedCidr;
use super::meta::AddressCount;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Free-form per-request data carried through to the allocation.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A named block to place inside a parent network.
///
/// One of `required_hosts` / `required_prefix` must be set; when both are,
/// `required_prefix` wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct VlsmRequest {
    pub name: String,
    #[serde(default)]
    pub required_hosts: Option<u128>,
    #[serde(default)]
    pub required_prefix: Option<u8>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VlsmRequest {
    /// Request sized by host count.
    pub fn hosts(name: &str, hosts: u128) -> VlsmRequest {
        VlsmRequest {
            name: name.to_string(),
            required_hosts: Some(hosts),
            ..Default::default()
        }
    }

    /// Request sized by prefix length.
    pub fn prefix(name: &str, prefix: u8) -> VlsmRequest {
        VlsmRequest {
            name: name.to_string(),
            required_prefix: Some(prefix),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> VlsmRequest {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Outcome of one [`VlsmRequest`].
///
/// `cidr` is `None` exactly when `allocated` is false.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VlsmAllocation {
    pub name: String,
    pub cidr: Option<NormalisedCidr>,
    /// Prefix length the request asked for; 0 for a host count larger than
    /// the whole address family.
    pub requested_prefix: u8,
    pub metadata: Metadata,
    pub allocated: bool,
}

/// Order in which VLSM requests are placed.
///
/// `PackedLow`, `PackedHigh` and `Balanced` currently order like
/// `LargestFirst`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VlsmStrategy {
    #[default]
    LargestFirst,
    SmallestFirst,
    PackedLow,
    PackedHigh,
    Balanced,
}

impl FromStr for VlsmStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "largest-first" => Ok(VlsmStrategy::LargestFirst),
            "smallest-first" => Ok(VlsmStrategy::SmallestFirst),
            "packed-low" => Ok(VlsmStrategy::PackedLow),
            "packed-high" => Ok(VlsmStrategy::PackedHigh),
            "balanced" => Ok(VlsmStrategy::Balanced),
            other => Err(Error::format(format!("unknown VLSM strategy '{other}'"))),
        }
    }
}

impl fmt::Display for VlsmStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VlsmStrategy::LargestFirst => "largest-first",
            VlsmStrategy::SmallestFirst => "smallest-first",
            VlsmStrategy::PackedLow => "packed-low",
            VlsmStrategy::PackedHigh => "packed-high",
            VlsmStrategy::Balanced => "balanced",
        };
        f.write_str(name)
    }
}

/// Constraints an allocated block must satisfy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AllocationPolicy {
    /// Shortest prefix length allowed (largest block).
    pub min_prefix: Option<u8>,
    /// Longest prefix length allowed (smallest block).
    pub max_prefix: Option<u8>,
    /// If set, only these prefix lengths are allowed.
    pub allowed_prefixes: Option<BTreeSet<u8>>,
    /// Blocks that must not overlap an allocation.
    #[serde(default)]
    pub forbidden_ranges: Vec<NormalisedCidr>,
    /// Network address must be aligned to a block of this prefix length.
    pub alignment_prefix: Option<u8>,
}

/// A single policy rule an allocation broke.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    PrefixTooShort { prefix: u8, min: u8 },
    PrefixTooLong { prefix: u8, max: u8 },
    PrefixNotAllowed { prefix: u8 },
    ForbiddenOverlap { forbidden: NormalisedCidr },
    Misaligned { alignment_prefix: u8 },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::PrefixTooShort { prefix, min } => {
                write!(f, "prefix /{prefix} is shorter than the minimum /{min}")
            }
            PolicyViolation::PrefixTooLong { prefix, max } => {
                write!(f, "prefix /{prefix} is longer than the maximum /{max}")
            }
            PolicyViolation::PrefixNotAllowed { prefix } => {
                write!(f, "prefix /{prefix} is not in the allowed set")
            }
            PolicyViolation::ForbiddenOverlap { forbidden } => {
                write!(f, "overlaps forbidden range {forbidden}")
            }
            PolicyViolation::Misaligned { alignment_prefix } => {
                write!(f, "network is not aligned to a /{alignment_prefix} boundary")
            }
        }
    }
}

/// Result of checking a block against an [`AllocationPolicy`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PolicyReport {
    pub cidr: NormalisedCidr,
    pub violations: Vec<PolicyViolation>,
}

impl PolicyReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Address-space usage of a parent block.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Utilization {
    pub parent: NormalisedCidr,
    pub total: AddressCount,
    pub allocated: AddressCount,
    pub free: AddressCount,
    /// Allocated share of the parent, 0.0 to 100.0.
    pub utilization_percent: f64,
    /// Number of allocated blocks.
    pub fragmentation: usize,
    /// Unallocated space as minimal CIDR blocks, ascending.
    pub free_blocks: Vec<NormalisedCidr>,
}

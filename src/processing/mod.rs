//! Operations over normalised CIDR blocks.
//!
//! This module contains the calculator logic:
//! - [`transform`] - Splitting, merging and summarization
//! - [`overlap`] - Containment, overlap and set operations
//! - [`gap_finder`] - Free space between allocated blocks
//! - [`classify`] - Special-purpose address classification
//! - [`vlsm`] - VLSM allocation, policy checks and utilization

mod classify;
mod gap_finder;
mod overlap;
mod transform;
mod vlsm;

// Re-export public functions
pub use classify::{classify_address, AddressClass};
pub use gap_finder::find_free_blocks;
pub use overlap::{
    are_adjacent, can_merge, classify_overlap, contains_ip, contains_prefix, detect_overlaps,
    difference_prefixes, intersect_prefixes, union_prefixes, OverlapKind, OverlapPair,
    OverlapResult,
};
pub use transform::{
    host_bits_for, merge_siblings, minimal_covering_supernet, prefix_for_hosts,
    split_binary, split_by_host_count, split_into_n, summarize_prefixes, HostSplit,
    MAX_ENUMERATED_SUBNETS,
};
pub use vlsm::{allocate_vlsm, calculate_utilization, validate_allocation_policy};

//! Split, merge and summarize CIDR blocks.
//!
//! All operations work on the binary tree implied by prefix lengths: a block
//! `/p` has two children at `/p+1` and one parent at `/p-1`.

use super::overlap::{can_merge, contains_prefix};
use crate::error::{Error, Result};
use crate::models::{ceil_log2, IpVersion, NormalisedCidr};
use serde::Serialize;

/// Upper bound on blocks a single split may enumerate.
/// Covers a /8 split into host routes; only wide IPv6 fan-outs go past it.
pub const MAX_ENUMERATED_SUBNETS: u128 = 1 << 24;

/// Result of [`split_by_host_count`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostSplit {
    pub prefix: u8,
    pub subnets: Vec<NormalisedCidr>,
}

/// Split a block into its two halves.
pub fn split_binary(cidr: &NormalisedCidr) -> Result<(NormalisedCidr, NormalisedCidr)> {
    let (left, right) = cidr.children().ok_or_else(|| {
        Error::range(format!("{cidr} is a host route and cannot be split"))
    })?;
    log::debug!("split {cidr} -> {left} + {right}");
    Ok((left, right))
}

/// Split a block into `n` equal blocks, `n` a power of two.
pub fn split_into_n(cidr: &NormalisedCidr, n: u128) -> Result<Vec<NormalisedCidr>> {
    if !n.is_power_of_two() {
        return Err(Error::domain(format!(
            "split count {n} is not a positive power of two"
        )));
    }
    let extra_bits = n.trailing_zeros() as u8;
    let new_prefix = cidr.prefix() as u16 + extra_bits as u16;
    if new_prefix > cidr.bits() as u16 {
        return Err(Error::range(format!(
            "splitting {cidr} into {n} blocks needs /{new_prefix}, beyond /{}",
            cidr.bits()
        )));
    }
    if n > MAX_ENUMERATED_SUBNETS {
        return Err(Error::domain(format!(
            "splitting {cidr} into {n} blocks exceeds the limit of {MAX_ENUMERATED_SUBNETS}"
        )));
    }
    let subnets: Vec<NormalisedCidr> = cidr.subnets(new_prefix as u8)?.collect();
    log::debug!("split {cidr} into {} x /{new_prefix}", subnets.len());
    Ok(subnets)
}

/// Host bits needed for `hosts` addresses of a family.
///
/// IPv4 reserves network and broadcast except for 1 host (/32) and 2 hosts
/// (/31, RFC 3021); 0 hosts also lands on a /31. IPv6 reserves nothing, so 0
/// or 1 host is a /128.
pub fn host_bits_for(version: IpVersion, hosts: u128) -> Result<u8> {
    let host_bits = match version {
        IpVersion::V4 => match hosts {
            1 => 0,
            2 => 1,
            _ => ceil_log2(hosts.saturating_add(2)),
        },
        IpVersion::V6 => ceil_log2(hosts),
    };
    if host_bits > version.bits() {
        return Err(Error::domain(format!(
            "{hosts} hosts do not fit in an {version} address space"
        )));
    }
    Ok(host_bits)
}

/// Prefix length of the smallest block holding `hosts` usable addresses.
pub fn prefix_for_hosts(version: IpVersion, hosts: u128) -> Result<u8> {
    Ok(version.bits() - host_bits_for(version, hosts)?)
}

/// Split a block into the smallest blocks that still hold `hosts` each.
pub fn split_by_host_count(cidr: &NormalisedCidr, hosts: u128) -> Result<HostSplit> {
    let prefix = prefix_for_hosts(cidr.version(), hosts)?;
    if prefix < cidr.prefix() {
        return Err(Error::domain(format!(
            "{hosts} hosts need a /{prefix}, larger than {cidr}"
        )));
    }
    let count_bits = prefix - cidr.prefix();
    if count_bits >= 128 || (1u128 << count_bits) > MAX_ENUMERATED_SUBNETS {
        return Err(Error::domain(format!(
            "splitting {cidr} into /{prefix} blocks exceeds the limit of {MAX_ENUMERATED_SUBNETS}"
        )));
    }
    let subnets = cidr.subnets(prefix)?.collect();
    Ok(HostSplit { prefix, subnets })
}

/// Merge two sibling blocks into their parent.
pub fn merge_siblings(a: &NormalisedCidr, b: &NormalisedCidr) -> Result<NormalisedCidr> {
    if a.version() != b.version() || a.prefix() != b.prefix() {
        return Err(Error::domain(format!(
            "{a} and {b} differ in family or prefix length"
        )));
    }
    let parent = a
        .parent()
        .ok_or_else(|| Error::domain(format!("{a} has no parent block")))?;
    let (left, right) = split_binary(&parent)?;
    let siblings = (*a == left && *b == right) || (*a == right && *b == left);
    if !siblings {
        return Err(Error::domain(format!("{a} and {b} are not siblings")));
    }
    log::debug!("merge {a} + {b} -> {parent}");
    Ok(parent)
}

fn check_uniform_version(cidrs: &[NormalisedCidr]) -> Result<()> {
    if let Some(first) = cidrs.first() {
        if let Some(other) = cidrs.iter().find(|c| c.version() != first.version()) {
            return Err(Error::domain(format!(
                "cannot mix {} ({first}) and {} ({other})",
                first.version(),
                other.version()
            )));
        }
    }
    Ok(())
}

/// Reduce a list of blocks to the minimal equivalent sorted list.
///
/// Duplicates and blocks covered by another input are dropped, then sibling
/// pairs are merged repeatedly until nothing changes.
pub fn summarize_prefixes(cidrs: &[NormalisedCidr]) -> Result<Vec<NormalisedCidr>> {
    check_uniform_version(cidrs)?;

    let mut sorted = cidrs.to_vec();
    sorted.sort();

    // Sorted by (network, prefix): a covering block precedes what it covers.
    let mut blocks: Vec<NormalisedCidr> = Vec::with_capacity(sorted.len());
    for cidr in sorted {
        match blocks.last() {
            Some(prev) if contains_prefix(prev, &cidr) => continue,
            _ => blocks.push(cidr),
        }
    }

    loop {
        let mut merged = Vec::with_capacity(blocks.len());
        let mut changed = false;
        let mut i = 0;
        while i < blocks.len() {
            if i + 1 < blocks.len() && can_merge(&blocks[i], &blocks[i + 1]) {
                merged.push(merge_siblings(&blocks[i], &blocks[i + 1])?);
                changed = true;
                i += 2;
            } else {
                merged.push(blocks[i]);
                i += 1;
            }
        }
        blocks = merged;
        if !changed {
            break;
        }
    }

    log::info!(
        "summarized {} block(s) into {}",
        cidrs.len(),
        blocks.len()
    );
    Ok(blocks)
}

/// Smallest single block covering every input.
pub fn minimal_covering_supernet(cidrs: &[NormalisedCidr]) -> Result<NormalisedCidr> {
    let first = cidrs
        .first()
        .ok_or_else(|| Error::domain("cannot build a supernet of an empty list"))?;
    check_uniform_version(cidrs)?;

    let min_network = cidrs.iter().map(|c| c.network()).min().unwrap_or(0);
    let max_last = cidrs.iter().map(|c| c.last()).max().unwrap_or(0);

    // Common leading bits of the lowest and highest address.
    let bits = first.bits();
    let differing = min_network ^ max_last;
    let prefix = (differing.leading_zeros() as u8).saturating_sub(128 - bits);

    NormalisedCidr::from_parts(first.version(), min_network, prefix)
}

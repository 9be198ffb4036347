//! VLSM allocation of named requests inside a parent block.
//!
//! Placement is greedy first-fit in ascending address order, with requests
//! processed in the order given by the [`VlsmStrategy`]. There is no
//! backtracking, so a request can fail even when a different packing would
//! have fit everything.

use super::gap_finder::find_free_blocks;
use super::overlap::{classify_overlap, contains_prefix};
use super::transform::{prefix_for_hosts, summarize_prefixes};
use crate::error::{Error, Result};
use crate::models::{
    wildcard, AddressCount, AllocationPolicy, NormalisedCidr, PolicyReport, PolicyViolation,
    Utilization, VlsmAllocation, VlsmRequest, VlsmStrategy,
};
use std::cmp::Reverse;

/// Prefix length a request needs inside a block of the parent's family.
///
/// `None` when the request cannot exist in that family at all.
fn required_prefix(parent: &NormalisedCidr, request: &VlsmRequest) -> Result<Option<u8>> {
    match (request.required_prefix, request.required_hosts) {
        (Some(prefix), _) if prefix > parent.bits() => Ok(None),
        (Some(prefix), _) => Ok(Some(prefix)),
        (None, Some(hosts)) => Ok(prefix_for_hosts(parent.version(), hosts).ok()),
        (None, None) => Err(Error::domain(format!(
            "request '{}' has neither a host count nor a prefix length",
            request.name
        ))),
    }
}

/// Lowest `/prefix` block of `parent` not overlapping anything in `placed`.
///
/// Equivalent to scanning every candidate in ascending order, but jumps past
/// each conflicting block instead of stepping one candidate at a time.
fn find_first_fit(
    parent: &NormalisedCidr,
    prefix: u8,
    placed: &[NormalisedCidr],
) -> Result<Option<NormalisedCidr>> {
    if prefix < parent.prefix() || prefix > parent.bits() {
        return Ok(None);
    }

    let mut current = parent.network();
    loop {
        let candidate = NormalisedCidr::from_parts(parent.version(), current, prefix)?;
        let conflict_end = placed
            .iter()
            .filter(|block| classify_overlap(&candidate, block).is_some())
            .map(|block| block.last())
            .max();

        let Some(conflict_end) = conflict_end else {
            return Ok(Some(candidate));
        };

        // Both ends are block-aligned at least to `prefix`, so the next
        // address starts a valid candidate.
        let skip_to = conflict_end.max(candidate.last());
        if skip_to >= parent.last() {
            return Ok(None);
        }
        current = skip_to + 1;
    }
}

/// Allocate every request inside `parent`, avoiding `reserved` blocks.
///
/// Results come back in the order of `requests`. A request that does not fit
/// is reported with `allocated: false` rather than failing the batch.
pub fn allocate_vlsm(
    parent: &NormalisedCidr,
    requests: &[VlsmRequest],
    strategy: VlsmStrategy,
    reserved: &[NormalisedCidr],
) -> Result<Vec<VlsmAllocation>> {
    if let Some(outside) = reserved.iter().find(|r| !contains_prefix(parent, r)) {
        return Err(Error::domain(format!(
            "reserved block {outside} is not inside {parent}"
        )));
    }

    let prefixes: Vec<Option<u8>> = requests
        .iter()
        .map(|request| required_prefix(parent, request))
        .collect::<Result<_>>()?;

    let mut results: Vec<Option<VlsmAllocation>> = vec![None; requests.len()];
    let mut order: Vec<(usize, u8)> = Vec::with_capacity(requests.len());
    for (i, (request, prefix)) in requests.iter().zip(&prefixes).enumerate() {
        match prefix {
            Some(prefix) => order.push((i, *prefix)),
            None => {
                log::warn!(
                    "VLSM: '{}' does not fit in any {} block",
                    request.name,
                    parent.version()
                );
                results[i] = Some(VlsmAllocation {
                    name: request.name.clone(),
                    cidr: None,
                    requested_prefix: request.required_prefix.unwrap_or(0),
                    metadata: request.metadata.clone(),
                    allocated: false,
                });
            }
        }
    }

    match strategy {
        VlsmStrategy::LargestFirst
        | VlsmStrategy::PackedLow
        | VlsmStrategy::PackedHigh
        | VlsmStrategy::Balanced => order.sort_by_key(|&(_, prefix)| prefix),
        VlsmStrategy::SmallestFirst => order.sort_by_key(|&(_, prefix)| Reverse(prefix)),
    }

    let mut placed: Vec<NormalisedCidr> = reserved.to_vec();

    for (i, prefix) in order {
        let request = &requests[i];
        let cidr = find_first_fit(parent, prefix, &placed)?;
        match cidr {
            Some(block) => {
                log::debug!("VLSM: '{}' -> {block}", request.name);
                placed.push(block);
            }
            None => log::warn!(
                "VLSM: no room for '{}' (/{prefix}) in {parent}",
                request.name
            ),
        }
        results[i] = Some(VlsmAllocation {
            name: request.name.clone(),
            cidr,
            requested_prefix: prefix,
            metadata: request.metadata.clone(),
            allocated: cidr.is_some(),
        });
    }

    let allocations: Vec<VlsmAllocation> = results.into_iter().flatten().collect();
    log::info!(
        "VLSM {parent} ({strategy}): {}/{} request(s) allocated",
        allocations.iter().filter(|a| a.allocated).count(),
        allocations.len()
    );
    Ok(allocations)
}

/// Check a block against an [`AllocationPolicy`], collecting every violation.
pub fn validate_allocation_policy(
    cidr: &NormalisedCidr,
    policy: &AllocationPolicy,
) -> Result<PolicyReport> {
    let prefix = cidr.prefix();
    let mut violations = Vec::new();

    if let Some(min) = policy.min_prefix {
        if prefix < min {
            violations.push(PolicyViolation::PrefixTooShort { prefix, min });
        }
    }
    if let Some(max) = policy.max_prefix {
        if prefix > max {
            violations.push(PolicyViolation::PrefixTooLong { prefix, max });
        }
    }
    if let Some(allowed) = &policy.allowed_prefixes {
        if !allowed.contains(&prefix) {
            violations.push(PolicyViolation::PrefixNotAllowed { prefix });
        }
    }
    for forbidden in &policy.forbidden_ranges {
        if classify_overlap(cidr, forbidden).is_some() {
            violations.push(PolicyViolation::ForbiddenOverlap {
                forbidden: *forbidden,
            });
        }
    }
    if let Some(alignment_prefix) = policy.alignment_prefix {
        if cidr.network() & wildcard(alignment_prefix, cidr.bits())? != 0 {
            violations.push(PolicyViolation::Misaligned { alignment_prefix });
        }
    }

    Ok(PolicyReport {
        cidr: *cidr,
        violations,
    })
}

/// Address-space usage of `parent` by the allocated entries of `allocations`.
///
/// Fragmentation is the naive count of allocated blocks.
pub fn calculate_utilization(
    parent: &NormalisedCidr,
    allocations: &[VlsmAllocation],
) -> Result<Utilization> {
    let blocks: Vec<NormalisedCidr> = allocations
        .iter()
        .filter_map(|a| a.cidr)
        .filter(|c| contains_prefix(parent, c))
        .collect();

    // Summarize first so overlapping entries are not counted twice.
    let covered = summarize_prefixes(&blocks)?;
    let allocated = covered.iter().try_fold(AddressCount::Exact(0), |acc, c| {
        acc.checked_add(AddressCount::from_host_bits(c.host_bits()))
            .ok_or_else(|| Error::range(format!("allocated space of {parent} overflows")))
    })?;

    let total = AddressCount::from_host_bits(parent.host_bits());
    let free = total.saturating_sub(allocated);
    let utilization_percent = allocated.to_f64() / total.to_f64() * 100.0;
    let free_blocks = find_free_blocks(parent, &covered)?;

    Ok(Utilization {
        parent: *parent,
        total,
        allocated,
        free,
        utilization_percent,
        fragmentation: blocks.len(),
        free_blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::parse_cidr;
    use crate::processing::detect_overlaps;
    use std::collections::BTreeSet;

    fn cidr(s: &str) -> NormalisedCidr {
        parse_cidr(s).unwrap()
    }

    fn allocated_texts(allocations: &[VlsmAllocation]) -> Vec<String> {
        allocations
            .iter()
            .map(|a| a.cidr.map(|c| c.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_allocate_largest_first() {
        let requests = vec![
            VlsmRequest::hosts("a", 50),
            VlsmRequest::hosts("b", 25),
            VlsmRequest::hosts("c", 10),
        ];
        let result = allocate_vlsm(
            &cidr("192.168.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert!(result.iter().all(|a| a.allocated));
        assert_eq!(
            allocated_texts(&result),
            vec!["192.168.0.0/26", "192.168.0.64/27", "192.168.0.96/28"]
        );
        let blocks: Vec<NormalisedCidr> = result.iter().filter_map(|a| a.cidr).collect();
        assert!(!detect_overlaps(&blocks).has_overlap);
    }

    #[test]
    fn test_allocate_keeps_input_order() {
        let requests = vec![
            VlsmRequest::hosts("small", 10),
            VlsmRequest::hosts("big", 100),
        ];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(result[0].name, "small");
        assert_eq!(result[1].name, "big");
        assert_eq!(allocated_texts(&result), vec!["10.0.0.128/28", "10.0.0.0/25"]);
    }

    #[test]
    fn test_allocate_smallest_first() {
        let requests = vec![
            VlsmRequest::hosts("big", 100),
            VlsmRequest::hosts("small", 10),
        ];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::SmallestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(allocated_texts(&result), vec!["10.0.0.128/25", "10.0.0.0/28"]);
    }

    #[test]
    fn test_allocate_stable_for_equal_sizes() {
        let requests = vec![
            VlsmRequest::prefix("first", 26),
            VlsmRequest::prefix("second", 26),
            VlsmRequest::prefix("third", 26),
        ];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::SmallestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(
            allocated_texts(&result),
            vec!["10.0.0.0/26", "10.0.0.64/26", "10.0.0.128/26"]
        );
    }

    #[test]
    fn test_allocate_respects_reserved() {
        let requests = vec![VlsmRequest::prefix("a", 26), VlsmRequest::prefix("b", 25)];
        let reserved = vec![cidr("10.0.0.0/26"), cidr("10.0.0.192/27")];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &reserved,
        )
        .unwrap();
        // the /25 cannot start at .0 (reserved) nor at .128 (reserved /27)
        assert!(!result[1].allocated);
        assert_eq!(result[1].cidr, None);
        assert_eq!(result[1].requested_prefix, 25);
        assert_eq!(result[0].cidr, Some(cidr("10.0.0.64/26")));
    }

    #[test]
    fn test_allocate_partial_failure() {
        let requests = vec![
            VlsmRequest::hosts("a", 200),
            VlsmRequest::hosts("b", 100),
            VlsmRequest::hosts("c", 2),
        ];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert!(result[0].allocated);
        assert!(!result[1].allocated);
        assert!(!result[2].allocated);
    }

    #[test]
    fn test_allocate_larger_than_parent() {
        let requests = vec![VlsmRequest::prefix("too-big", 16)];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert!(!result[0].allocated);
    }

    #[test]
    fn test_allocate_ipv6() {
        let requests = vec![
            VlsmRequest::prefix("lan", 64),
            VlsmRequest::hosts("p2p", 2),
            VlsmRequest::prefix("dmz", 64),
        ];
        let result = allocate_vlsm(
            &cidr("2001:db8::/48"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[cidr("2001:db8::/64")],
        )
        .unwrap();
        assert_eq!(
            allocated_texts(&result),
            vec!["2001:db8:0:1::/64", "2001:db8:0:3::/127", "2001:db8:0:2::/64"]
        );
    }

    #[test]
    fn test_allocate_errors() {
        let parent = cidr("10.0.0.0/24");
        let err = allocate_vlsm(
            &parent,
            &[VlsmRequest::hosts("a", 10)],
            VlsmStrategy::LargestFirst,
            &[cidr("10.0.1.0/28")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        let empty = VlsmRequest {
            name: "empty".to_string(),
            ..Default::default()
        };
        let err = allocate_vlsm(&parent, &[empty], VlsmStrategy::LargestFirst, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

    }

    #[test]
    fn test_allocate_unfittable_requests_stay_in_batch() {
        let requests = vec![
            VlsmRequest::hosts("ok", 10),
            VlsmRequest::hosts("huge", 5_000_000_000),
            VlsmRequest::prefix("bad", 33),
        ];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(result.len(), 3);
        assert!(result[0].allocated);
        assert_eq!(result[0].cidr, Some(cidr("10.0.0.0/28")));
        assert_eq!(result[1].name, "huge");
        assert!(!result[1].allocated);
        assert_eq!(result[1].cidr, None);
        assert_eq!(result[1].requested_prefix, 0);
        assert!(!result[2].allocated);
        assert_eq!(result[2].requested_prefix, 33);

        // a whole-space parent must not absorb an oversized host count
        let result = allocate_vlsm(
            &cidr("0.0.0.0/0"),
            &[VlsmRequest::hosts("huge", 5_000_000_000)],
            VlsmStrategy::SmallestFirst,
            &[],
        )
        .unwrap();
        assert!(!result[0].allocated);
    }

    #[test]
    fn test_allocate_zero_hosts() {
        let requests = vec![VlsmRequest::hosts("zero", 0), VlsmRequest::hosts("ok", 10)];
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &requests,
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(allocated_texts(&result), vec!["10.0.0.16/31", "10.0.0.0/28"]);

        let result = allocate_vlsm(
            &cidr("2001:db8::/64"),
            &[VlsmRequest::hosts("zero", 0)],
            VlsmStrategy::LargestFirst,
            &[],
        )
        .unwrap();
        assert_eq!(allocated_texts(&result), vec!["2001:db8::/128"]);
    }

    #[test]
    fn test_allocate_carries_metadata() {
        let request = VlsmRequest::hosts("web", 20).with_metadata("vlan", serde_json::json!(10));
        let result = allocate_vlsm(
            &cidr("10.0.0.0/24"),
            &[request],
            VlsmStrategy::Balanced,
            &[],
        )
        .unwrap();
        assert_eq!(result[0].metadata["vlan"], 10);
    }

    #[test]
    fn test_validate_allocation_policy() {
        let policy = AllocationPolicy {
            min_prefix: Some(24),
            max_prefix: Some(28),
            allowed_prefixes: Some(BTreeSet::from([24, 26, 28])),
            forbidden_ranges: vec![cidr("10.0.0.0/25")],
            alignment_prefix: Some(26),
        };
        let report = validate_allocation_policy(&cidr("10.0.1.0/26"), &policy).unwrap();
        assert!(report.is_valid());

        let report = validate_allocation_policy(&cidr("10.0.0.16/28"), &policy).unwrap();
        assert_eq!(
            report.violations,
            vec![
                PolicyViolation::ForbiddenOverlap {
                    forbidden: cidr("10.0.0.0/25")
                },
                PolicyViolation::Misaligned {
                    alignment_prefix: 26
                },
            ]
        );

        let report = validate_allocation_policy(&cidr("10.0.0.0/30"), &policy).unwrap();
        assert!(report
            .violations
            .contains(&PolicyViolation::PrefixTooLong { prefix: 30, max: 28 }));
        assert!(report
            .violations
            .contains(&PolicyViolation::PrefixNotAllowed { prefix: 30 }));

        let report = validate_allocation_policy(&cidr("10.0.0.0/16"), &policy).unwrap();
        assert!(report
            .violations
            .contains(&PolicyViolation::PrefixTooShort { prefix: 16, min: 24 }));
    }

    #[test]
    fn test_calculate_utilization() {
        let parent = cidr("10.0.0.0/24");
        let requests = vec![VlsmRequest::prefix("a", 26), VlsmRequest::prefix("b", 27)];
        let allocations =
            allocate_vlsm(&parent, &requests, VlsmStrategy::LargestFirst, &[]).unwrap();
        let usage = calculate_utilization(&parent, &allocations).unwrap();
        assert_eq!(usage.total, AddressCount::Exact(256));
        assert_eq!(usage.allocated, AddressCount::Exact(96));
        assert_eq!(usage.free, AddressCount::Exact(160));
        assert_eq!(usage.fragmentation, 2);
        assert!((usage.utilization_percent - 37.5).abs() < 1e-9);
        let free: Vec<String> = usage.free_blocks.iter().map(|c| c.to_string()).collect();
        assert_eq!(free, vec!["10.0.0.96/27", "10.0.0.128/25"]);
    }

    #[test]
    fn test_calculate_utilization_full_ipv6_space() {
        let parent = cidr("::/0");
        let allocations = vec![VlsmAllocation {
            name: "all".to_string(),
            cidr: Some(parent),
            requested_prefix: 0,
            metadata: Default::default(),
            allocated: true,
        }];
        let usage = calculate_utilization(&parent, &allocations).unwrap();
        assert_eq!(usage.allocated, AddressCount::FullV6Space);
        assert_eq!(usage.free, AddressCount::Exact(0));
        assert!(usage.free_blocks.is_empty());
    }
}

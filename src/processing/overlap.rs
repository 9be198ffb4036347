//! Containment, overlap detection and set operations over CIDR blocks.
//!
//! Two canonical CIDR blocks are always either nested or disjoint; the
//! `Partial` classification only exists for completeness of the report type.

use crate::models::{parse_address, NormalisedCidr};
use itertools::Itertools;
use serde::Serialize;

/// How two overlapping blocks relate.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapKind {
    Identical,
    AContainsB,
    BContainsA,
    Partial,
}

/// One overlapping pair found by [`detect_overlaps`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OverlapPair {
    pub a: NormalisedCidr,
    pub b: NormalisedCidr,
    pub kind: OverlapKind,
}

/// All overlapping pairs of a list of blocks.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlapResult {
    pub pairs: Vec<OverlapPair>,
    pub has_overlap: bool,
}

/// Whether the text address lies inside `cidr`.
///
/// Malformed text or an address of the other family yields `false`.
pub fn contains_ip(cidr: &NormalisedCidr, ip_text: &str) -> bool {
    match parse_address(ip_text) {
        Ok((version, addr)) => version == cidr.version() && cidr.contains_address(addr),
        Err(e) => {
            log::warn!("contains_ip: ignoring unparseable address '{ip_text}': {e}");
            false
        }
    }
}

/// Whether `b` lies entirely within `a`.
pub fn contains_prefix(a: &NormalisedCidr, b: &NormalisedCidr) -> bool {
    if a.version() != b.version() || a.prefix() > b.prefix() {
        return false;
    }
    a.network() <= b.network() && b.last() <= a.last()
}

fn ranges_intersect(a: &NormalisedCidr, b: &NormalisedCidr) -> bool {
    a.version() == b.version() && a.network() <= b.last() && b.network() <= a.last()
}

/// Classify the relation of two blocks, `None` if they do not overlap.
pub fn classify_overlap(a: &NormalisedCidr, b: &NormalisedCidr) -> Option<OverlapKind> {
    if !ranges_intersect(a, b) {
        return None;
    }
    let kind = if a.network() == b.network() && a.prefix() == b.prefix() {
        OverlapKind::Identical
    } else if contains_prefix(a, b) {
        OverlapKind::AContainsB
    } else if contains_prefix(b, a) {
        OverlapKind::BContainsA
    } else {
        OverlapKind::Partial
    };
    Some(kind)
}

/// Compare every pair of blocks and report the overlapping ones.
///
/// This is an all-pairs O(n²) scan, fine for the few hundred blocks of a
/// typical plan.
pub fn detect_overlaps(cidrs: &[NormalisedCidr]) -> OverlapResult {
    let pairs: Vec<OverlapPair> = cidrs
        .iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            classify_overlap(a, b).map(|kind| OverlapPair { a: *a, b: *b, kind })
        })
        .collect();

    if !pairs.is_empty() {
        log::warn!(
            "Found {} overlapping pair(s) among {} block(s)",
            pairs.len(),
            cidrs.len()
        );
    }

    OverlapResult {
        has_overlap: !pairs.is_empty(),
        pairs,
    }
}

/// Whether two equal-sized blocks touch end to start.
pub fn are_adjacent(a: &NormalisedCidr, b: &NormalisedCidr) -> bool {
    if a.version() != b.version() || a.prefix() != b.prefix() {
        return false;
    }
    let touches = |first: &NormalisedCidr, second: &NormalisedCidr| {
        first.last().checked_add(1) == Some(second.network())
    };
    touches(a, b) || touches(b, a)
}

/// Whether two distinct blocks are the two halves of one parent.
///
/// Sharing a parent is not enough: a block is never mergeable with itself,
/// so this agrees with [`merge_siblings`](super::merge_siblings).
pub fn can_merge(a: &NormalisedCidr, b: &NormalisedCidr) -> bool {
    if a.version() != b.version() || a.prefix() != b.prefix() || a.prefix() == 0 {
        return false;
    }
    a.network() != b.network() && a.parent() == b.parent()
}

/// Union of two lists, de-duplicated, in first-seen order.
///
/// Adjacent blocks are not merged; run
/// [`summarize_prefixes`](super::summarize_prefixes) for that.
pub fn union_prefixes(a: &[NormalisedCidr], b: &[NormalisedCidr]) -> Vec<NormalisedCidr> {
    a.iter().chain(b.iter()).copied().unique().collect()
}

/// Intersection of two blocks.
///
/// Nested blocks yield the more specific one. For a partial overlap the
/// result is approximated by the longer prefix anchored at the start of the
/// overlap; aligned CIDR blocks never reach that branch.
pub fn intersect_prefixes(a: &NormalisedCidr, b: &NormalisedCidr) -> Option<NormalisedCidr> {
    if !ranges_intersect(a, b) {
        return None;
    }
    if contains_prefix(a, b) {
        return Some(*b);
    }
    if contains_prefix(b, a) {
        return Some(*a);
    }
    let start = a.network().max(b.network());
    let prefix = a.prefix().max(b.prefix());
    NormalisedCidr::from_parts(a.version(), start, prefix).ok()
}

/// Blocks covering `a` minus `b`, ascending.
///
/// When `a` strictly contains `b`, `a` is split down towards `b` and every
/// half that does not hold `b` is kept, so the result is exact.
pub fn difference_prefixes(a: &NormalisedCidr, b: &NormalisedCidr) -> Vec<NormalisedCidr> {
    if contains_prefix(b, a) {
        return Vec::new();
    }
    if !ranges_intersect(a, b) {
        return vec![*a];
    }

    let mut remainder = Vec::new();
    let mut current = *a;
    while current.prefix() < b.prefix() {
        let Some((left, right)) = current.children() else {
            break;
        };
        if contains_prefix(&left, b) {
            remainder.push(right);
            current = left;
        } else {
            remainder.push(left);
            current = right;
        }
    }
    remainder.sort();
    log::debug!("{a} minus {b} -> {} block(s)", remainder.len());
    remainder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_cidr;

    fn cidr(s: &str) -> NormalisedCidr {
        parse_cidr(s).unwrap()
    }

    #[test]
    fn test_contains_ip() {
        let net = cidr("192.168.1.0/24");
        assert!(contains_ip(&net, "192.168.1.0"));
        assert!(contains_ip(&net, "192.168.1.255"));
        assert!(!contains_ip(&net, "192.168.2.0"));
        assert!(!contains_ip(&net, "not-an-ip"));
        assert!(!contains_ip(&net, "::1"));
        assert!(contains_ip(&cidr("2001:db8::/32"), "2001:db8:ffff::1"));
    }

    #[test]
    fn test_contains_prefix() {
        let big = cidr("10.0.0.0/8");
        let small = cidr("10.20.0.0/16");
        assert!(contains_prefix(&big, &small));
        assert!(!contains_prefix(&small, &big));
        assert!(contains_prefix(&big, &big));
        assert!(!contains_prefix(&big, &cidr("11.0.0.0/16")));
        assert!(!contains_prefix(&cidr("::/0"), &small));
    }

    #[test]
    fn test_detect_overlaps() {
        let cidrs = vec![
            cidr("10.0.0.0/16"),
            cidr("10.0.1.0/24"),
            cidr("10.0.1.0/24"),
            cidr("192.168.0.0/24"),
            cidr("::/0"),
        ];
        let result = detect_overlaps(&cidrs);
        assert!(result.has_overlap);
        assert_eq!(result.pairs.len(), 3);
        assert_eq!(result.pairs[0].kind, OverlapKind::AContainsB);
        assert_eq!(result.pairs[1].kind, OverlapKind::AContainsB);
        assert_eq!(result.pairs[2].kind, OverlapKind::Identical);

        let result = detect_overlaps(&[cidr("10.0.1.0/24"), cidr("10.0.0.0/16")]);
        assert_eq!(result.pairs[0].kind, OverlapKind::BContainsA);

        let result = detect_overlaps(&[cidr("10.0.0.0/24"), cidr("10.0.1.0/24")]);
        assert!(!result.has_overlap);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn test_are_adjacent() {
        assert!(are_adjacent(&cidr("10.0.0.0/24"), &cidr("10.0.1.0/24")));
        assert!(are_adjacent(&cidr("10.0.2.0/24"), &cidr("10.0.1.0/24")));
        assert!(!are_adjacent(&cidr("10.0.0.0/24"), &cidr("10.0.2.0/24")));
        assert!(!are_adjacent(&cidr("10.0.0.0/24"), &cidr("10.0.1.0/25")));
        assert!(!are_adjacent(
            &cidr("255.255.255.0/24"),
            &cidr("255.255.255.0/24")
        ));
    }

    #[test]
    fn test_can_merge() {
        assert!(can_merge(&cidr("10.0.0.0/24"), &cidr("10.0.1.0/24")));
        assert!(!can_merge(&cidr("10.0.1.0/24"), &cidr("10.0.2.0/24")));
        assert!(!can_merge(&cidr("10.0.0.0/24"), &cidr("10.0.0.0/24")));
        assert!(!can_merge(&cidr("0.0.0.0/0"), &cidr("0.0.0.0/0")));
    }

    #[test]
    fn test_union_prefixes() {
        let a = vec![cidr("10.0.0.0/24"), cidr("10.0.1.0/24")];
        let b = vec![cidr("10.0.1.0/24"), cidr("10.0.2.0/24")];
        let union = union_prefixes(&a, &b);
        assert_eq!(
            union,
            vec![cidr("10.0.0.0/24"), cidr("10.0.1.0/24"), cidr("10.0.2.0/24")]
        );
    }

    #[test]
    fn test_intersect_prefixes() {
        let big = cidr("10.0.0.0/8");
        let small = cidr("10.1.0.0/16");
        assert_eq!(intersect_prefixes(&big, &small), Some(small));
        assert_eq!(intersect_prefixes(&small, &big), Some(small));
        assert_eq!(intersect_prefixes(&big, &cidr("11.0.0.0/8")), None);
        assert_eq!(intersect_prefixes(&big, &cidr("::/0")), None);
    }

    #[test]
    fn test_difference_prefixes() {
        let a = cidr("10.0.0.0/24");
        assert!(difference_prefixes(&a, &cidr("10.0.0.0/16")).is_empty());
        assert!(difference_prefixes(&a, &a).is_empty());
        assert_eq!(difference_prefixes(&a, &cidr("10.0.1.0/24")), vec![a]);

        let rest = difference_prefixes(&a, &cidr("10.0.0.64/26"));
        let rest: Vec<String> = rest.iter().map(|c| c.to_string()).collect();
        assert_eq!(rest, vec!["10.0.0.0/26", "10.0.0.128/25"]);

        let rest = difference_prefixes(&a, &cidr("10.0.0.255/32"));
        assert_eq!(rest.len(), 8);
        assert_eq!(rest[0], cidr("10.0.0.0/25"));
        assert_eq!(rest[7], cidr("10.0.0.254/32"));
    }
}

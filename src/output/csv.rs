//! CSV output formatting for calculator results.

use crate::error::Result;
use crate::models::{subnet_meta, NormalisedCidr, SubnetMeta, Utilization, VlsmAllocation};
use crate::processing::{AddressClass, OverlapPair, OverlapResult};
use colored::Colorize;
use std::collections::BTreeSet;

use super::terminal::{format_field, note_tag};

pub const CIDR_HEADER: &str =
    r#""cnt",          "cidr",   "first_usable",    "last_usable",  "usable""#;
pub const ALLOCATION_HEADER: &str =
    r#""cnt",         "name",           "cidr",   "req",  "status",  "usable""#;
pub const OVERLAP_HEADER: &str = r#""cnt",              "a",              "b",          "kind""#;

/// `field,value` rows describing one block.
pub fn meta_rows(meta: &SubnetMeta) -> Vec<String> {
    let mut fields: Vec<(&str, String)> = vec![
        ("cidr", meta.cidr.clone()),
        ("version", meta.version.to_string()),
        ("prefix", meta.prefix.to_string()),
        ("network", meta.network.clone()),
    ];
    if let Some(broadcast) = &meta.broadcast {
        fields.push(("broadcast", broadcast.clone()));
    }
    fields.extend([
        ("last_address", meta.last_address.clone()),
        ("netmask", meta.netmask.clone()),
        ("wildcard", meta.wildcard.clone()),
        ("address_count", meta.address_count.to_string()),
        ("usable_count", meta.usable_count.to_string()),
        ("first_usable", meta.first_usable.clone()),
        ("last_usable", meta.last_usable.clone()),
        ("reverse_dns_zone", meta.reverse_dns_zone.clone()),
    ]);

    fields
        .into_iter()
        .map(|(name, value)| format!("{},{}", format_field(name, 18), format_field(value, 20)))
        .collect()
}

/// One row per block with its usable range.
pub fn cidr_row(cnt: usize, cidr: &NormalisedCidr) -> Result<String> {
    let meta = subnet_meta(cidr)?;
    Ok(format!(
        "{cnt},{cidr},{first},{last},{usable}",
        cnt = format_field(cnt, 5),
        cidr = format_field(cidr, 18),
        first = format_field(&meta.first_usable, 16),
        last = format_field(&meta.last_usable, 16),
        usable = format_field(&meta.usable_count, 8),
    ))
}

pub fn allocation_row(cnt: usize, allocation: &VlsmAllocation) -> Result<String> {
    let (cidr, usable) = match &allocation.cidr {
        Some(cidr) => (cidr.to_string(), subnet_meta(cidr)?.usable_count.to_string()),
        None => ("-".to_string(), "0".to_string()),
    };
    let status = if allocated_ok(allocation) {
        "allocated"
    } else {
        "UNALLOCATED"
    };
    Ok(format!(
        "{cnt},{name},{cidr},{req},{status},{usable}",
        cnt = format_field(cnt, 5),
        name = format_field(&allocation.name, 14),
        cidr = format_field(cidr, 18),
        req = format_field(format!("/{}", allocation.requested_prefix), 6),
        status = format_field(status, 13),
        usable = format_field(usable, 8),
    ))
}

pub fn overlap_row(cnt: usize, pair: &OverlapPair) -> String {
    let kind = serde_json::to_value(pair.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", pair.kind));
    format!(
        "{cnt},{a},{b},{kind}",
        cnt = format_field(cnt, 5),
        a = format_field(pair.a, 16),
        b = format_field(pair.b, 16),
        kind = format_field(kind, 14),
    )
}

fn allocated_ok(allocation: &VlsmAllocation) -> bool {
    allocation.allocated && allocation.cidr.is_some()
}

pub fn print_meta(meta: &SubnetMeta, binary: &str) {
    println!(r#""field",             "value""#);
    for row in meta_rows(meta) {
        println!("{row}");
    }
    println!("{},{}", format_field("binary", 18), format_field(binary, 20));
}

pub fn print_cidrs(cidrs: &[NormalisedCidr]) -> Result<()> {
    println!("{CIDR_HEADER}");
    for (i, cidr) in cidrs.iter().enumerate() {
        println!("{}", cidr_row(i + 1, cidr)?);
    }
    println!("#{}# {} block(s)", note_tag("NOTE", false), cidrs.len());
    Ok(())
}

pub fn print_allocations(allocations: &[VlsmAllocation], usage: &Utilization) -> Result<()> {
    println!("{ALLOCATION_HEADER}");
    for (i, allocation) in allocations.iter().enumerate() {
        let row = allocation_row(i + 1, allocation)?;
        if allocated_ok(allocation) {
            println!("{row}");
        } else {
            println!("{}", row.red());
        }
    }

    let failed = allocations.iter().filter(|a| !allocated_ok(a)).count();
    println!(
        "#{}# {parent}: {allocated}/{total} addresses used ({percent:.2}%), {failed} request(s) not allocated",
        note_tag(if failed > 0 { "WARN" } else { "NOTE" }, failed > 0),
        parent = usage.parent,
        allocated = usage.allocated,
        total = usage.total,
        percent = usage.utilization_percent,
    );
    for block in &usage.free_blocks {
        println!("#free# {block}");
    }
    Ok(())
}

pub fn print_overlaps(result: &OverlapResult) {
    println!("{OVERLAP_HEADER}");
    for (i, pair) in result.pairs.iter().enumerate() {
        println!("{}", overlap_row(i + 1, pair).yellow());
    }
    println!(
        "#{}# {} overlapping pair(s)",
        note_tag(if result.has_overlap { "WARN" } else { "NOTE" }, result.has_overlap),
        result.pairs.len()
    );
}

pub fn print_classes(address: &str, classes: &BTreeSet<AddressClass>) {
    let names: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
    println!(
        "{},{}",
        format_field(address, 20),
        format_field(names.join(" "), 16)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_cidr, Metadata};
    use crate::processing::detect_overlaps;

    fn cidr(s: &str) -> NormalisedCidr {
        parse_cidr(s).unwrap()
    }

    #[test]
    fn test_meta_rows_ipv4() {
        let rows = meta_rows(&subnet_meta(&cidr("192.168.1.0/24")).unwrap());
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0], r#"            "cidr",    "192.168.1.0/24""#);
        assert!(rows.iter().any(|r| r.contains(r#""broadcast""#)));
        assert!(rows.iter().any(|r| r.ends_with(r#""254""#)));
    }

    #[test]
    fn test_meta_rows_ipv6_has_no_broadcast() {
        let rows = meta_rows(&subnet_meta(&cidr("2001:db8::/64")).unwrap());
        assert_eq!(rows.len(), 12);
        assert!(!rows.iter().any(|r| r.contains("broadcast")));
    }

    #[test]
    fn test_cidr_row() {
        assert_eq!(
            cidr_row(1, &cidr("10.0.0.0/30")).unwrap(),
            r#"  "1",     "10.0.0.0/30",      "10.0.0.1",      "10.0.0.2",     "2""#
        );
    }

    #[test]
    fn test_allocation_row() {
        let allocation = VlsmAllocation {
            name: "web".to_string(),
            cidr: Some(cidr("10.0.0.0/26")),
            requested_prefix: 26,
            metadata: Metadata::new(),
            allocated: true,
        };
        let row = allocation_row(1, &allocation).unwrap();
        assert!(row.contains(r#""10.0.0.0/26""#));
        assert!(row.contains(r#""allocated""#));
        assert!(row.ends_with(r#""62""#));

        let missing = VlsmAllocation {
            cidr: None,
            allocated: false,
            ..allocation
        };
        let row = allocation_row(2, &missing).unwrap();
        assert!(row.contains(r#""UNALLOCATED""#));
        assert!(row.contains(r#""-""#));
    }

    #[test]
    fn test_overlap_row() {
        let result = detect_overlaps(&[cidr("10.0.0.0/16"), cidr("10.0.1.0/24")]);
        let row = overlap_row(1, &result.pairs[0]);
        assert!(row.ends_with(r#""A_CONTAINS_B""#));
    }
}

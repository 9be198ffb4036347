//! Value types and the arithmetic that builds them.
//!
//! - [`address`] - IPv4/IPv6 text codec
//! - [`prefix`] - mask and block arithmetic
//! - [`cidr`] - [`NormalisedCidr`] and its parsers
//! - [`meta`] - [`SubnetMeta`] derivation
//! - [`vlsm`] - VLSM request/result and policy records

mod address;
mod cidr;
mod meta;
mod prefix;
mod vlsm;

// Re-export public types
pub use address::{
    format_address, format_ipv4, format_ipv6, parse_address, parse_ipv4, parse_ipv6, IpVersion,
    IPV4_BITS, IPV6_BITS,
};
pub use cidr::{
    format_cidr, parse_cidr, parse_cidr_input, parse_cidr_with_netmask, range_to_minimal_prefixes,
    range_to_prefixes, NormalisedCidr, Subnets,
};
pub use meta::{
    binary_with_prefix, compute_meta, reverse_dns_zone, subnet_meta, AddressCount, SubnetMeta,
};
pub use prefix::{alignment_prefix, last_of, mask, network_of, next_block, wildcard};
pub use vlsm::{
    AllocationPolicy, Metadata, PolicyReport, PolicyViolation, Utilization, VlsmAllocation,
    VlsmRequest, VlsmStrategy,
};

pub(crate) use prefix::ceil_log2;

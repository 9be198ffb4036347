//! CIDR subnet calculator for IPv4 and IPv6.
//!
//! Parses and normalises CIDR text, derives per-block metadata, splits and
//! summarizes blocks, reasons about overlap and containment, and packs named
//! requests into a parent block (VLSM).
//!
//! ```
//! use cidr_subnet_calc::{parse_cidr, subnet_meta};
//!
//! let cidr = parse_cidr("192.168.1.77/24").unwrap();
//! assert_eq!(cidr.to_string(), "192.168.1.0/24");
//! assert_eq!(subnet_meta(&cidr).unwrap().usable_count.to_string(), "254");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod processing;

pub use error::{Error, ErrorKind, Result};
pub use models::{
    format_cidr, parse_address, parse_cidr, parse_cidr_input, parse_cidr_with_netmask,
    range_to_minimal_prefixes, subnet_meta, AddressCount, IpVersion, NormalisedCidr, SubnetMeta,
    VlsmAllocation, VlsmRequest, VlsmStrategy,
};
pub use processing::{
    allocate_vlsm, classify_address, contains_ip, contains_prefix, detect_overlaps,
    minimal_covering_supernet, split_by_host_count, split_into_n, summarize_prefixes,
};

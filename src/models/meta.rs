//! Derived subnet metadata: masks, usable range, counts and reverse DNS.

use super::address::IpVersion;
use super::cidr::{render_address, NormalisedCidr};
use super::prefix::wildcard;
use crate::error::Result;
use serde::{Serialize, Serializer};
use std::fmt;

/// An address count between 0 and 2^128 inclusive.
///
/// `::/0` holds exactly 2^128 addresses, one more than `u128::MAX`, so that
/// single value gets its own variant instead of pulling in a bignum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressCount {
    Exact(u128),
    FullV6Space,
}

impl AddressCount {
    /// Count of a block with `host_bits` host bits (`2^host_bits`).
    pub fn from_host_bits(host_bits: u8) -> AddressCount {
        if host_bits >= 128 {
            AddressCount::FullV6Space
        } else {
            AddressCount::Exact(1u128 << host_bits)
        }
    }

    /// The count as a `u128`, `None` for 2^128.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            AddressCount::Exact(n) => Some(*n),
            AddressCount::FullV6Space => None,
        }
    }

    pub fn checked_add(self, other: AddressCount) -> Option<AddressCount> {
        match (self, other) {
            (AddressCount::Exact(a), AddressCount::Exact(b)) => match a.checked_add(b) {
                Some(sum) => Some(AddressCount::Exact(sum)),
                // a + b == 2^128 exactly wraps to zero
                None if a.wrapping_add(b) == 0 => Some(AddressCount::FullV6Space),
                None => None,
            },
            (AddressCount::FullV6Space, AddressCount::Exact(0))
            | (AddressCount::Exact(0), AddressCount::FullV6Space) => {
                Some(AddressCount::FullV6Space)
            }
            _ => None,
        }
    }

    /// `self - other`, clamped at zero.
    pub fn saturating_sub(self, other: AddressCount) -> AddressCount {
        match (self, other) {
            (AddressCount::Exact(a), AddressCount::Exact(b)) => {
                AddressCount::Exact(a.saturating_sub(b))
            }
            (AddressCount::FullV6Space, AddressCount::Exact(0)) => AddressCount::FullV6Space,
            (AddressCount::FullV6Space, AddressCount::Exact(b)) => {
                AddressCount::Exact(u128::MAX - b + 1)
            }
            (_, AddressCount::FullV6Space) => AddressCount::Exact(0),
        }
    }

    /// Lossy conversion for ratios and percentages.
    pub fn to_f64(&self) -> f64 {
        match self {
            AddressCount::Exact(n) => *n as f64,
            AddressCount::FullV6Space => 2f64.powi(128),
        }
    }
}

impl fmt::Display for AddressCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressCount::Exact(n) => write!(f, "{n}"),
            AddressCount::FullV6Space => write!(f, "340282366920938463463374607431768211456"),
        }
    }
}

// Serialized as a decimal string; JSON numbers lose precision past 2^53.
impl Serialize for AddressCount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Snapshot of everything derivable from a CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetMeta {
    /// Canonical `network/prefix` text.
    pub cidr: String,
    pub version: IpVersion,
    pub prefix: u8,
    pub network: String,
    /// IPv4 only; IPv6 has no broadcast address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<String>,
    pub last_address: String,
    pub netmask: String,
    pub wildcard: String,
    pub address_count: AddressCount,
    pub usable_count: AddressCount,
    pub first_usable: String,
    pub last_usable: String,
    pub reverse_dns_zone: String,
}

/// Compute metadata for the block `network/prefix` of the given family.
///
/// Host bits of `network` are cleared first. IPv4 reserves the network and
/// broadcast addresses except on /31 (RFC 3021) and /32; IPv6 reserves none.
pub fn compute_meta(network: u128, prefix: u8, version: IpVersion) -> Result<SubnetMeta> {
    let cidr = NormalisedCidr::from_parts(version, network, prefix)?;
    let bits = version.bits();
    let host_mask = wildcard(prefix, bits)?;
    let network = cidr.network();
    let last = cidr.last();
    let address_count = AddressCount::from_host_bits(bits - prefix);

    let (usable_count, first_usable, last_usable) = match version {
        IpVersion::V4 => match prefix {
            32 => (AddressCount::Exact(1), network, network),
            31 => (AddressCount::Exact(2), network, last),
            _ => (
                address_count.saturating_sub(AddressCount::Exact(2)),
                network + 1,
                last - 1,
            ),
        },
        IpVersion::V6 => (address_count, network, last),
    };

    Ok(SubnetMeta {
        cidr: cidr.to_string(),
        version,
        prefix,
        network: render_address(version, network),
        broadcast: match version {
            IpVersion::V4 => Some(render_address(version, last)),
            IpVersion::V6 => None,
        },
        last_address: render_address(version, last),
        netmask: render_address(version, host_mask ^ version.max_address()),
        wildcard: render_address(version, host_mask),
        address_count,
        usable_count,
        first_usable: render_address(version, first_usable),
        last_usable: render_address(version, last_usable),
        reverse_dns_zone: reverse_dns_zone(&cidr),
    })
}

/// Metadata of an already normalised block.
pub fn subnet_meta(cidr: &NormalisedCidr) -> Result<SubnetMeta> {
    compute_meta(cidr.network(), cidr.prefix(), cidr.version())
}

/// Reverse-DNS zone name for the block.
///
/// Blocks that do not end on an octet (IPv4) or nibble (IPv6) boundary have
/// no single zone; a descriptive note is returned instead of an error.
pub fn reverse_dns_zone(cidr: &NormalisedCidr) -> String {
    let (unit_bits, suffix) = match cidr.version() {
        IpVersion::V4 => (8u8, "in-addr.arpa"),
        IpVersion::V6 => (4u8, "ip6.arpa"),
    };
    let prefix = cidr.prefix();
    if prefix % unit_bits != 0 {
        return format!(
            "non-standard boundary: /{prefix} is not a multiple of {unit_bits} bits, no single {suffix} zone"
        );
    }

    let bits = cidr.bits();
    let units = prefix / unit_bits;
    let labels: Vec<String> = (0..units)
        .rev()
        .map(|i| {
            let shift = bits - unit_bits * (i + 1);
            let value = (cidr.network() >> shift) & ((1u128 << unit_bits) - 1);
            match cidr.version() {
                IpVersion::V4 => value.to_string(),
                IpVersion::V6 => format!("{value:x}"),
            }
        })
        .collect();

    if labels.is_empty() {
        suffix.to_string()
    } else {
        format!("{}.{suffix}", labels.join("."))
    }
}

/// Binary rendering of the network address with the prefix boundary marked
/// by `|`, e.g. `11000000.10101000.00000001.|00000000` for `192.168.1.0/24`.
pub fn binary_with_prefix(cidr: &NormalisedCidr) -> String {
    let (group_bits, separator) = match cidr.version() {
        IpVersion::V4 => (8, '.'),
        IpVersion::V6 => (16, ':'),
    };
    let bits = cidr.bits() as usize;
    let prefix = cidr.prefix() as usize;
    let mut out = String::with_capacity(bits + bits / group_bits * 2);
    for i in 0..bits {
        if i > 0 && i % group_bits == 0 {
            out.push(separator);
        }
        if i == prefix {
            out.push('|');
        }
        let bit = (cidr.network() >> (bits - 1 - i)) & 1;
        out.push(if bit == 1 { '1' } else { '0' });
    }
    if prefix == bits {
        out.push('|');
    }
    out
}

//! Canonical CIDR value type and the parsers that produce it.
//!
//! Provides [`NormalisedCidr`], a `(version, network, prefix)` triple whose
//! host bits are always cleared, along with the textual front ends
//! (`addr/prefix`, `addr,netmask`, address ranges).

use super::address::{format_ipv6, parse_address, IpVersion};
use super::prefix::{low_bits, mask, wildcard};
use crate::error::{Error, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A CIDR block with host bits cleared.
///
/// Ordering is by family, then network address, then prefix length, so a
/// sorted list puts a supernet right before its first subnet.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct NormalisedCidr {
    version: IpVersion,
    network: u128,
    prefix: u8,
}

impl NormalisedCidr {
    /// Create a new [`NormalisedCidr`] from a CIDR string (e.g. "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<NormalisedCidr> {
        parse_cidr(addr_cidr)
    }

    /// Build from raw parts, clearing any host bits of `addr`.
    pub fn from_parts(version: IpVersion, addr: u128, prefix: u8) -> Result<NormalisedCidr> {
        let bits = version.bits();
        if addr > version.max_address() {
            return Err(Error::range(format!(
                "address value {addr:#x} does not fit in {bits} bits"
            )));
        }
        let network = addr & mask(prefix, bits)?;
        Ok(NormalisedCidr {
            version,
            network,
            prefix,
        })
    }

    /// Whole address space of a family (`0.0.0.0/0` or `::/0`).
    pub fn any(version: IpVersion) -> NormalisedCidr {
        NormalisedCidr {
            version,
            network: 0,
            prefix: 0,
        }
    }

    pub fn version(&self) -> IpVersion {
        self.version
    }

    /// Address width in bits (32 or 128).
    pub fn bits(&self) -> u8 {
        self.version.bits()
    }

    pub fn network(&self) -> u128 {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of host bits (`bits - prefix`).
    pub fn host_bits(&self) -> u8 {
        self.bits() - self.prefix
    }

    /// Highest address of the block (the broadcast address for IPv4).
    pub fn last(&self) -> u128 {
        self.network | low_bits(self.host_bits())
    }

    /// Network address as text.
    pub fn network_address(&self) -> String {
        render_address(self.version, self.network)
    }

    /// Last address as text.
    pub fn last_address(&self) -> String {
        render_address(self.version, self.last())
    }

    /// Whether `addr` (same family) falls inside the block.
    pub fn contains_address(&self, addr: u128) -> bool {
        self.network <= addr && addr <= self.last()
    }

    /// Enclosing block one bit shorter, `None` for a `/0`.
    pub fn parent(&self) -> Option<NormalisedCidr> {
        if self.prefix == 0 {
            return None;
        }
        let prefix = self.prefix - 1;
        Some(NormalisedCidr {
            version: self.version,
            network: self.network & !(1u128 << (self.bits() - self.prefix)),
            prefix,
        })
    }

    /// The two halves one bit longer, `None` for a host route.
    pub fn children(&self) -> Option<(NormalisedCidr, NormalisedCidr)> {
        if self.prefix >= self.bits() {
            return None;
        }
        let prefix = self.prefix + 1;
        let left = NormalisedCidr { prefix, ..*self };
        let right = NormalisedCidr {
            network: self.network + (1u128 << (self.bits() - prefix)),
            ..left
        };
        Some((left, right))
    }

    /// Next block of the same size, `None` at the end of the address space.
    pub fn next_sibling(&self) -> Option<NormalisedCidr> {
        let last = self.last();
        if last >= self.version.max_address() {
            return None;
        }
        Some(NormalisedCidr {
            network: last + 1,
            ..*self
        })
    }

    /// Iterate over all `/new_prefix` blocks of this block in ascending order.
    pub fn subnets(&self, new_prefix: u8) -> Result<Subnets> {
        if new_prefix < self.prefix || new_prefix > self.bits() {
            return Err(Error::range(format!(
                "cannot cut {self} into /{new_prefix} blocks"
            )));
        }
        Ok(Subnets {
            version: self.version,
            prefix: new_prefix,
            step: wildcard(new_prefix, self.bits())?,
            next: Some(self.network),
            end: self.last(),
        })
    }
}

/// Ascending iterator over equal-sized blocks, see [`NormalisedCidr::subnets`].
#[derive(Debug, Clone)]
pub struct Subnets {
    version: IpVersion,
    prefix: u8,
    step: u128,
    next: Option<u128>,
    end: u128,
}

impl Iterator for Subnets {
    type Item = NormalisedCidr;

    fn next(&mut self) -> Option<NormalisedCidr> {
        let network = self.next?;
        let block_last = network + self.step;
        self.next = if block_last >= self.end {
            None
        } else {
            Some(block_last + 1)
        };
        Some(NormalisedCidr {
            version: self.version,
            network,
            prefix: self.prefix,
        })
    }
}

/// Render an address of a family. Values are trusted to fit the family.
pub(crate) fn render_address(version: IpVersion, value: u128) -> String {
    match version {
        IpVersion::V4 => Ipv4Addr::from(value as u32).to_string(),
        IpVersion::V6 => format_ipv6(value),
    }
}

impl fmt::Display for NormalisedCidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.network_address(), self.prefix)
    }
}

impl FromStr for NormalisedCidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_cidr(s)
    }
}

impl Serialize for NormalisedCidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NormalisedCidr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<NormalisedCidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_cidr(&s).map_err(|e| de::Error::custom(format!("invalid CIDR '{s}': {e}")))
    }
}

/// Parse `address/prefix` into a [`NormalisedCidr`], clearing host bits.
pub fn parse_cidr(text: &str) -> Result<NormalisedCidr> {
    let text = text.trim();
    let (addr_text, prefix_text) = text
        .split_once('/')
        .ok_or_else(|| Error::format(format!("'{text}' is missing the '/' prefix separator")))?;

    if prefix_text.is_empty() || !prefix_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::format(format!(
            "prefix length '{prefix_text}' is not a number"
        )));
    }
    let (version, addr) = parse_address(addr_text)?;
    let prefix: u8 = match prefix_text.parse::<u8>() {
        Ok(p) if p <= version.bits() => p,
        _ => {
            return Err(Error::format(format!(
                "prefix length /{prefix_text} is out of range for {version}"
            )))
        }
    };

    NormalisedCidr::from_parts(version, addr, prefix)
}

/// Parse an address together with a dotted/colon netmask.
pub fn parse_cidr_with_netmask(address: &str, netmask: &str) -> Result<NormalisedCidr> {
    let (version, addr) = parse_address(address)?;
    let (mask_version, mask_value) = parse_address(netmask)?;
    if mask_version != version {
        return Err(Error::format(format!(
            "netmask '{netmask}' is not an {version} mask"
        )));
    }

    let bits = version.bits();
    // Count leading ones inside the family's width.
    let shifted = mask_value << (128 - bits as u32);
    let prefix = (shifted.leading_ones() as u8).min(bits);
    if mask_value != mask(prefix, bits)? {
        return Err(Error::format(format!(
            "netmask '{netmask}' is not contiguous"
        )));
    }

    NormalisedCidr::from_parts(version, addr, prefix)
}

/// Parse `addr/prefix`, `addr,netmask`, or a bare address (host route).
pub fn parse_cidr_input(text: &str) -> Result<NormalisedCidr> {
    let text = text.trim();
    if text.contains('/') {
        parse_cidr(text)
    } else if let Some((address, netmask)) = text.split_once(',') {
        parse_cidr_with_netmask(address.trim(), netmask.trim())
    } else {
        let (version, addr) = parse_address(text)?;
        NormalisedCidr::from_parts(version, addr, version.bits())
    }
}

/// Canonical `network/prefix` text.
pub fn format_cidr(cidr: &NormalisedCidr) -> String {
    cidr.to_string()
}

/// Cover an inclusive address range with the fewest CIDR blocks.
pub fn range_to_minimal_prefixes(start: &str, end: &str) -> Result<Vec<NormalisedCidr>> {
    let (start_version, start_value) = parse_address(start)?;
    let (end_version, end_value) = parse_address(end)?;
    if start_version != end_version {
        return Err(Error::format(format!(
            "range '{start}' - '{end}' mixes address families"
        )));
    }
    range_to_prefixes(start_version, start_value, end_value)
}

/// Integer form of [`range_to_minimal_prefixes`].
pub fn range_to_prefixes(version: IpVersion, start: u128, end: u128) -> Result<Vec<NormalisedCidr>> {
    if start > end {
        return Err(Error::format(format!(
            "range start {} is after range end {}",
            render_address(version, start),
            render_address(version, end)
        )));
    }
    if end > version.max_address() {
        return Err(Error::range(format!(
            "range end {end:#x} does not fit in {} bits",
            version.bits()
        )));
    }

    let bits = version.bits();
    let mut blocks = Vec::new();
    let mut current = start;
    loop {
        // Largest block aligned at `current` that stays within `end`.
        let mut host_bits = (current.trailing_zeros() as u8).min(bits);
        while host_bits > 0 && current | low_bits(host_bits) > end {
            host_bits -= 1;
        }
        let block = NormalisedCidr {
            version,
            network: current,
            prefix: bits - host_bits,
        };
        let block_last = block.last();
        blocks.push(block);
        if block_last >= end {
            break;
        }
        current = block_last + 1;
    }

    log::debug!(
        "range {} - {} covered by {} block(s)",
        render_address(version, start),
        render_address(version, end),
        blocks.len()
    );
    Ok(blocks)
}

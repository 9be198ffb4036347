//! Textual IPv4/IPv6 address codec.
//!
//! Addresses are carried as `u128` magnitudes regardless of family so that the
//! rest of the crate can do its arithmetic on a single integer type. IPv4
//! values always fit in the low 32 bits.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Address width of an IPv4 address in bits.
pub const IPV4_BITS: u8 = 32;
/// Address width of an IPv6 address in bits.
pub const IPV6_BITS: u8 = 128;

/// IP protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Address width in bits (32 or 128).
    pub fn bits(self) -> u8 {
        match self {
            IpVersion::V4 => IPV4_BITS,
            IpVersion::V6 => IPV6_BITS,
        }
    }

    /// Family for a given bit width.
    pub fn from_bits(bits: u8) -> Result<IpVersion> {
        match bits {
            IPV4_BITS => Ok(IpVersion::V4),
            IPV6_BITS => Ok(IpVersion::V6),
            _ => Err(Error::range(format!(
                "address width must be 32 or 128 bits, got {bits}"
            ))),
        }
    }

    /// Numeric version (4 or 6).
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }

    /// Largest address of this family.
    pub fn max_address(self) -> u128 {
        match self {
            IpVersion::V4 => u32::MAX as u128,
            IpVersion::V6 => u128::MAX,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

/// Parse a dotted-decimal IPv4 address.
pub fn parse_ipv4(text: &str) -> Result<u32> {
    let text = text.trim();
    let octets: Vec<&str> = text.split('.').collect();
    if octets.len() != 4 {
        return Err(Error::format(format!(
            "IPv4 address '{text}' must have 4 octets, found {}",
            octets.len()
        )));
    }

    let mut value: u32 = 0;
    for octet in octets {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::format(format!(
                "invalid octet '{octet}' in IPv4 address '{text}'"
            )));
        }
        // Long digit strings would overflow before the range check.
        let octet_value: u32 = match octet.trim_start_matches('0') {
            "" => 0,
            digits if digits.len() > 3 => u32::MAX,
            digits => digits
                .parse()
                .map_err(|_| Error::format(format!("invalid octet '{octet}'")))?,
        };
        if octet_value > 255 {
            return Err(Error::format(format!(
                "octet '{octet}' out of range in IPv4 address '{text}'"
            )));
        }
        value = (value << 8) | octet_value;
    }
    Ok(value)
}

/// Format a 32-bit value as a dotted-decimal IPv4 address.
pub fn format_ipv4(value: u128) -> Result<String> {
    let value = u32::try_from(value)
        .map_err(|_| Error::range(format!("value {value} does not fit in 32 bits")))?;
    Ok(Ipv4Addr::from(value).to_string())
}

/// Parse an IPv6 address, accepting `::` compression, a trailing embedded
/// IPv4 literal and a `%zone` suffix (which is discarded).
pub fn parse_ipv6(text: &str) -> Result<u128> {
    let lowered = text.trim().to_ascii_lowercase();
    let without_zone = match lowered.split_once('%') {
        Some((addr, _zone)) => addr,
        None => lowered.as_str(),
    };

    let expanded = expand_embedded_ipv4(without_zone)?;
    let addr = expanded.as_str();

    if addr.matches("::").count() > 1 {
        return Err(Error::format(format!(
            "IPv6 address '{text}' contains more than one '::'"
        )));
    }

    let hextets: Vec<u16> = match addr.split_once("::") {
        Some((head, tail)) => {
            let head = parse_hextet_group(head, text)?;
            let tail = parse_hextet_group(tail, text)?;
            let explicit = head.len() + tail.len();
            if explicit > 7 {
                return Err(Error::format(format!(
                    "IPv6 address '{text}' has {explicit} hextets around '::', at most 7 allowed"
                )));
            }
            let mut all = head;
            all.resize(8 - tail.len(), 0);
            all.extend(tail);
            all
        }
        None => {
            let all = parse_hextet_group(addr, text)?;
            if all.len() != 8 {
                return Err(Error::format(format!(
                    "IPv6 address '{text}' must have 8 hextets, found {}",
                    all.len()
                )));
            }
            all
        }
    };

    Ok(hextets
        .iter()
        .fold(0u128, |acc, &h| (acc << 16) | h as u128))
}

/// Replace a trailing dotted-quad (`::ffff:192.0.2.1`) by two hextets.
fn expand_embedded_ipv4(addr: &str) -> Result<String> {
    match addr.rfind(':') {
        Some(pos) if addr[pos + 1..].contains('.') => {
            let v4 = parse_ipv4(&addr[pos + 1..])?;
            Ok(format!("{}{:x}:{:x}", &addr[..=pos], v4 >> 16, v4 & 0xffff))
        }
        _ => Ok(addr.to_string()),
    }
}

fn parse_hextet_group(group: &str, original: &str) -> Result<Vec<u16>> {
    if group.is_empty() {
        return Ok(Vec::new());
    }
    group
        .split(':')
        .map(|hextet| {
            if hextet.is_empty() || !hextet.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::format(format!(
                    "invalid hextet '{hextet}' in IPv6 address '{original}'"
                )));
            }
            if hextet.len() > 4 {
                return Err(Error::format(format!(
                    "hextet '{hextet}' exceeds 0xffff in IPv6 address '{original}'"
                )));
            }
            u16::from_str_radix(hextet, 16)
                .map_err(|_| Error::format(format!("invalid hextet '{hextet}'")))
        })
        .collect()
}

/// Format a 128-bit value as a compressed IPv6 address.
///
/// The longest run of at least two zero hextets is replaced by `::`; on a tie
/// the earliest run wins.
pub fn format_ipv6(value: u128) -> String {
    let hextets: Vec<u16> = (0..8)
        .map(|i| (value >> (112 - 16 * i)) as u16)
        .collect();

    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < 8 {
        if hextets[i] != 0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < 8 && hextets[i] == 0 {
            i += 1;
        }
        let len = i - start;
        if len >= 2 && best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }

    let join = |part: &[u16]| {
        part.iter()
            .map(|h| format!("{h:x}"))
            .collect::<Vec<String>>()
            .join(":")
    };

    match best {
        Some((start, len)) => format!(
            "{}::{}",
            join(&hextets[..start]),
            join(&hextets[start + len..])
        ),
        None => join(&hextets),
    }
}

/// Parse an address of either family; IPv6 iff the text contains `:`.
pub fn parse_address(text: &str) -> Result<(IpVersion, u128)> {
    if text.contains(':') {
        Ok((IpVersion::V6, parse_ipv6(text)?))
    } else {
        Ok((IpVersion::V4, parse_ipv4(text)? as u128))
    }
}

/// Format an address of the given family.
pub fn format_address(version: IpVersion, value: u128) -> Result<String> {
    match version {
        IpVersion::V4 => format_ipv4(value),
        IpVersion::V6 => Ok(format_ipv6(value)),
    }
}

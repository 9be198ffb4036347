//! Address classification against well-known IANA ranges.

use crate::models::{parse_address, IpVersion};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Special-purpose category of an address.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AddressClass {
    Unspecified,
    Loopback,
    Multicast,
    LinkLocal,
    Broadcast,
    Reserved,
    Private,
    Shared,
    UniqueLocal,
    Documentation,
    GlobalUnicast,
    Public,
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressClass::Unspecified => "unspecified",
            AddressClass::Loopback => "loopback",
            AddressClass::Multicast => "multicast",
            AddressClass::LinkLocal => "link-local",
            AddressClass::Broadcast => "broadcast",
            AddressClass::Reserved => "reserved",
            AddressClass::Private => "private",
            AddressClass::Shared => "shared",
            AddressClass::UniqueLocal => "unique-local",
            AddressClass::Documentation => "documentation",
            AddressClass::GlobalUnicast => "global-unicast",
            AddressClass::Public => "public",
        };
        f.write_str(name)
    }
}

/// (network, prefix, class) in match priority order. Ranges nest, so the
/// first hit wins.
const IPV4_RANGES: &[(u32, u8, AddressClass)] = &[
    (0x0000_0000, 32, AddressClass::Unspecified),
    (0x7F00_0000, 8, AddressClass::Loopback),
    (0xE000_0000, 4, AddressClass::Multicast),
    (0xA9FE_0000, 16, AddressClass::LinkLocal),
    (0xFFFF_FFFF, 32, AddressClass::Broadcast),
    (0xF000_0000, 4, AddressClass::Reserved),
    (0x0000_0000, 8, AddressClass::Reserved),
    (0x0A00_0000, 8, AddressClass::Private),
    (0xAC10_0000, 12, AddressClass::Private),
    (0xC0A8_0000, 16, AddressClass::Private),
    (0x6440_0000, 10, AddressClass::Shared),
    (0xC000_0200, 24, AddressClass::Documentation),
    (0xC633_6400, 24, AddressClass::Documentation),
    (0xCB00_7100, 24, AddressClass::Documentation),
];

const IPV6_RANGES: &[(u128, u8, AddressClass)] = &[
    (0, 128, AddressClass::Unspecified),
    (1, 128, AddressClass::Loopback),
    (0xff00u128 << 112, 8, AddressClass::Multicast),
    (0xfe80u128 << 112, 10, AddressClass::LinkLocal),
    (0xfc00u128 << 112, 7, AddressClass::UniqueLocal),
    (0x2001_0db8u128 << 96, 32, AddressClass::Documentation),
    (0x2000u128 << 112, 3, AddressClass::GlobalUnicast),
];

fn in_range(addr: u128, network: u128, prefix: u8, bits: u8) -> bool {
    let host_bits = bits - prefix;
    if host_bits >= 128 {
        return true;
    }
    addr >> host_bits == network >> host_bits
}

/// Classify an address; unparseable input yields an empty set.
pub fn classify_address(text: &str) -> BTreeSet<AddressClass> {
    let (version, addr) = match parse_address(text) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::debug!("classify_address: '{text}' is not an address: {e}");
            return BTreeSet::new();
        }
    };

    let class = match version {
        IpVersion::V4 => IPV4_RANGES
            .iter()
            .find(|(network, prefix, _)| in_range(addr, *network as u128, *prefix, 32))
            .map(|(_, _, class)| *class)
            .unwrap_or(AddressClass::Public),
        IpVersion::V6 => IPV6_RANGES
            .iter()
            .find(|(network, prefix, _)| in_range(addr, *network, *prefix, 128))
            .map(|(_, _, class)| *class)
            .unwrap_or(AddressClass::Reserved),
    };

    BTreeSet::from([class])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(text: &str) -> AddressClass {
        let classes = classify_address(text);
        assert_eq!(classes.len(), 1, "{text} should have exactly one class");
        *classes.iter().next().unwrap()
    }

    #[test]
    fn test_classify_ipv4() {
        assert_eq!(class_of("0.0.0.0"), AddressClass::Unspecified);
        assert_eq!(class_of("0.1.2.3"), AddressClass::Reserved);
        assert_eq!(class_of("127.0.0.1"), AddressClass::Loopback);
        assert_eq!(class_of("224.0.0.251"), AddressClass::Multicast);
        assert_eq!(class_of("169.254.10.1"), AddressClass::LinkLocal);
        assert_eq!(class_of("255.255.255.255"), AddressClass::Broadcast);
        assert_eq!(class_of("240.0.0.1"), AddressClass::Reserved);
        assert_eq!(class_of("10.1.2.3"), AddressClass::Private);
        assert_eq!(class_of("172.31.255.1"), AddressClass::Private);
        assert_eq!(class_of("172.32.0.1"), AddressClass::Public);
        assert_eq!(class_of("192.168.0.1"), AddressClass::Private);
        assert_eq!(class_of("100.64.0.1"), AddressClass::Shared);
        assert_eq!(class_of("192.0.2.55"), AddressClass::Documentation);
        assert_eq!(class_of("203.0.113.9"), AddressClass::Documentation);
        assert_eq!(class_of("8.8.8.8"), AddressClass::Public);
    }

    #[test]
    fn test_classify_ipv6() {
        assert_eq!(class_of("::"), AddressClass::Unspecified);
        assert_eq!(class_of("::1"), AddressClass::Loopback);
        assert_eq!(class_of("ff02::1"), AddressClass::Multicast);
        assert_eq!(class_of("fe80::1%eth0"), AddressClass::LinkLocal);
        assert_eq!(class_of("fd12:3456::1"), AddressClass::UniqueLocal);
        assert_eq!(class_of("2001:db8::1"), AddressClass::Documentation);
        assert_eq!(class_of("2606:4700::1111"), AddressClass::GlobalUnicast);
        assert_eq!(class_of("::ffff:10.0.0.1"), AddressClass::Reserved);
    }

    #[test]
    fn test_classify_invalid() {
        assert!(classify_address("not an ip").is_empty());
        assert!(classify_address("300.1.1.1").is_empty());
    }

    #[test]
    fn test_class_display() {
        assert_eq!(AddressClass::LinkLocal.to_string(), "link-local");
        assert_eq!(
            serde_json::to_string(&AddressClass::GlobalUnicast).unwrap(),
            "\"global-unicast\""
        );
    }
}

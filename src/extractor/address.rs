// file: src/extractor/address.rs
// description: IPv4 parsing and global-routability classification
// reference: IANA IPv4 special-purpose address registry

use std::net::Ipv4Addr;

/// Ranges never eligible for disclosure, as (network, prefix length).
const NON_GLOBAL_RANGES: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),        // "this network"
    (Ipv4Addr::new(10, 0, 0, 0), 8),       // RFC1918
    (Ipv4Addr::new(100, 64, 0, 0), 10),    // shared address space (CGNAT)
    (Ipv4Addr::new(127, 0, 0, 0), 8),      // loopback
    (Ipv4Addr::new(169, 254, 0, 0), 16),   // link-local
    (Ipv4Addr::new(172, 16, 0, 0), 12),    // RFC1918
    (Ipv4Addr::new(192, 0, 0, 0), 24),     // IETF protocol assignments
    (Ipv4Addr::new(192, 0, 2, 0), 24),     // TEST-NET-1
    (Ipv4Addr::new(192, 88, 99, 0), 24),   // deprecated 6to4 relay anycast
    (Ipv4Addr::new(192, 168, 0, 0), 16),   // RFC1918
    (Ipv4Addr::new(198, 18, 0, 0), 15),    // benchmarking
    (Ipv4Addr::new(198, 51, 100, 0), 24),  // TEST-NET-2
    (Ipv4Addr::new(203, 0, 113, 0), 24),   // TEST-NET-3
    (Ipv4Addr::new(224, 0, 0, 0), 4),      // multicast
    (Ipv4Addr::new(240, 0, 0, 0), 4),      // reserved, includes broadcast
];

pub const MASK_PLACEHOLDER: &str = "x";

/// Accepts only a strict dotted quad. Leading zeros, whitespace, ports and
/// IPv6 forms are all rejected.
pub fn parse_ipv4(value: &str) -> Option<Ipv4Addr> {
    value.parse::<Ipv4Addr>().ok()
}

pub fn is_public(addr: Ipv4Addr) -> bool {
    let bits = u32::from(addr);

    !NON_GLOBAL_RANGES.iter().any(|(network, prefix)| {
        let mask = u32::MAX << (32 - u32::from(*prefix));
        bits & mask == u32::from(*network) & mask
    })
}

/// Parse-and-classify for raw strings. Anything that does not parse is not public.
pub fn is_public_str(value: &str) -> bool {
    parse_ipv4(value).is_some_and(is_public)
}

/// Legacy display form, e.g. `8.8.8.x`.
pub fn mask_last_octet(addr: Ipv4Addr) -> String {
    let [a, b, c, _] = addr.octets();
    format!("{}.{}.{}.{}", a, b, c, MASK_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_ranges_are_not_public() {
        for ip in [
            "10.0.0.1",
            "192.168.1.1",
            "172.16.0.5",
            "172.31.255.9",
            "127.0.0.1",
            "169.254.10.20",
        ] {
            assert!(!is_public_str(ip), "{ip} must not be public");
        }
    }

    #[test]
    fn test_global_addresses_are_public() {
        for ip in ["172.32.0.1", "8.8.8.8", "1.1.1.1", "1.2.3.4", "5.6.7.8"] {
            assert!(is_public_str(ip), "{ip} should be public");
        }
    }

    #[test]
    fn test_reserved_and_special_ranges() {
        for ip in [
            "0.1.2.3",
            "100.64.0.1",
            "192.0.2.55",
            "198.18.0.1",
            "198.51.100.7",
            "203.0.113.10",
            "224.0.0.251",
            "239.255.255.250",
            "240.0.0.1",
            "255.255.255.255",
        ] {
            assert!(!is_public_str(ip), "{ip} must not be public");
        }
    }

    #[test]
    fn test_range_boundaries() {
        assert!(is_public_str("100.63.255.255"));
        assert!(!is_public_str("100.127.255.255"));
        assert!(is_public_str("100.128.0.0"));
        assert!(is_public_str("172.15.255.255"));
        assert!(is_public_str("198.20.0.0"));
        assert!(is_public_str("223.255.255.255"));
    }

    #[test]
    fn test_parse_rejects_non_dotted_quads() {
        for raw in [
            "not.an.ip",
            "999.1.1.1",
            "1.2.3",
            "01.2.3.4",
            " 8.8.8.8",
            "8.8.8.8:22",
            "::1",
            "2001:db8::1",
            "",
        ] {
            assert!(parse_ipv4(raw).is_none(), "{raw:?} should not parse");
            assert!(!is_public_str(raw));
        }
    }

    #[test]
    fn test_mask_last_octet() {
        let masked = mask_last_octet(Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(masked, "8.8.8.x");
        assert!(parse_ipv4(&masked).is_none());
    }
}

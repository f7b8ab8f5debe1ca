// file: src/extractor/patterns.rs
// description: compiled regex patterns and canonical key lists for indicator extraction
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Four dot-separated groups of 1-3 digits. Range checks happen in the
    // address classifier, not here.
    pub static ref IPV4_TOKEN: Regex = Regex::new(
        r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b"
    ).expect("IPV4_TOKEN regex is valid");

    pub static ref DOMAIN: Regex = Regex::new(
        r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$"
    ).expect("DOMAIN regex is valid");
}

/// Keys that conventionally hold a single attacker address, in priority order.
pub const IP_KEYS: &[&str] = &[
    "src_ip",
    "source_ip",
    "ip",
    "client_ip",
    "remote_addr",
    "remote_host",
    "src_host",
    "dst_ip",
    "rhost",
    "peer",
    "src",
    "host",
    "address",
];

/// Keys that conventionally hold a hostname.
pub const DOMAIN_KEYS: &[&str] = &["domain", "hostname", "host"];

pub const IP_LIST_KEYS: &[&str] = &["src_ips", "ips", "ioc_ips"];

pub const DOMAIN_LIST_KEYS: &[&str] = &["domains", "hosts", "ioc_domains"];

/// Wrapper keys searched one level down during the priority pass.
pub const CONTAINER_KEYS: &[&str] = &["data", "details", "payload", "event", "log", "message"];

pub fn is_domain_key(key: &str) -> bool {
    DOMAIN_KEYS.contains(&key) || DOMAIN_LIST_KEYS.contains(&key)
}

pub fn is_domain_shaped(value: &str) -> bool {
    value.len() <= 253 && DOMAIN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_token_pattern() {
        assert!(IPV4_TOKEN.is_match("failed from 192.168.1.7"));
        assert!(IPV4_TOKEN.is_match("8.8.8.8"));
        // shape only, range is checked later
        assert!(IPV4_TOKEN.is_match("999.999.999.999"));
        assert!(!IPV4_TOKEN.is_match("1.2.3"));
    }

    #[test]
    fn test_domain_shape() {
        assert!(is_domain_shaped("evil.example.org"));
        assert!(is_domain_shaped("c2.xyz"));
        assert!(!is_domain_shaped("localhost"));
        assert!(!is_domain_shaped("not a domain.com"));
        assert!(!is_domain_shaped("Upper.Case.COM"));
    }

    #[test]
    fn test_domain_keys() {
        assert!(is_domain_key("hostname"));
        assert!(is_domain_key("ioc_domains"));
        assert!(!is_domain_key("src_ip"));
    }
}

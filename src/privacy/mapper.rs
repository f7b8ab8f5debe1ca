// file: src/privacy/mapper.rs
// description: deterministic salted pseudonyms for addresses and hostnames
// reference: https://docs.rs/sha2

use crate::config::PrivacyConfig;
use crate::error::{FeedError, Result};
use crate::extractor::address::{MASK_PLACEHOLDER, mask_last_octet, parse_ipv4};
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::warn;

pub const IP_PREFIX: &str = "ip-";
pub const HOST_PREFIX: &str = "host-";

// 12 hex chars = 48 bits; enough to keep a single feed collision-free in
// practice, not a cryptographic guarantee.
const DIGEST_HEX_LEN: usize = 12;

/// Secret salt for pseudonym derivation. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AnonymizationKey(String);

impl AnonymizationKey {
    pub fn new(salt: impl Into<String>) -> Self {
        Self(salt.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AnonymizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnonymizationKey(<redacted>)")
    }
}

/// First 12 hex characters of `sha256(salt + "::" + value)`.
pub fn salted_digest(salt: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"::");
    hasher.update(value.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..DIGEST_HEX_LEN].to_string()
}

pub fn anonymize_ip(ip: Ipv4Addr, salt: &str) -> String {
    format!("{}{}", IP_PREFIX, salted_digest(salt, &ip.to_string()))
}

/// Hashes the whole name and keeps only the top-level label, e.g.
/// `evil.example.org` -> `host-<digest>.org`. Labels that are not plain
/// alphanumerics are dropped rather than copied into rule text.
pub fn anonymize_domain(domain: &str, salt: &str) -> String {
    let value = domain.trim().to_lowercase();
    let digest = salted_digest(salt, &value);

    match value.rsplit_once('.') {
        Some((head, tld))
            if !head.is_empty()
                && !tld.is_empty()
                && tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            format!("{}{}.{}", HOST_PREFIX, digest, tld)
        }
        _ => format!("{}{}", HOST_PREFIX, digest),
    }
}

/// Passthrough when privacy is off; otherwise IPs get the `ip-` form and
/// everything else (pseudonyms included) goes through the domain form.
pub fn maybe_map(value: &str, privacy_enabled: bool, salt: &str) -> String {
    if !privacy_enabled {
        return value.to_string();
    }

    match parse_ipv4(value) {
        Some(ip) => anonymize_ip(ip, salt),
        None => anonymize_domain(value, salt),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyMode {
    Disabled,
    Hashed(AnonymizationKey),
    /// Last-octet masking, only when no salt exists and it was asked for.
    Masked,
}

#[derive(Debug, Clone)]
pub struct PrivacyMapper {
    mode: PrivacyMode,
}

impl PrivacyMapper {
    pub fn disabled() -> Self {
        Self {
            mode: PrivacyMode::Disabled,
        }
    }

    pub fn hashed(salt: impl Into<String>) -> Self {
        Self {
            mode: PrivacyMode::Hashed(AnonymizationKey::new(salt)),
        }
    }

    pub fn masked() -> Self {
        Self {
            mode: PrivacyMode::Masked,
        }
    }

    pub fn from_config(config: &PrivacyConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        match config.salt.as_deref().filter(|s| !s.is_empty()) {
            Some(salt) => Ok(Self::hashed(salt)),
            None if config.legacy_mask => {
                warn!("Privacy mode has no salt, falling back to last-octet masking");
                Ok(Self::masked())
            }
            None => Err(FeedError::Config(
                "privacy mode is enabled but no FEED_SALT is configured".to_string(),
            )),
        }
    }

    pub fn mode(&self) -> &PrivacyMode {
        &self.mode
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, PrivacyMode::Disabled)
    }

    /// Masked mode has no salt to hash names with, so anything that is not
    /// an address collapses to the fixed `host-x` placeholder.
    pub fn map(&self, value: &str) -> String {
        match &self.mode {
            PrivacyMode::Disabled => value.to_string(),
            PrivacyMode::Hashed(key) => maybe_map(value, true, key.as_str()),
            PrivacyMode::Masked => match parse_ipv4(value) {
                Some(ip) => mask_last_octet(ip),
                None => format!("{}{}", HOST_PREFIX, MASK_PLACEHOLDER),
            },
        }
    }

    /// Output form of a domain indicator, or `None` when the mode cannot
    /// publish it. Masked mode drops domains from feeds.
    pub fn map_domain(&self, domain: &str) -> Option<String> {
        match &self.mode {
            PrivacyMode::Masked => None,
            _ => Some(self.map(domain)),
        }
    }
}

impl Default for PrivacyMapper {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SALT: &str = "unit-test-salt";

    #[test]
    fn test_ip_pseudonym_shape() {
        let pseudonym = anonymize_ip(Ipv4Addr::new(8, 8, 8, 8), SALT);

        assert!(pseudonym.starts_with(IP_PREFIX));
        assert_eq!(pseudonym.len(), IP_PREFIX.len() + 12);
        assert!(pseudonym[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!pseudonym.contains("8.8.8.8"));
    }

    #[test]
    fn test_digest_matches_salt_separator_scheme() {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}::{}", SALT, "1.1.1.1").as_bytes());
        let expected = format!("{:x}", hasher.finalize());

        assert_eq!(salted_digest(SALT, "1.1.1.1"), &expected[..12]);
    }

    #[test]
    fn test_deterministic_and_salt_sensitive() {
        let a = maybe_map("1.2.3.4", true, SALT);
        let b = maybe_map("1.2.3.4", true, SALT);
        let c = maybe_map("1.2.3.4", true, "other-salt");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, maybe_map("5.6.7.8", true, SALT));
    }

    #[test]
    fn test_domain_keeps_tld_only() {
        let pseudonym = anonymize_domain("Evil.Example.ORG", SALT);

        assert!(pseudonym.starts_with(HOST_PREFIX));
        assert!(pseudonym.ends_with(".org"));
        assert!(!pseudonym.contains("example"));
        assert_eq!(pseudonym, anonymize_domain("evil.example.org", SALT));
    }

    #[test]
    fn test_domain_without_dot_or_with_odd_tld() {
        assert_eq!(anonymize_domain("localhost", SALT).matches('.').count(), 0);
        assert!(!anonymize_domain("a.b }", SALT).contains('}'));
        assert!(!anonymize_domain("trailing.", SALT).ends_with('.'));
    }

    #[test]
    fn test_disabled_is_passthrough() {
        assert_eq!(maybe_map("8.8.8.8", false, SALT), "8.8.8.8");
        assert_eq!(PrivacyMapper::disabled().map("evil.org"), "evil.org");
    }

    #[test]
    fn test_repeated_mapping_never_restores_raw_value() {
        let once = maybe_map("8.8.8.8", true, SALT);
        let twice = maybe_map(&once, true, SALT);

        assert!(once.starts_with(IP_PREFIX));
        assert!(twice.starts_with(HOST_PREFIX));
        assert!(!twice.contains("8.8.8.8"));
        assert_eq!(twice, maybe_map(&once, true, SALT));
    }

    #[test]
    fn test_arbitrary_strings_always_map() {
        for value in ["", "   ", "not an ip", "999.1.1.1", "::1"] {
            assert!(maybe_map(value, true, SALT).starts_with(HOST_PREFIX));
        }
    }

    #[test]
    fn test_mapper_from_config() {
        let mut config = PrivacyConfig {
            enabled: false,
            salt: None,
            legacy_mask: false,
        };
        assert!(!PrivacyMapper::from_config(&config).unwrap().is_enabled());

        config.enabled = true;
        assert!(PrivacyMapper::from_config(&config).is_err());

        config.legacy_mask = true;
        let masked = PrivacyMapper::from_config(&config).unwrap();
        assert_eq!(masked.mode(), &PrivacyMode::Masked);
        assert_eq!(masked.map("8.8.8.8"), "8.8.8.x");
        assert_eq!(masked.map("evil.org"), "host-x");
        assert_eq!(masked.map_domain("evil.org"), None);

        config.salt = Some(SALT.to_string());
        let hashed = PrivacyMapper::from_config(&config).unwrap();
        assert_eq!(hashed.map("8.8.8.8"), maybe_map("8.8.8.8", true, SALT));
    }

    #[test]
    fn test_masked_mode_never_hashes_names_unsalted() {
        let masked = PrivacyMapper::masked();
        let unsalted = anonymize_domain("evil.example.org", "");

        for name in ["evil.example.org", "other.net", "localhost"] {
            assert_eq!(masked.map(name), "host-x");
            assert_ne!(masked.map(name), unsalted);
            assert_eq!(masked.map_domain(name), None);
        }
        assert_eq!(
            PrivacyMapper::hashed(SALT).map_domain("evil.org"),
            Some(anonymize_domain("evil.org", SALT))
        );
        assert_eq!(
            PrivacyMapper::disabled().map_domain("evil.org").as_deref(),
            Some("evil.org")
        );
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let mapper = PrivacyMapper::hashed("super-secret");
        assert!(!format!("{:?}", mapper).contains("super-secret"));
    }
}

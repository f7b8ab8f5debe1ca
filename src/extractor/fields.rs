// file: src/extractor/fields.rs
// description: address and domain discovery inside arbitrarily nested event records
// reference: serde_json value traversal

use crate::extractor::address::parse_ipv4;
use crate::extractor::patterns::{
    CONTAINER_KEYS, DOMAIN_KEYS, DOMAIN_LIST_KEYS, IP_KEYS, IP_LIST_KEYS, IPV4_TOKEN,
    is_domain_key, is_domain_shaped,
};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::net::Ipv4Addr;
use tracing::debug;

/// Everything found in one record, deduplicated, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub ips: IndexSet<Ipv4Addr>,
    pub domains: IndexSet<String>,
}

impl Candidates {
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ips.len() + self.domains.len()
    }

    /// String form of every candidate, addresses first.
    pub fn values(&self) -> IndexSet<String> {
        self.ips
            .iter()
            .map(|ip| ip.to_string())
            .chain(self.domains.iter().cloned())
            .collect()
    }

    fn add_text(&mut self, text: &str) {
        for token in IPV4_TOKEN.find_iter(text) {
            if in_dotted_run(text, token.start(), token.end()) {
                continue;
            }
            if let Some(ip) = parse_ipv4(token.as_str()) {
                self.ips.insert(ip);
            }
        }
    }

    fn add_domain(&mut self, raw: &str) {
        let value = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        if parse_ipv4(&value).is_none() && is_domain_shaped(&value) {
            self.domains.insert(value);
        }
    }
}

pub struct FieldExtractor {
    max_depth: usize,
}

impl FieldExtractor {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Collects every IPv4 address and domain in `value`.
    ///
    /// Well-known keys at the top level and directly under the conventional
    /// wrapper keys are visited first so their values lead the result; the
    /// whole tree is then scanned so nothing embedded deeper (or inside free
    /// text) is missed. Tokens that look like addresses but do not parse are
    /// dropped without error.
    pub fn extract(&self, value: &Value) -> Candidates {
        let mut found = Candidates::default();

        if let Value::Object(root) = value {
            scan_known_keys(root, &mut found);
            for key in CONTAINER_KEYS {
                if let Some(Value::Object(inner)) = root.get(*key) {
                    scan_known_keys(inner, &mut found);
                }
            }
        }

        self.scan_tree(value, &mut found);
        found
    }

    fn scan_tree(&self, root: &Value, found: &mut Candidates) {
        // (parent key, node, depth). Arrays pass their key down to items so
        // `{"domains": [..]}` entries keep their meaning.
        let mut stack: Vec<(Option<&str>, &Value, usize)> = vec![(None, root, 0)];

        while let Some((key, node, depth)) = stack.pop() {
            match node {
                Value::String(text) => {
                    found.add_text(text);
                    if key.is_some_and(is_domain_key) {
                        found.add_domain(text);
                    }
                }
                Value::Object(map) => {
                    if depth >= self.max_depth {
                        debug!("Depth limit {} reached, skipping nested object", self.max_depth);
                        continue;
                    }
                    for (child_key, child) in map.iter().rev() {
                        stack.push((Some(child_key.as_str()), child, depth + 1));
                    }
                }
                Value::Array(items) => {
                    if depth >= self.max_depth {
                        debug!("Depth limit {} reached, skipping nested list", self.max_depth);
                        continue;
                    }
                    for child in items.iter().rev() {
                        stack.push((key, child, depth + 1));
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the match at `start..end` is four groups cut out of a longer
/// dotted-digit run such as an SNMP OID or a version string.
fn in_dotted_run(text: &str, start: usize, end: usize) -> bool {
    let mut before = text[..start].chars().rev();
    let mut after = text[end..].chars();

    let extends_left = before.next() == Some('.') && before.next().is_some_and(|c| c.is_ascii_digit());
    let extends_right = after.next() == Some('.') && after.next().is_some_and(|c| c.is_ascii_digit());
    extends_left || extends_right
}

fn scan_known_keys(map: &Map<String, Value>, found: &mut Candidates) {
    for key in IP_KEYS {
        if let Some(Value::String(text)) = map.get(*key) {
            found.add_text(text);
        }
    }
    for key in IP_LIST_KEYS {
        if let Some(Value::Array(items)) = map.get(*key) {
            items
                .iter()
                .filter_map(Value::as_str)
                .for_each(|text| found.add_text(text));
        }
    }
    for key in DOMAIN_KEYS {
        if let Some(Value::String(text)) = map.get(*key) {
            found.add_domain(text);
        }
    }
    for key in DOMAIN_LIST_KEYS {
        if let Some(Value::Array(items)) = map.get(*key) {
            items
                .iter()
                .filter_map(Value::as_str)
                .for_each(|text| found.add_domain(text));
        }
    }
}

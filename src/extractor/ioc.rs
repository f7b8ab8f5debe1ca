// file: src/extractor/ioc.rs
// description: ordered, deduplicated indicator aggregation over an event log snapshot
// reference: threat intelligence ioc standards

use crate::extractor::address::is_public;
use crate::extractor::fields::FieldExtractor;
use crate::models::{IndicatorKind, IndicatorRecord};
use crate::privacy::PrivacyMapper;
use indexmap::IndexSet;
use serde_json::Value;
use tracing::debug;

/// Suffixes of names that only resolve inside a private network.
const INTERNAL_DOMAIN_SUFFIXES: &[&str] = &[
    ".local",
    ".localhost",
    ".localdomain",
    ".internal",
    ".lan",
    ".home.arpa",
    ".corp",
];

pub struct IocAggregator {
    extractor: FieldExtractor,
    mapper: PrivacyMapper,
}

#[derive(Default)]
struct Accumulator {
    ips: IndexSet<String>,
    domains: IndexSet<String>,
    dropped: usize,
    withheld: usize,
}

impl IocAggregator {
    pub fn new(mapper: PrivacyMapper) -> Self {
        Self {
            extractor: FieldExtractor::new(),
            mapper,
        }
    }

    pub fn mapper(&self) -> &PrivacyMapper {
        &self.mapper
    }

    /// Unique public addresses in first-seen order, already in their output
    /// form. Non-public addresses never reach the result, whatever the
    /// privacy setting. Deduplication is on the output form, so one raw
    /// address always occupies exactly one slot.
    pub fn collect<'a, I>(&self, events: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        self.accumulate(events).ips.into_iter().collect()
    }

    /// Addresses followed by domains, both filtered and mapped like
    /// [`IocAggregator::collect`].
    pub fn collect_records<'a, I>(&self, events: I) -> Vec<IndicatorRecord>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let acc = self.accumulate(events);

        acc.ips
            .into_iter()
            .map(|value| IndicatorRecord::new(IndicatorKind::Ipv4, value))
            .chain(
                acc.domains
                    .into_iter()
                    .map(|value| IndicatorRecord::new(IndicatorKind::Domain, value)),
            )
            .collect()
    }

    fn accumulate<'a, I>(&self, events: I) -> Accumulator
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut acc = Accumulator::default();
        let mut scanned = 0usize;

        for event in events {
            scanned += 1;
            let found = self.extractor.extract(event);

            for ip in found.ips {
                if is_public(ip) {
                    acc.ips.insert(self.mapper.map(&ip.to_string()));
                } else {
                    acc.dropped += 1;
                }
            }

            for domain in found.domains {
                if is_internal_domain(&domain) {
                    acc.dropped += 1;
                    continue;
                }
                match self.mapper.map_domain(&domain) {
                    Some(mapped) => {
                        acc.domains.insert(mapped);
                    }
                    None => acc.withheld += 1,
                }
            }
        }

        debug!(
            "Aggregated {} addresses and {} domains from {} events ({} non-public dropped, {} domains withheld)",
            acc.ips.len(),
            acc.domains.len(),
            scanned,
            acc.dropped,
            acc.withheld
        );

        acc
    }
}

/// Convenience form of [`IocAggregator::collect`] for a bare flag and salt.
/// An enabled flag with an empty salt still hashes (with the empty salt).
pub fn collect<'a, I>(events: I, privacy_enabled: bool, salt: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mapper = if privacy_enabled {
        PrivacyMapper::hashed(salt)
    } else {
        PrivacyMapper::disabled()
    };

    IocAggregator::new(mapper).collect(events)
}

fn is_internal_domain(domain: &str) -> bool {
    INTERNAL_DOMAIN_SUFFIXES
        .iter()
        .any(|suffix| domain.ends_with(suffix))
}

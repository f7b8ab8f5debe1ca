// file: src/models/ioc.rs
// description: indicators of compromise model for threat intelligence feeds
// reference: stix ioc standards

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Ipv4,
    Domain,
}

/// Export-time indicator. Built per request from the log, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub value: String,
    pub kind: IndicatorKind,
}

impl IndicatorRecord {
    pub fn new(kind: IndicatorKind, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

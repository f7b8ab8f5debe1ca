// file: src/exporter/json.rs
// description: json indicator feed for dashboards and downstream tooling

use crate::error::Result;
use crate::models::{IndicatorKind, IndicatorRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IocFeed {
    pub ips: Vec<String>,
    pub domains: Vec<String>,
    pub generated: String,
}

impl IocFeed {
    pub fn from_records(records: &[IndicatorRecord]) -> Self {
        let (ips, domains): (Vec<_>, Vec<_>) = records
            .iter()
            .partition(|record| record.kind == IndicatorKind::Ipv4);

        Self {
            ips: ips.into_iter().map(|r| r.value.clone()).collect(),
            domains: domains.into_iter().map(|r| r.value.clone()).collect(),
            generated: Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

// file: src/exporter/mod.rs
// description: feed rendering module exports
// reference: internal module structure

pub mod json;
pub mod rules;

pub use json::IocFeed;
pub use rules::{render_deny_list, render_packet_filter_table};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `deny from <ip>` lines
    Ufw,
    /// pf.conf table and block rule
    Pf,
    /// `{ips, domains, generated}` document
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Ufw | ExportFormat::Pf => "text/plain; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

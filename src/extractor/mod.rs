// file: src/extractor/mod.rs
// description: indicator extraction module exports
// reference: internal module structure

pub mod address;
pub mod fields;
pub mod ioc;
pub mod patterns;

pub use address::{is_public, is_public_str, mask_last_octet, parse_ipv4};
pub use fields::{Candidates, FieldExtractor};
pub use ioc::IocAggregator;

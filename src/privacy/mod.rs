// file: src/privacy/mod.rs
// description: privacy mode module exports
// reference: internal module structure

pub mod mapper;

pub use mapper::{
    AnonymizationKey, PrivacyMapper, PrivacyMode, anonymize_domain, anonymize_ip, maybe_map,
};

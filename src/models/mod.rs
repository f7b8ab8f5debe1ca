// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod event;
pub mod ioc;

pub use event::{Event, parse_timestamp};
pub use ioc::{IndicatorKind, IndicatorRecord};

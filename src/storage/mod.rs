// file: src/storage/mod.rs
// description: event log storage module exports
// reference: internal module structure

pub mod event_log;
pub mod rotation;

pub use event_log::EventLog;
pub use rotation::RotationPolicy;

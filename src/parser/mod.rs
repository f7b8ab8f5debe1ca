// file: src/parser/mod.rs
// description: sensor payload parsing module exports
// reference: internal module structure

pub mod normalizer;

pub use normalizer::{EventNormalizer, SensorKind, detect_source};

//! Common types used throughout the column mapping engine.
//!
//! Re-exports the row value type and the configuration types rules are built from.

mod cell;

pub use cell::*;

// Re-exports.
pub use column_mapping_config::shared::{Expression, MappingConfig, PartitionConfig, RuleConfig};

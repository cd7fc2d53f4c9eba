//! Shared configuration types for column mapping.

mod base;
mod mapping;
mod partition;
mod rule;

pub use base::ValidationError;
pub use mapping::MappingConfig;
pub use partition::PartitionConfig;
pub use rule::{Expression, RuleConfig};

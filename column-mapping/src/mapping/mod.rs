//! The column mapping engine and its per-table cache.

mod cache;
mod engine;
mod expression;

pub use cache::{ColumnInfo, MappingCache, MappingInfo};
pub use engine::{ColumnMapping, Positions};
pub use expression::{apply_expression, partition_id};

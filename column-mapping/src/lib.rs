//! Row and DDL transformation for merging sharded tables.
//!
//! A [`mapping::ColumnMapping`] is built once from a list of [`rule::Rule`]s and a
//! [`partition::PartitionLayout`]. For every replicated row it rewrites the mapped column of
//! matched tables (adding a prefix or suffix, or packing a partition id into the primary key so
//! rows from different shards never collide), and it refuses DDL on matched tables because the
//! statement could invalidate the mapping.

mod macros;

pub mod error;
pub mod mapping;
pub mod partition;
pub mod rule;
pub mod types;

pub use error::{ErrorKind, MappingError, MappingResult};
pub use mapping::ColumnMapping;

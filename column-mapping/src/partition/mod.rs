//! Partition identifiers: packing shard identity into the high bits of integer keys.
//!
//! Rows merged from many shards keep their original auto-increment keys in the low bits while
//! the instance, schema and table they came from are encoded above them. As long as every shard
//! has a distinct identity and every original key stays below
//! [`PartitionLayout::max_origin_id`], keys from different shards never collide.

mod encoder;
mod layout;

pub use encoder::{PartitionPrefix, apply_partition_id, compute_partition_id};
pub use layout::PartitionLayout;

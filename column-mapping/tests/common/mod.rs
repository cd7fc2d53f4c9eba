#![allow(dead_code)]

use std::sync::Once;

use column_mapping::rule::Rule;
use column_mapping::types::Expression;
use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Installs a test subscriber once per test binary, filtered by `RUST_LOG`.
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const NO_COLUMNS: &[&str] = &[];

pub fn add_prefix_rule(schema: &str, table: &str, prefix: &str) -> Rule {
    Rule::new(schema, table, "", "id", Expression::AddPrefix, [prefix])
}

pub fn partition_rule(schema: &str, table: &str, arguments: [&str; 3]) -> Rule {
    Rule::new(schema, table, "", "id", Expression::PartitionId, arguments)
}

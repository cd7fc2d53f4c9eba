use serde::{Deserialize, Serialize};

use crate::shared::{PartitionConfig, RuleConfig, ValidationError};

/// Configuration of a column mapping engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MappingConfig {
    /// Whether schema and table names are matched case-sensitively.
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    /// Whether rule sets whose patterns can match the same table are rejected.
    ///
    /// When `false`, overlapping rules are accepted and the first declared rule wins.
    #[serde(default)]
    pub reject_overlapping_rules: bool,
    /// Bit layout used by `partition_id` rules.
    #[serde(default)]
    pub partition: PartitionConfig,
    /// Mapping rules in priority order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl MappingConfig {
    /// Validates the configuration settings that do not depend on the engine.
    ///
    /// Rules are validated by the engine when it is constructed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.partition.validate()
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            case_sensitive: default_case_sensitive(),
            reject_overlapping_rules: false,
            partition: PartitionConfig::default(),
            rules: Vec::new(),
        }
    }
}

const fn default_case_sensitive() -> bool {
    true
}

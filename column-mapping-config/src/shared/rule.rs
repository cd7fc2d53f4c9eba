use std::fmt;

use serde::{Deserialize, Serialize};

/// Transformation applied to the target column of a matched row.
///
/// Parsed leniently from configuration: `add_prefix`, `AddPrefix` and `add-prefix` all name the
/// same expression. Names that match nothing are kept as [`Expression::Unknown`] so the engine can
/// reject the rule with a precise error instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Expression {
    /// Prepends the single argument to the stringified value.
    AddPrefix,
    /// Appends the single argument to the stringified value.
    AddSuffix,
    /// Packs instance, schema and table identity into the high bits of an integer key.
    PartitionId,
    /// An expression name that is not supported.
    Unknown(String),
}

impl Expression {
    /// Returns the number of arguments the expression requires.
    ///
    /// [`Expression::Unknown`] has no arity.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Expression::AddPrefix | Expression::AddSuffix => Some(1),
            Expression::PartitionId => Some(3),
            Expression::Unknown(_) => None,
        }
    }

    /// Returns the canonical configuration name.
    pub fn as_str(&self) -> &str {
        match self {
            Expression::AddPrefix => "add_prefix",
            Expression::AddSuffix => "add_suffix",
            Expression::PartitionId => "partition_id",
            Expression::Unknown(name) => name,
        }
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "addprefix" => Expression::AddPrefix,
            "addsuffix" => Expression::AddSuffix,
            "partitionid" => Expression::PartitionId,
            _ => Expression::Unknown(value.to_string()),
        }
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::from(value.as_str())
    }
}

impl From<Expression> for String {
    fn from(value: Expression) -> Self {
        match value {
            Expression::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column mapping rule as it appears in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
    /// Glob pattern matched against the schema name.
    pub schema_pattern: String,
    /// Glob pattern matched against the table name.
    pub table_pattern: String,
    /// Column whose value feeds the expression. Empty means the target column's own value.
    #[serde(default)]
    pub source_column: String,
    /// Column the expression writes into.
    pub target_column: String,
    pub expression: Expression,
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Free-text label, not interpreted.
    #[serde(default)]
    pub description: String,
}

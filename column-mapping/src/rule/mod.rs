//! Mapping rules and the matcher that selects the rule for a table.

mod matcher;
mod pattern;

pub use matcher::{MappingOptions, RuleMatcher};
pub use pattern::{Pattern, patterns_intersect};

use std::fmt;

use crate::bail;
use crate::error::{ErrorKind, MappingResult};
use crate::types::{Expression, RuleConfig};

/// A declarative instruction describing how one column of matched tables is transformed.
///
/// A rule applies to every table whose schema name matches `schema_pattern` and whose table name
/// matches `table_pattern`. Rules are immutable once handed to the engine; the engine validates
/// them with [`Rule::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Glob pattern matched against the schema name.
    pub schema_pattern: String,
    /// Glob pattern matched against the table name.
    pub table_pattern: String,
    /// Column whose value feeds the expression.
    ///
    /// When empty, the expression reads the target column's own value.
    pub source_column: String,
    /// Column the expression writes into.
    pub target_column: String,
    /// Transformation to apply.
    pub expression: Expression,
    /// Expression arguments.
    ///
    /// `AddPrefix`/`AddSuffix` take the literal to add. `PartitionId` takes the instance
    /// identity, the schema name prefix and the table name prefix.
    pub arguments: Vec<String>,
    /// Free-text label, not interpreted.
    pub description: String,
}

impl Rule {
    /// Creates a rule with an empty description.
    pub fn new<A>(
        schema_pattern: impl Into<String>,
        table_pattern: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        expression: Expression,
        arguments: A,
    ) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            schema_pattern: schema_pattern.into(),
            table_pattern: table_pattern.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
            expression,
            arguments: arguments.into_iter().map(Into::into).collect(),
            description: String::new(),
        }
    }

    /// Sets the description of the rule.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks that the rule is well formed.
    ///
    /// The checks run in a fixed order and the first failing one is reported: non-empty patterns,
    /// non-empty target column, known expression, then argument count.
    pub fn validate(&self) -> MappingResult<()> {
        if self.schema_pattern.is_empty() || self.table_pattern.is_empty() {
            bail!(
                ErrorKind::InvalidSchemaOrTablePattern,
                "Schema and table patterns must not be empty",
                format!(
                    "schema pattern `{}`, table pattern `{}`",
                    self.schema_pattern, self.table_pattern
                )
            );
        }

        if self.target_column.is_empty() {
            bail!(
                ErrorKind::MissingTargetColumn,
                "Rule has no target column"
            );
        }

        let Some(expected) = self.expression.arity() else {
            bail!(
                ErrorKind::UnknownExpression,
                "Rule uses an unknown expression",
                format!("expression `{}`", self.expression)
            );
        };

        if self.arguments.len() != expected {
            bail!(
                ErrorKind::ArgumentCountMismatch,
                "Rule has the wrong number of arguments for its expression",
                format!(
                    "expression `{}` takes {expected} argument(s), got {}",
                    self.expression,
                    self.arguments.len()
                )
            );
        }

        Ok(())
    }

    /// Returns `true` if the rule reads a column other than its target.
    pub fn has_source_column(&self) -> bool {
        !self.source_column.is_empty()
    }

    /// Returns `true` if the rule packs partition identifiers.
    pub fn is_partition_id(&self) -> bool {
        self.expression == Expression::PartitionId
    }

    /// Returns `true` if both rules select tables with the same pair of patterns.
    pub fn same_patterns(&self, other: &Rule) -> bool {
        self.schema_pattern == other.schema_pattern && self.table_pattern == other.table_pattern
    }

    /// Returns a copy whose name-dependent parts are lowercased.
    ///
    /// Used when the engine matches names case-insensitively: patterns and the partition name
    /// prefixes are lowercased so they compare against lowercased schema and table names.
    pub(crate) fn to_lowercase_names(&self) -> Rule {
        let mut rule = self.clone();
        rule.schema_pattern = rule.schema_pattern.to_lowercase();
        rule.table_pattern = rule.table_pattern.to_lowercase();
        if rule.expression == Expression::PartitionId {
            for prefix in rule.arguments.iter_mut().skip(1) {
                *prefix = prefix.to_lowercase();
            }
        }
        rule
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}({})",
            self.schema_pattern,
            self.table_pattern,
            self.expression,
            self.target_column
        )?;
        if !self.description.is_empty() {
            write!(f, " [{}]", self.description)?;
        }
        Ok(())
    }
}

impl From<RuleConfig> for Rule {
    fn from(config: RuleConfig) -> Self {
        Self {
            schema_pattern: config.schema_pattern,
            table_pattern: config.table_pattern,
            source_column: config.source_column,
            target_column: config.target_column,
            expression: config.expression,
            arguments: config.arguments,
            description: config.description,
        }
    }
}

//! Error types and result definitions for column mapping.
//!
//! Every fallible engine operation returns [`MappingResult`]. A [`MappingError`] carries an
//! [`ErrorKind`] for programmatic handling, a static description, optional dynamic detail (rule,
//! schema, table, value), an optional source error and the location where it was raised.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Result type for column mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Error returned by the column mapping engine.
#[derive(Debug, Clone)]
pub struct MappingError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Categories of errors raised by the column mapping engine.
///
/// Kinds are grouped by the phase in which they surface: rule validation and rule-set checks at
/// construction, and per-call failures on the row and DDL paths.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Rule Validation Errors
    InvalidSchemaOrTablePattern,
    MissingTargetColumn,
    UnknownExpression,
    ArgumentCountMismatch,

    // Rule Set Errors
    DuplicateRule,
    OverlappingRules,
    RuleNotFound,

    // Configuration Errors
    InvalidPartitionLayout,
    ConfigError,

    // Column Resolution Errors
    ColumnNotFound,
    RowShapeMismatch,

    // DDL Errors
    UnsupportedDdlRewrite,

    // Partition Identity Errors
    PrefixMismatch,
    InvalidInstanceLiteral,
    IdentityOverflow,
    OriginValueOverflow,

    // Value Errors
    UnsupportedValueType,
}

impl ErrorKind {
    /// Returns `true` for the kinds raised when a single rule fails validation.
    pub fn is_invalid_rule(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidSchemaOrTablePattern
                | ErrorKind::MissingTargetColumn
                | ErrorKind::UnknownExpression
                | ErrorKind::ArgumentCountMismatch
        )
    }
}

impl MappingError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the dynamic detail of this error, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the callsite where this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Prepends `context` to the detail, keeping kind, description and location.
    ///
    /// Used to say which rule failed when a whole rule set is validated.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.detail = Some(match self.detail.take() {
            Some(detail) => Cow::Owned(format!("{context}: {detail}")),
            None => Cow::Owned(context.to_string()),
        });
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        MappingError {
            kind,
            description,
            detail,
            source: None,
            location: Location::caller(),
        }
    }
}

impl PartialEq for MappingError {
    fn eq(&self, other: &MappingError) -> bool {
        self.kind == other.kind
    }
}

impl Hash for MappingError {
    /// Hashes only the kind and static description so repeated failures group together
    /// regardless of the table or value that triggered them.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.description.hash(state);
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            if detail.trim().is_empty() {
                write!(f, "\n  Detail: <empty>")?;
            } else {
                write!(f, "\n  Detail:")?;
                for line in detail.lines() {
                    write!(f, "\n    {line}")?;
                }
            }
        }

        Ok(())
    }
}

impl error::Error for MappingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Creates a [`MappingError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for MappingError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> MappingError {
        MappingError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

/// Creates a [`MappingError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for MappingError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> MappingError {
        MappingError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

/// Converts configuration validation failures into [`ErrorKind::InvalidPartitionLayout`].
impl From<column_mapping_config::shared::ValidationError> for MappingError {
    #[track_caller]
    fn from(err: column_mapping_config::shared::ValidationError) -> MappingError {
        let detail = err.to_string();
        MappingError::from_components(
            ErrorKind::InvalidPartitionLayout,
            Cow::Borrowed("Partition configuration is invalid"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}

/// Converts configuration loading failures into [`ErrorKind::ConfigError`].
impl From<column_mapping_config::load::LoadConfigError> for MappingError {
    #[track_caller]
    fn from(err: column_mapping_config::load::LoadConfigError) -> MappingError {
        let detail = err.to_string();
        MappingError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Failed to load mapping configuration"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, mapping_error};

    fn fails_with_detail() -> MappingResult<()> {
        bail!(
            ErrorKind::ColumnNotFound,
            "Column not found in row",
            "column `id` is missing"
        );
    }

    #[test]
    fn test_macro_builds_kind_and_detail() {
        let err = fails_with_detail().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnNotFound);
        assert_eq!(err.description(), "Column not found in row");
        assert_eq!(err.detail(), Some("column `id` is missing"));
        assert!(err.location().file().ends_with("error.rs"));
    }

    fn fails_for_table(schema: &str, table: &str) -> MappingResult<()> {
        bail!(
            ErrorKind::PrefixMismatch,
            "Name does not start with the configured prefix",
            table: (schema, table),
            "prefix `shard_`"
        );
    }

    #[test]
    fn test_table_errors_name_the_table() {
        let err = fails_for_table("db_1", "orders").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrefixMismatch);
        assert_eq!(err.detail(), Some("db_1.orders: prefix `shard_`"));

        let err = mapping_error!(
            ErrorKind::ColumnNotFound,
            "Mapped column is missing from the table's columns",
            table: ("db_1", "orders"),
            format!("column `{}` not found", "id")
        );
        assert_eq!(err.detail(), Some("db_1.orders: column `id` not found"));
    }

    #[test]
    fn test_with_context_prefixes_detail() {
        let err = mapping_error!(
            ErrorKind::MissingTargetColumn,
            "Rule has no target column"
        )
        .with_context("rule #2 (orders)");
        assert_eq!(err.detail(), Some("rule #2 (orders)"));

        let err = mapping_error!(
            ErrorKind::ArgumentCountMismatch,
            "Rule has the wrong number of arguments",
            "expected 3, got 1"
        )
        .with_context("rule #0");
        assert_eq!(err.detail(), Some("rule #0: expected 3, got 1"));
    }

    #[test]
    fn test_display_contains_kind_and_detail() {
        let err = mapping_error!(
            ErrorKind::OriginValueOverflow,
            "Origin value does not fit",
            "got 17592186044416"
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("[OriginValueOverflow] Origin value does not fit @ "));
        assert!(rendered.contains("Detail:\n    got 17592186044416"));
    }

    #[test]
    fn test_errors_compare_by_kind() {
        let a = mapping_error!(ErrorKind::PrefixMismatch, "a", "x");
        let b = mapping_error!(ErrorKind::PrefixMismatch, "b", "y");
        let c = mapping_error!(ErrorKind::ColumnNotFound, "a");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_rule_kinds() {
        assert!(ErrorKind::MissingTargetColumn.is_invalid_rule());
        assert!(ErrorKind::ArgumentCountMismatch.is_invalid_rule());
        assert!(!ErrorKind::ColumnNotFound.is_invalid_rule());
    }
}

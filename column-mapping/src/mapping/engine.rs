use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, MappingResult};
use crate::mapping::{ColumnInfo, MappingCache, MappingInfo, apply_expression};
use crate::mapping_error;
use crate::partition::{PartitionLayout, PartitionPrefix, compute_partition_id};
use crate::rule::{MappingOptions, Rule, RuleMatcher};
use crate::types::{Cell, MappingConfig};

/// Per-column provenance of a mapped row.
///
/// One entry per value: [`None`] for columns no rule touched, and for the rewritten column the
/// index of the column its new value was derived from (see [`MappingInfo::input_position`]).
pub type Positions = Vec<Option<usize>>;

/// Rewrites rows and screens DDL of tables matched by column mapping rules.
///
/// The engine is `Send + Sync` and meant to be shared by every worker of a pipeline. Matching a
/// table against the rules happens once per table; the outcome, including "no rule applies", is
/// cached until [`ColumnMapping::reset_cache`] or [`ColumnMapping::invalidate_table`].
///
/// The cache keeps the column positions resolved from the first column list seen for a table.
/// Callers must invalidate the table when its column layout changes.
#[derive(Debug)]
pub struct ColumnMapping {
    matcher: RuleMatcher,
    layout: PartitionLayout,
    cache: MappingCache,
}

impl ColumnMapping {
    /// Creates an engine with case-sensitive matching that tolerates overlapping rules.
    ///
    /// Fails on the first invalid rule.
    pub fn new(rules: Vec<Rule>, layout: PartitionLayout) -> MappingResult<Self> {
        Self::with_options(rules, layout, MappingOptions::default())
    }

    /// Creates an engine with explicit matching options.
    pub fn with_options(
        rules: Vec<Rule>,
        layout: PartitionLayout,
        options: MappingOptions,
    ) -> MappingResult<Self> {
        let matcher = RuleMatcher::new(rules, options)?;

        info!(
            rules = matcher.len(),
            instance_bits = layout.instance_bits(),
            schema_bits = layout.schema_bits(),
            table_bits = layout.table_bits(),
            case_sensitive = options.case_sensitive,
            "column mapping initialized"
        );

        Ok(Self {
            matcher,
            layout,
            cache: MappingCache::new(),
        })
    }

    /// Creates an engine from a loaded [`MappingConfig`].
    pub fn from_config(config: &MappingConfig) -> MappingResult<Self> {
        config.validate()?;

        let layout = PartitionLayout::try_from(config.partition)?;
        let rules = config.rules.iter().cloned().map(Rule::from).collect();
        let options = MappingOptions {
            case_sensitive: config.case_sensitive,
            reject_overlapping_rules: config.reject_overlapping_rules,
        };

        Self::with_options(rules, layout, options)
    }

    /// Returns the rules in priority order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.matcher.rules()
    }

    /// Returns the options the engine was built with.
    pub fn options(&self) -> MappingOptions {
        self.matcher.options()
    }

    /// Returns the partition layout used for `PartitionId` rules.
    pub fn partition_layout(&self) -> PartitionLayout {
        self.layout
    }

    /// Replaces the partition layout and clears the cache, whose prefixes were computed with the
    /// previous layout.
    pub fn set_partition_layout(&mut self, layout: PartitionLayout) {
        debug!(
            instance_bits = layout.instance_bits(),
            schema_bits = layout.schema_bits(),
            table_bits = layout.table_bits(),
            "partition layout replaced"
        );

        self.layout = layout;
        self.reset_cache();
    }

    /// Appends a rule with the lowest priority and clears the cache.
    pub fn add_rule(&mut self, rule: Rule) -> MappingResult<()> {
        self.matcher.add(rule)?;
        self.reset_cache();

        Ok(())
    }

    /// Replaces the rule with the same patterns, returning the previous one, and clears the cache.
    pub fn update_rule(&mut self, rule: Rule) -> MappingResult<Arc<Rule>> {
        let previous = self.matcher.update(rule)?;
        self.reset_cache();

        Ok(previous)
    }

    /// Removes the rule with the given patterns and clears the cache.
    pub fn remove_rule(
        &mut self,
        schema_pattern: &str,
        table_pattern: &str,
    ) -> MappingResult<Arc<Rule>> {
        let removed = self.matcher.remove(schema_pattern, table_pattern)?;
        self.reset_cache();

        Ok(removed)
    }

    /// Drops every cached table mapping.
    pub fn reset_cache(&self) {
        debug!(tables = self.cache.len(), "column mapping cache reset");
        self.cache.clear();
    }

    /// Drops the cached mapping of one table, returning whether it was cached.
    pub fn invalidate_table(&self, schema: &str, table: &str) -> bool {
        let schema = self.fold_case(schema);
        let table = self.fold_case(table);

        self.cache.remove(&schema, &table)
    }

    /// Returns the number of tables with a cached mapping.
    pub fn cached_tables(&self) -> usize {
        self.cache.len()
    }

    /// Returns the mapping of `schema`.`table`, resolving and caching it on first use.
    ///
    /// `columns` are the table's column names in row order; they are only consulted when the
    /// table is not cached yet.
    pub fn query_column_info<S>(
        &self,
        schema: &str,
        table: &str,
        columns: &[S],
    ) -> MappingResult<Arc<ColumnInfo>>
    where
        S: AsRef<str>,
    {
        let schema = self.fold_case(schema);
        let table = self.fold_case(table);

        self.cache
            .get_or_try_insert_with(&schema, &table, || self.resolve(&schema, &table, columns))
    }

    /// Transforms one row of `schema`.`table`.
    ///
    /// Rows of unmatched tables are returned as is with no positions. For matched tables the
    /// rule's target value is rewritten and the positions describe which column changed.
    /// The row is consumed; use [`ColumnMapping::handle_row_value_in_place`] to keep it when
    /// mapping fails.
    pub fn handle_row_value<S>(
        &self,
        schema: &str,
        table: &str,
        columns: &[S],
        mut values: Vec<Cell>,
    ) -> MappingResult<(Vec<Cell>, Option<Positions>)>
    where
        S: AsRef<str>,
    {
        let positions = self.handle_row_value_in_place(schema, table, columns, &mut values)?;

        Ok((values, positions))
    }

    /// Transforms one row of `schema`.`table` in place.
    ///
    /// Same outcome as [`ColumnMapping::handle_row_value`], but on error `values` is left
    /// untouched so the caller can skip or report the row.
    pub fn handle_row_value_in_place<S>(
        &self,
        schema: &str,
        table: &str,
        columns: &[S],
        values: &mut [Cell],
    ) -> MappingResult<Option<Positions>>
    where
        S: AsRef<str>,
    {
        let info = self.query_column_info(schema, table, columns)?;
        let ColumnInfo::Matched(info) = info.as_ref() else {
            return Ok(None);
        };

        apply_expression(info, values, &self.layout)?;

        Ok(Some(positions(info, values.len())))
    }

    /// Screens a DDL statement on `schema`.`table`.
    ///
    /// Statements on unmatched tables are returned unchanged. Statements on matched tables are
    /// rejected with [`ErrorKind::UnsupportedDdlRewrite`] whatever their text, since they may
    /// change the very columns the rule maps; the table's cached mapping is dropped so it is
    /// resolved again once the caller has reconciled the schema.
    pub fn handle_ddl<'a, S>(
        &self,
        schema: &str,
        table: &str,
        columns: &[S],
        statement: &'a str,
    ) -> MappingResult<(&'a str, Option<Positions>)>
    where
        S: AsRef<str>,
    {
        let folded_schema = self.fold_case(schema);
        let folded_table = self.fold_case(table);

        let rule = match self.cache.get(&folded_schema, &folded_table) {
            Some(info) => info.mapping().map(|info| Arc::clone(&info.rule)),
            None => match self.matcher.first_match(&folded_schema, &folded_table) {
                Some(rule) => Some(Arc::clone(rule)),
                None => {
                    // Record the negative outcome so rows of this table skip matching.
                    self.query_column_info(schema, table, columns)?;
                    None
                }
            },
        };

        let Some(rule) = rule else {
            return Ok((statement, None));
        };

        self.cache.remove(&folded_schema, &folded_table);

        bail!(
            ErrorKind::UnsupportedDdlRewrite,
            "DDL on a table with a column mapping rule cannot be rewritten",
            table: (schema, table),
            format!("statement `{statement}`, rule {rule}")
        );
    }

    fn fold_case<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.matcher.options().case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }

    /// Matches a table against the rules and resolves the matched rule's columns and identity.
    fn resolve<S>(&self, schema: &str, table: &str, columns: &[S]) -> MappingResult<ColumnInfo>
    where
        S: AsRef<str>,
    {
        let Some(rule) = self.matcher.first_match(schema, table) else {
            return Ok(ColumnInfo::NoMatch);
        };

        let source_position = if rule.has_source_column() {
            Some(find_column(columns, &rule.source_column, schema, table)?)
        } else {
            None
        };
        let target_position = find_column(columns, &rule.target_column, schema, table)?;

        let partition = if rule.is_partition_id() {
            compute_partition_id(schema, table, rule, &self.layout)?
        } else {
            PartitionPrefix::default()
        };

        debug!(
            schema,
            table,
            rule = %rule,
            ?source_position,
            target_position,
            "column mapping resolved for table"
        );

        Ok(ColumnInfo::Matched(MappingInfo {
            rule: Arc::clone(rule),
            source_position,
            target_position,
            partition,
        }))
    }
}

fn find_column<S>(columns: &[S], column: &str, schema: &str, table: &str) -> MappingResult<usize>
where
    S: AsRef<str>,
{
    columns
        .iter()
        .position(|name| name.as_ref() == column)
        .ok_or_else(|| {
            mapping_error!(
                ErrorKind::ColumnNotFound,
                "Mapped column is missing from the table's columns",
                table: (schema, table),
                format!("column `{column}` not found")
            )
        })
}

fn positions(info: &MappingInfo, len: usize) -> Positions {
    let mut positions = vec![None; len];
    positions[info.target_position] = Some(info.input_position());
    positions
}

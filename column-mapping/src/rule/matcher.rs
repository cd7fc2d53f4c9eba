use std::sync::Arc;

use tracing::warn;

use crate::error::{ErrorKind, MappingResult};
use crate::rule::{Pattern, Rule, patterns_intersect};
use crate::{bail, mapping_error};

/// Options controlling how rules are compiled and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    /// Whether names are matched case-sensitively.
    pub case_sensitive: bool,
    /// Whether a rule set with competing rules is rejected instead of logged.
    pub reject_overlapping_rules: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            reject_overlapping_rules: false,
        }
    }
}

/// A validated rule together with its compiled patterns.
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: Arc<Rule>,
    schema: Pattern,
    table: Pattern,
}

impl CompiledRule {
    fn new(rule: Rule, case_sensitive: bool) -> MappingResult<Self> {
        rule.validate()?;

        let rule = if case_sensitive {
            rule
        } else {
            rule.to_lowercase_names()
        };

        Ok(Self {
            schema: Pattern::new(&rule.schema_pattern)?,
            table: Pattern::new(&rule.table_pattern)?,
            rule: Arc::new(rule),
        })
    }

    fn matches(&self, schema: &str, table: &str) -> bool {
        self.schema.is_match(schema) && self.table.is_match(table)
    }

    fn overlaps(&self, other: &CompiledRule) -> bool {
        patterns_intersect(self.schema.as_str(), other.schema.as_str())
            && patterns_intersect(self.table.as_str(), other.table.as_str())
    }
}

/// Ordered set of validated rules; selects the rule that applies to a table.
///
/// Rules are tried in declaration order and the first one whose schema and table patterns both
/// match wins. No two rules may have identical patterns. Rules whose patterns merely overlap are
/// reported when they are added and rejected if [`MappingOptions::reject_overlapping_rules`] is
/// set.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    options: MappingOptions,
}

impl RuleMatcher {
    /// Validates and compiles `rules`, failing on the first invalid one.
    pub fn new(rules: Vec<Rule>, options: MappingOptions) -> MappingResult<Self> {
        let mut matcher = Self {
            rules: Vec::with_capacity(rules.len()),
            options,
        };

        for rule in rules {
            matcher.add(rule)?;
        }

        Ok(matcher)
    }

    /// Returns the options the matcher was built with.
    pub fn options(&self) -> MappingOptions {
        self.options
    }

    /// Returns the rules in priority order.
    ///
    /// With case-insensitive matching these are the lowercased copies the matcher uses.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the matcher has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first rule matching `schema` and `table`.
    ///
    /// Names must already be lowercased when matching is case-insensitive.
    pub fn first_match(&self, schema: &str, table: &str) -> Option<&Arc<Rule>> {
        self.rules
            .iter()
            .find(|compiled| compiled.matches(schema, table))
            .map(|compiled| &compiled.rule)
    }

    /// Appends a rule with the lowest priority.
    pub fn add(&mut self, rule: Rule) -> MappingResult<()> {
        let index = self.rules.len();
        let label = rule_label(index, &rule);
        let compiled = CompiledRule::new(rule, self.options.case_sensitive)
            .map_err(|err| err.with_context(&label))?;

        if let Some(existing) = self.position(&compiled.rule) {
            bail!(
                ErrorKind::DuplicateRule,
                "A rule with the same schema and table patterns already exists",
                format!("{label} duplicates rule #{existing}")
            );
        }

        self.check_overlaps(&compiled, &label, None)?;
        self.rules.push(compiled);

        Ok(())
    }

    /// Replaces the rule that has the same patterns as `rule`, keeping its priority.
    pub fn update(&mut self, rule: Rule) -> MappingResult<Arc<Rule>> {
        let compiled = CompiledRule::new(rule, self.options.case_sensitive)?;

        let Some(index) = self.position(&compiled.rule) else {
            bail!(
                ErrorKind::RuleNotFound,
                "No rule with these schema and table patterns exists",
                compiled.rule.to_string()
            );
        };

        let label = rule_label(index, &compiled.rule);
        self.check_overlaps(&compiled, &label, Some(index))?;

        let previous = std::mem::replace(&mut self.rules[index], compiled);
        Ok(previous.rule)
    }

    /// Removes the rule with the given patterns and returns it.
    pub fn remove(&mut self, schema_pattern: &str, table_pattern: &str) -> MappingResult<Arc<Rule>> {
        let (schema_pattern, table_pattern) = if self.options.case_sensitive {
            (schema_pattern.to_string(), table_pattern.to_string())
        } else {
            (schema_pattern.to_lowercase(), table_pattern.to_lowercase())
        };

        let index = self
            .rules
            .iter()
            .position(|compiled| {
                compiled.rule.schema_pattern == schema_pattern
                    && compiled.rule.table_pattern == table_pattern
            })
            .ok_or_else(|| {
                mapping_error!(
                    ErrorKind::RuleNotFound,
                    "No rule with these schema and table patterns exists",
                    format!("schema pattern `{schema_pattern}`, table pattern `{table_pattern}`")
                )
            })?;

        Ok(self.rules.remove(index).rule)
    }

    fn position(&self, rule: &Rule) -> Option<usize> {
        self.rules
            .iter()
            .position(|compiled| compiled.rule.same_patterns(rule))
    }

    fn check_overlaps(
        &self,
        candidate: &CompiledRule,
        label: &str,
        skip: Option<usize>,
    ) -> MappingResult<()> {
        for (index, existing) in self.rules.iter().enumerate() {
            if Some(index) == skip || !existing.overlaps(candidate) {
                continue;
            }

            if self.options.reject_overlapping_rules {
                bail!(
                    ErrorKind::OverlappingRules,
                    "Rules can match the same schema and table",
                    format!("{label} overlaps rule #{index} ({})", existing.rule)
                );
            }

            warn!(
                rule = %candidate.rule,
                shadowed_by = %existing.rule,
                "{label} overlaps rule #{index}, tables matched by both use the earlier rule"
            );
        }

        Ok(())
    }
}

fn rule_label(index: usize, rule: &Rule) -> String {
    if rule.description.is_empty() {
        format!("rule #{index}")
    } else {
        format!("rule #{index} ({})", rule.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Expression;

    fn prefix_rule(schema: &str, table: &str, prefix: &str) -> Rule {
        Rule::new(schema, table, "", "id", Expression::AddPrefix, [prefix])
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = RuleMatcher::new(
            vec![
                prefix_rule("test*", "xxx*", "a:"),
                prefix_rule("test_1", "xxx_1", "b:"),
            ],
            MappingOptions::default(),
        )
        .unwrap();

        let rule = matcher.first_match("test_1", "xxx_1").unwrap();
        assert_eq!(rule.arguments, vec!["a:"]);
        assert!(matcher.first_match("abc", "xxx").is_none());
        assert!(matcher.first_match("test", "yyy").is_none());
    }

    #[test]
    fn test_invalid_rule_reports_its_position() {
        let err = RuleMatcher::new(
            vec![
                prefix_rule("test*", "xxx*", "a:"),
                Rule::new("s*", "t*", "", "", Expression::AddPrefix, ["b:"])
                    .with_description("broken"),
            ],
            MappingOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingTargetColumn);
        assert_eq!(err.detail(), Some("rule #1 (broken)"));
    }

    #[test]
    fn test_duplicate_patterns_are_rejected() {
        let err = RuleMatcher::new(
            vec![prefix_rule("test*", "xxx*", "a:"), prefix_rule("test*", "xxx*", "b:")],
            MappingOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateRule);
    }

    #[test]
    fn test_overlapping_rules() {
        let rules = vec![
            prefix_rule("test*", "xxx*", "a:"),
            prefix_rule("test_*", "x*", "b:"),
        ];

        let matcher = RuleMatcher::new(rules.clone(), MappingOptions::default()).unwrap();
        assert_eq!(matcher.len(), 2);

        let err = RuleMatcher::new(
            rules,
            MappingOptions {
                reject_overlapping_rules: true,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverlappingRules);

        let disjoint = RuleMatcher::new(
            vec![prefix_rule("test*", "xxx*", "a:"), prefix_rule("abc*", "xxx*", "b:")],
            MappingOptions {
                reject_overlapping_rules: true,
                ..Default::default()
            },
        );
        assert!(disjoint.is_ok());
    }

    #[test]
    fn test_case_insensitive_matching() {
        let matcher = RuleMatcher::new(
            vec![prefix_rule("Test*", "XXX*", "a:")],
            MappingOptions {
                case_sensitive: false,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(matcher.first_match("test_1", "xxx").is_some());
        assert_eq!(matcher.rules().next().unwrap().schema_pattern, "test*");

        let sensitive =
            RuleMatcher::new(vec![prefix_rule("Test*", "XXX*", "a:")], MappingOptions::default())
                .unwrap();
        assert!(sensitive.first_match("test_1", "xxx").is_none());
        assert!(sensitive.first_match("Test_1", "XXX").is_some());
    }

    #[test]
    fn test_add_update_remove() {
        let mut matcher =
            RuleMatcher::new(vec![prefix_rule("test*", "xxx*", "a:")], MappingOptions::default())
                .unwrap();

        assert_eq!(
            matcher.add(prefix_rule("test*", "xxx*", "b:")).unwrap_err().kind(),
            ErrorKind::DuplicateRule
        );

        matcher.add(prefix_rule("abc*", "xxx*", "c:")).unwrap();
        assert_eq!(matcher.len(), 2);

        let previous = matcher.update(prefix_rule("test*", "xxx*", "b:")).unwrap();
        assert_eq!(previous.arguments, vec!["a:"]);
        assert_eq!(
            matcher.first_match("test", "xxx").unwrap().arguments,
            vec!["b:"]
        );

        assert_eq!(
            matcher.update(prefix_rule("zzz", "xxx", "d:")).unwrap_err().kind(),
            ErrorKind::RuleNotFound
        );

        let removed = matcher.remove("test*", "xxx*").unwrap();
        assert_eq!(removed.arguments, vec!["b:"]);
        assert!(matcher.first_match("test", "xxx").is_none());
        assert_eq!(
            matcher.remove("test*", "xxx*").unwrap_err().kind(),
            ErrorKind::RuleNotFound
        );
    }
}

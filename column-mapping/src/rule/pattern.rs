use regex::Regex;

use crate::error::{ErrorKind, MappingResult};
use crate::mapping_error;

/// A compiled glob pattern for schema or table names.
///
/// `*` matches any run of characters (including none) and `?` matches exactly one character.
/// Every other character matches itself. The pattern must match the whole name.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a glob pattern.
    pub fn new(pattern: &str) -> MappingResult<Self> {
        let mut regex_pattern = String::with_capacity(pattern.len() + 8);
        regex_pattern.push('^');

        let mut literal = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                other => regex_pattern.push_str(&regex::escape(other.encode_utf8(&mut literal))),
            }
        }
        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern).map_err(|err| {
            mapping_error!(
                ErrorKind::InvalidSchemaOrTablePattern,
                "Pattern could not be compiled",
                format!("pattern `{pattern}`"),
                source: err
            )
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns `true` if `name` matches the pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Returns the glob the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Returns `true` if some concrete name is matched by both glob patterns.
///
/// Used to detect rules that compete for the same table. Runs in `O(len(a) * len(b))`.
pub fn patterns_intersect(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // reachable[i][j]: a[i..] and b[j..] can still produce a common string.
    let mut reachable = vec![vec![false; b.len() + 1]; a.len() + 1];
    reachable[a.len()][b.len()] = true;

    for i in (0..=a.len()).rev() {
        for j in (0..=b.len()).rev() {
            if i == a.len() && j == b.len() {
                continue;
            }

            let a_star = a.get(i) == Some(&'*');
            let b_star = b.get(j) == Some(&'*');

            reachable[i][j] = if a_star {
                // `*` in a is empty, or it absorbs b[j].
                reachable[i + 1][j] || (j < b.len() && reachable[i][j + 1])
            } else if b_star {
                reachable[i][j + 1] || (i < a.len() && reachable[i + 1][j])
            } else if i < a.len() && j < b.len() {
                (a[i] == b[j] || a[i] == '?' || b[j] == '?') && reachable[i + 1][j + 1]
            } else {
                false
            };
        }
    }

    reachable[0][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_wildcard() {
        let pattern = Pattern::new("test*").unwrap();
        assert!(pattern.is_match("test"));
        assert!(pattern.is_match("test_1"));
        assert!(!pattern.is_match("atest"));
        assert!(!pattern.is_match("tes"));
        assert_eq!(pattern.as_str(), "test*");
    }

    #[test]
    fn test_wildcards_in_any_position() {
        let pattern = Pattern::new("shard_*_orders").unwrap();
        assert!(pattern.is_match("shard_1_orders"));
        assert!(pattern.is_match("shard__orders"));
        assert!(!pattern.is_match("shard_1_orders_archive"));

        let pattern = Pattern::new("t_?").unwrap();
        assert!(pattern.is_match("t_1"));
        assert!(!pattern.is_match("t_12"));
        assert!(!pattern.is_match("t_"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = Pattern::new("db.v1+(a)").unwrap();
        assert!(pattern.is_match("db.v1+(a)"));
        assert!(!pattern.is_match("dbxv11a"));
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = Pattern::new("orders").unwrap();
        assert!(pattern.is_match("orders"));
        assert!(!pattern.is_match("Orders"));
        assert!(!pattern.is_match("orders_1"));
    }

    #[test]
    fn test_patterns_intersect() {
        assert!(patterns_intersect("test*", "test_*"));
        assert!(patterns_intersect("*", "anything"));
        assert!(patterns_intersect("a*c", "ab*"));
        assert!(patterns_intersect("t_?", "t_1"));
        assert!(patterns_intersect("*_1", "shard_*"));
        assert!(patterns_intersect("orders", "orders"));

        assert!(!patterns_intersect("test*", "abc*"));
        assert!(!patterns_intersect("t_?", "t_12"));
        assert!(!patterns_intersect("a*b", "a*c"));
        assert!(!patterns_intersect("orders", "orders_1"));
    }
}

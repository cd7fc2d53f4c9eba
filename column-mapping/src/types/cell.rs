use std::fmt;

/// A single column value of a replicated row.
///
/// Only the representations the mapping expressions can read or produce are modelled. Callers
/// convert their decoded row values into [`Cell`]s at the edge of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    /// SQL `NULL` or a value the caller did not decode.
    Null,
    /// Any integer column value.
    I64(i64),
    /// Any textual column value, including integers carried as text.
    String(String),
}

impl Cell {
    /// Returns `true` if the cell is [`Cell::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the name of the representation, used in error details.
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::I64(_) => "integer",
            Cell::String(_) => "string",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::String(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I64(i64::from(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Cell::from(1), Cell::I64(1));
        assert_eq!(Cell::from(1_i64 << 44), Cell::I64(1 << 44));
        assert_eq!(Cell::from("1"), Cell::String("1".to_string()));
        assert_eq!(Cell::from(None::<i64>), Cell::Null);
        assert_eq!(Cell::from(Some("a")), Cell::String("a".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::Null.to_string(), "NULL");
        assert_eq!(Cell::I64(-7).to_string(), "-7");
        assert_eq!(Cell::from("abc").to_string(), "abc");
    }
}

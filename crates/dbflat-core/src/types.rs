//! Core types for dbflat

use std::sync::Arc;

/// A database value as it comes off a result cursor or goes into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Binary data that is not valid UTF-8
    Bytes(Vec<u8>),
}

impl Value {
    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Build a text parameter, or NULL when `text` is `None`.
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            Some(s) => Value::String(s.to_string()),
            None => Value::Null,
        }
    }
}

/// Textual representation used when a value is written to a flat file.
///
/// `Null` renders as the empty string; the codec decides whether a null
/// is written as a sentinel instead. Bytes render as lowercase hex.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&hex::encode(v)),
        }
    }
}

/// A row from a query cursor
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values, one per result column
    pub values: Vec<Value>,
    /// Column names (shared by every row of one cursor)
    columns: Arc<[String]>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Result column metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMeta {
    /// Column name
    pub name: String,
    /// Data type (database-specific string)
    pub data_type: String,
    /// Column ordinal position (0-based)
    pub ordinal: usize,
}

/// Summary returned once a cursor has been fully consumed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorSummary {
    /// Columns of the result set, in result order
    pub columns: Vec<ColumnMeta>,
    /// Number of rows handed to the row callback
    pub rows_read: u64,
}

impl CursorSummary {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_flat_file_text() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int64(-42).to_string(), "-42");
        assert_eq!(Value::Float64(1.5).to_string(), "1.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("a b".into()).to_string(), "a b");
        assert_eq!(Value::Bytes(vec![0xde, 0xad, 0x01]).to_string(), "dead01");
    }

    #[test]
    fn from_text_maps_none_to_null() {
        assert_eq!(Value::from_text(None), Value::Null);
        assert_eq!(Value::from_text(Some("")), Value::String(String::new()));
    }

    #[test]
    fn row_lookup_by_name() {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        let row = Row::new(columns, vec![Value::Int64(1), Value::String("x".into())]);
        assert_eq!(row.get(0), Some(&Value::Int64(1)));
        assert_eq!(row.get_by_name("name"), Some(&Value::String("x".into())));
        assert_eq!(row.get_by_name("missing"), None);
    }
}

//! Schema introspection trait and types

use crate::{Result, TableRef};

/// Schema introspection interface
pub trait SchemaIntrospection: Send + Sync {
    /// Get columns for a table, ordered by physical column position.
    ///
    /// An unknown table yields an empty list rather than an error.
    fn get_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>>;

    /// Get the ordered column names for a table
    fn column_names(&self, table: &TableRef) -> Result<Vec<String>> {
        Ok(self
            .get_columns(table)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }
}

/// Column information
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub ordinal: usize,
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnInfo {
    /// Nullable, untyped column at `ordinal`
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type: String::new(),
            nullable: true,
            is_primary_key: false,
        }
    }
}

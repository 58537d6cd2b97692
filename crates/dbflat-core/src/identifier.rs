//! Table references and identifier quoting

use crate::{DbflatError, Result};

/// Quote an identifier with double quotes, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A possibly schema-qualified table name as given by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Parse `table` or `schema.table`.
    ///
    /// The name is split at the first dot outside double quotes, then each
    /// part is unquoted, so `"my.table"` names a single table containing a
    /// dot and `"main"."config"` is schema `main`, table `config`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DbflatError::Configuration(
                "table name must not be empty".into(),
            ));
        }

        let (schema, name) = match split_qualified(input) {
            Some((schema, name)) => (Some(unquote(schema)), unquote(name)),
            None => (None, unquote(input)),
        };
        if name.is_empty() || schema.as_ref().is_some_and(|s| s.is_empty()) {
            return Err(DbflatError::Configuration(format!(
                "invalid table name '{}'",
                input
            )));
        }
        Ok(Self { schema, name })
    }

    /// Quoted form for use in statement text
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&self.name)),
            None => quote_identifier(&self.name),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Split at the first dot that is not inside double quotes
fn split_qualified(input: &str) -> Option<(&str, &str)> {
    let mut quoted = false;
    for (idx, ch) in input.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            '.' if !quoted => return Some((&input[..idx], &input[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// Drop surrounding double quotes and undouble embedded ones
fn unquote(part: &str) -> String {
    match part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => part.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("name"), "\"name\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn parse_plain_and_qualified() {
        assert_eq!(TableRef::parse("config").unwrap(), TableRef::new("config"));

        let qualified = TableRef::parse("main.config").unwrap();
        assert_eq!(qualified.schema.as_deref(), Some("main"));
        assert_eq!(qualified.name, "config");
        assert_eq!(qualified.quoted(), "\"main\".\"config\"");
        assert_eq!(qualified.to_string(), "main.config");
    }

    #[test]
    fn parse_quoted_name_keeps_dot() {
        let table = TableRef::parse("\"odd.name\"").unwrap();
        assert_eq!(table.schema, None);
        assert_eq!(table.name, "odd.name");
    }

    #[test]
    fn parse_quoted_parts_split_outside_quotes() {
        let table = TableRef::parse("\"main\".\"config\"").unwrap();
        assert_eq!(table.schema.as_deref(), Some("main"));
        assert_eq!(table.name, "config");

        let table = TableRef::parse("\"my.schema\".config").unwrap();
        assert_eq!(table.schema.as_deref(), Some("my.schema"));
        assert_eq!(table.name, "config");
        assert_eq!(table.quoted(), "\"my.schema\".\"config\"");

        let table = TableRef::parse("main.\"we\"\"ird.t\"").unwrap();
        assert_eq!(table.schema.as_deref(), Some("main"));
        assert_eq!(table.name, "we\"ird.t");
        assert_eq!(table.quoted(), "\"main\".\"we\"\"ird.t\"");
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(TableRef::parse("").is_err());
        assert!(TableRef::parse("   ").is_err());
        assert!(TableRef::parse(".config").is_err());
        assert!(TableRef::parse("main.").is_err());
        assert!(TableRef::parse("\"\"").is_err());
        assert!(TableRef::parse("main.\"\"").is_err());
    }
}

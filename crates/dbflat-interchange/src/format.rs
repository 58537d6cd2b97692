//! Delimited record encoding shared by export and import

use std::fmt::Write as _;

use dbflat_core::Value;

/// Column separator used in binary mode (ASCII unit separator)
pub const UNIT_SEPARATOR: &str = "\u{1f}";

/// Row separator used in binary mode (ASCII record separator followed by a newline)
pub const RECORD_SEPARATOR: &str = "\u{1e}\n";

/// Marker written for NULL in binary mode
pub const NULL_SENTINEL: &str = "\\N";

/// Column separator used in textual mode unless overridden
pub const DEFAULT_COLUMN_SEPARATOR: &str = " ";

/// Row separator used in textual mode unless overridden
pub const DEFAULT_ROW_SEPARATOR: &str = "\n";

/// Separator pair plus the null-handling mode.
///
/// In binary mode the separators are fixed to [`UNIT_SEPARATOR`] and
/// [`RECORD_SEPARATOR`] and NULL is written as [`NULL_SENTINEL`]. In textual
/// mode NULL is written as an empty field and read back as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterConfig {
    column_separator: String,
    row_separator: String,
    binary: bool,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self::text(DEFAULT_COLUMN_SEPARATOR, DEFAULT_ROW_SEPARATOR)
    }
}

impl DelimiterConfig {
    /// Textual mode with the given separators
    pub fn text(column_separator: impl Into<String>, row_separator: impl Into<String>) -> Self {
        Self {
            column_separator: column_separator.into(),
            row_separator: row_separator.into(),
            binary: false,
        }
    }

    /// Binary mode
    pub fn binary() -> Self {
        Self {
            column_separator: UNIT_SEPARATOR.to_string(),
            row_separator: RECORD_SEPARATOR.to_string(),
            binary: true,
        }
    }

    /// Build a configuration from user choices.
    ///
    /// Binary mode wins over any separator override.
    pub fn resolve(
        binary: bool,
        column_separator: Option<String>,
        row_separator: Option<String>,
    ) -> Self {
        if binary {
            if column_separator.is_some() || row_separator.is_some() {
                tracing::debug!("binary mode ignores custom separators");
            }
            return Self::binary();
        }
        Self::text(
            column_separator.unwrap_or_else(|| DEFAULT_COLUMN_SEPARATOR.to_string()),
            row_separator.unwrap_or_else(|| DEFAULT_ROW_SEPARATOR.to_string()),
        )
    }

    pub fn column_separator(&self) -> &str {
        &self.column_separator
    }

    pub fn row_separator(&self) -> &str {
        &self.row_separator
    }

    /// Whether records end at a plain newline, with a trailing `\r` tolerated
    pub fn is_line_oriented(&self) -> bool {
        self.row_separator == "\n"
    }
}

/// Append one encoded row, including its row separator, to `out`.
pub fn encode_row_into(out: &mut String, values: &[Value], config: &DelimiterConfig) {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push_str(&config.column_separator);
        }
        match value {
            Value::Null => {
                if config.binary {
                    out.push_str(NULL_SENTINEL);
                }
            }
            Value::String(s) => out.push_str(s),
            other => {
                // Writing into a String cannot fail
                let _ = write!(out, "{}", other);
            }
        }
    }
    out.push_str(&config.row_separator);
}

/// Encode one row, including its row separator
pub fn encode_row(values: &[Value], config: &DelimiterConfig) -> String {
    let mut out = String::new();
    encode_row_into(&mut out, values, config);
    out
}

/// Split a record into fields without allocating.
///
/// `None` marks a NULL field (binary mode only). An empty column separator
/// leaves the whole record as one field.
pub fn decode_fields<'a>(
    record: &'a str,
    config: &'a DelimiterConfig,
) -> impl Iterator<Item = Option<&'a str>> + 'a {
    let limit = if config.column_separator.is_empty() {
        1
    } else {
        usize::MAX
    };
    let binary = config.binary;
    record
        .splitn(limit, config.column_separator.as_str())
        .map(move |field| {
            if binary && field == NULL_SENTINEL {
                None
            } else {
                Some(field)
            }
        })
}

/// Split a record into fields
pub fn decode_record<'a>(record: &'a str, config: &'a DelimiterConfig) -> Vec<Option<&'a str>> {
    decode_fields(record, config).collect()
}

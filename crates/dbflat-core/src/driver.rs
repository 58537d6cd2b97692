//! Connection configuration handed to drivers

use std::collections::HashMap;

/// Connection configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "sqlite")
    pub driver: String,
    /// Database name or file path
    pub database: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            ..Default::default()
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Add an extra parameter
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "database" | "path" => self.database.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_take_precedence_over_fields() {
        let config = ConnectionConfig::new_sqlite("/tmp/a.db");
        assert_eq!(config.get_string("path").as_deref(), Some("/tmp/a.db"));
        assert_eq!(config.get_string("database").as_deref(), Some("/tmp/a.db"));

        let config = config.with_param("path", "/tmp/b.db");
        assert_eq!(config.get_string("path").as_deref(), Some("/tmp/b.db"));
        assert_eq!(config.get_string("busy_timeout_ms"), None);
    }
}

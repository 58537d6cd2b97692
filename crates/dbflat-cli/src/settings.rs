//! Settings file (`~/.dbflat.toml`)
//!
//! ```toml
//! database = "/var/lib/assessor/property.db"
//! verbosity = "quiet"
//! busy_timeout_ms = 5000
//!
//! [format]
//! column_separator = "\t"
//! row_separator = "\n"
//! ```
//!
//! Command-line flags override every value here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use dbflat_core::ConnectionConfig;
use dbflat_interchange::Verbosity;
use serde::Deserialize;

const SETTINGS_FILE_NAME: &str = ".dbflat.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite database path
    pub database: Option<String>,
    pub verbosity: Option<Verbosity>,
    pub busy_timeout_ms: Option<u64>,
    pub format: FormatSettings,
}

/// Default separators for textual mode
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    pub column_separator: Option<String>,
    pub row_separator: Option<String>,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(SETTINGS_FILE_NAME))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// Home settings if present, overlaid by `explicit` which must exist
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match Self::default_path() {
            Some(path) if path.is_file() => Self::load_file(&path)?,
            _ => Self::default(),
        };
        if let Some(path) = explicit {
            settings.merge(Self::load_file(path)?);
        }
        Ok(settings)
    }

    /// Take every value `other` sets
    pub fn merge(&mut self, other: Settings) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.verbosity.is_some() {
            self.verbosity = other.verbosity;
        }
        if other.busy_timeout_ms.is_some() {
            self.busy_timeout_ms = other.busy_timeout_ms;
        }
        if other.format.column_separator.is_some() {
            self.format.column_separator = other.format.column_separator;
        }
        if other.format.row_separator.is_some() {
            self.format.row_separator = other.format.row_separator;
        }
    }

    /// Connection settings, with `database_flag` taking precedence
    pub fn connection_config(&self, database_flag: Option<&str>) -> anyhow::Result<ConnectionConfig> {
        let database = database_flag
            .map(str::to_string)
            .or_else(|| self.database.clone())
            .ok_or_else(|| {
                anyhow!(
                    "no database given; pass --database, set DBFLAT_DATABASE or add `database = \"...\"` to ~/{}",
                    SETTINGS_FILE_NAME
                )
            })?;

        let mut config = ConnectionConfig::new_sqlite(&database);
        if let Some(timeout) = self.busy_timeout_ms {
            config = config.with_param("busy_timeout_ms", &timeout.to_string());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_file() {
        let settings = Settings::from_toml(
            r#"
            database = "/tmp/property.db"
            verbosity = "detailed"
            busy_timeout_ms = 250

            [format]
            column_separator = "\t"
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.as_deref(), Some("/tmp/property.db"));
        assert_eq!(settings.verbosity, Some(Verbosity::Detailed));
        assert_eq!(settings.format.column_separator.as_deref(), Some("\t"));
        assert_eq!(settings.format.row_separator, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Settings::from_toml("databse = \"x\"").is_err());
        assert!(Settings::from_toml("verbosity = \"loud\"").is_err());
    }

    #[test]
    fn test_merge_prefers_later_values() {
        let mut base = Settings::from_toml(
            r#"
            database = "/a.db"
            verbosity = "quiet"
            [format]
            row_separator = "|"
            "#,
        )
        .unwrap();
        base.merge(Settings::from_toml("database = \"/b.db\"").unwrap());

        assert_eq!(base.database.as_deref(), Some("/b.db"));
        assert_eq!(base.verbosity, Some(Verbosity::Quiet));
        assert_eq!(base.format.row_separator.as_deref(), Some("|"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbflat.toml");
        fs::write(&path, "busy_timeout_ms = 900\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.busy_timeout_ms, Some(900));

        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_connection_config_precedence() {
        let settings = Settings {
            database: Some("/from/file.db".into()),
            busy_timeout_ms: Some(100),
            ..Default::default()
        };

        let config = settings.connection_config(None).unwrap();
        assert_eq!(config.get_string("path").as_deref(), Some("/from/file.db"));
        assert_eq!(config.get_string("busy_timeout_ms").as_deref(), Some("100"));

        let config = settings.connection_config(Some("/from/flag.db")).unwrap();
        assert_eq!(config.get_string("path").as_deref(), Some("/from/flag.db"));
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let err = Settings::default().connection_config(None).unwrap_err();
        assert!(err.to_string().contains("--database"));
    }
}

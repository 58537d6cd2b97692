//! Named export variants

use std::fmt;
use std::str::FromStr;

use crate::ExportError;

/// A predefined export query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportVariant {
    /// The whole `config` table; the row limit does not apply
    Configuration,
    /// Property records for the first N physical-definition ids
    Properties,
    /// Reserved; resolves to an empty query
    Cama,
}

impl ExportVariant {
    pub const ALL: [ExportVariant; 3] = [
        ExportVariant::Configuration,
        ExportVariant::Properties,
        ExportVariant::Cama,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExportVariant::Configuration => "Configuration",
            ExportVariant::Properties => "Properties",
            ExportVariant::Cama => "Cama",
        }
    }

    /// SQL producing this variant's rows.
    ///
    /// An empty string means the variant has no query and exports nothing.
    pub fn query(&self, row_limit: Option<u64>) -> String {
        match self {
            ExportVariant::Configuration => "SELECT * FROM config".to_string(),
            ExportVariant::Properties => {
                let limit = row_limit
                    .map(|n| format!(" ORDER BY ppd_recordid LIMIT {}", n))
                    .unwrap_or_default();
                format!(
                    "SELECT * FROM property_record WHERE ppd_recordid IN \
                     (SELECT ppd_recordid FROM prop_phys_def{}) ORDER BY ppd_recordid",
                    limit
                )
            }
            ExportVariant::Cama => String::new(),
        }
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ExportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportVariant {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExportError::UnknownVariant {
                name: s.to_string(),
                expected: Self::expected_names(),
            })
    }
}

//! Output verbosity levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much an operation reports while it runs.
///
/// Levels are ordered, so `verbosity >= Verbosity::Normal` reads as "at
/// least normal".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Silent,
    Quiet,
    #[default]
    Normal,
    Detailed,
    Debug,
}

impl Verbosity {
    pub const ALL: [Verbosity; 5] = [
        Verbosity::Silent,
        Verbosity::Quiet,
        Verbosity::Normal,
        Verbosity::Detailed,
        Verbosity::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Silent => "silent",
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Detailed => "detailed",
            Verbosity::Debug => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown verbosity '{}', expected one of: silent, quiet, normal, detailed, debug",
                    s
                )
            })
    }
}

//! Target platforms for native modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A native platform a module can be linked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// All known platforms, in canonical order.
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    /// Get the lowercase name used in manifests and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            _ => Err(format!(
                "invalid platform '{}'; expected 'android' or 'ios'",
                s
            )),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

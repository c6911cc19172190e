use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Extension of files written by the dictionary strategy.
pub const DICTIONARY_EXTENSION: &str = ".xpf";
/// Extension of files written by the JSON strategy.
pub const JSON_EXTENSION: &str = ".json";
/// Extension of files written by the XML strategy.
pub const XML_EXTENSION: &str = ".xml";

/// How a profile is serialized to and from its backing file.
///
/// The mode is read once when a profile instance is initialized; the
/// matching strategy stays bound to that instance for its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOperationMode {
    /// Ordered header/content pairs, one per registered field (default).
    #[default]
    Dictionary,
    /// The whole instance as a JSON document.
    Json,
    /// The whole instance as an XML document.
    Xml,
    /// User-supplied load and save delegates.
    Custom,
}

impl ProfileOperationMode {
    /// File extension implied by the mode. `Custom` defines its own.
    #[must_use]
    pub const fn default_extension(self) -> Option<&'static str> {
        match self {
            Self::Dictionary => Some(DICTIONARY_EXTENSION),
            Self::Json => Some(JSON_EXTENSION),
            Self::Xml => Some(XML_EXTENSION),
            Self::Custom => None,
        }
    }

    /// Whether loading produces a replacement instance instead of mutating
    /// the existing one.
    #[must_use]
    pub const fn replaces_instance(self) -> bool {
        matches!(self, Self::Json | Self::Xml)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dictionary => "dictionary",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ProfileOperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileOperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dictionary" | "xpf" => Ok(Self::Dictionary),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown profile operation mode: {other}")),
        }
    }
}

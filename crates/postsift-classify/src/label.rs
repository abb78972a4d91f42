//! Classification label type.

use serde::{Deserialize, Serialize};

/// Classification label for a message body.
///
/// The engine only ever emits [`Label::Spam`] or [`Label::Ham`];
/// [`Label::Suspicious`] exists so stored classifications that predate the
/// current scoring rules still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Unwanted bulk or scam content.
    Spam,
    /// Legitimate content.
    #[default]
    Ham,
    /// Inconclusive; never produced by the engine.
    Suspicious,
}

impl Label {
    /// Parse from a stored string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "spam" => Self::Spam,
            "suspicious" => Self::Suspicious,
            _ => Self::Ham,
        }
    }

    /// Convert to the stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Ham => "ham",
            Self::Suspicious => "suspicious",
        }
    }

    /// Check whether this label is spam.
    #[must_use]
    pub const fn is_spam(&self) -> bool {
        matches!(self, Self::Spam)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

//! Product styles (catalog categories).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known style.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown style: {0}")]
pub struct StyleError(pub String);

/// A catalog style.
///
/// Each style is its own collection in the document store and a value of
/// the `style` column in the relational store, so the slug doubles as the
/// storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Hippie,
    Gotico,
    Colorido,
    Minimalista,
}

impl Style {
    /// All styles, in menu order.
    pub const ALL: [Self; 4] = [Self::Hippie, Self::Gotico, Self::Colorido, Self::Minimalista];

    /// URL slug and storage key.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Hippie => "hippie",
            Self::Gotico => "gotico",
            Self::Colorido => "colorido",
            Self::Minimalista => "minimalista",
        }
    }

    /// Human-readable name shown in page titles.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Hippie => "Hippie",
            Self::Gotico => "Gótico",
            Self::Colorido => "Colorido",
            Self::Minimalista => "Minimalista",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Style {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| StyleError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slugs() {
        for style in Style::ALL {
            assert_eq!(style.slug().parse::<Style>().unwrap(), style);
        }
        assert_eq!("  Gotico ".parse::<Style>().unwrap(), Style::Gotico);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!("punk".parse::<Style>(), Err(StyleError("punk".to_owned())));
        assert!("".parse::<Style>().is_err());
    }

    #[test]
    fn test_serde_uses_slug() {
        assert_eq!(serde_json::to_string(&Style::Minimalista).unwrap(), "\"minimalista\"");
        let parsed: Style = serde_json::from_str("\"colorido\"").unwrap();
        assert_eq!(parsed, Style::Colorido);
    }
}

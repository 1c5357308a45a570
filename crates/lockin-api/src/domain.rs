//! Normalized host names

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Why a raw allow-list entry could not be turned into a [`Domain`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("domain is empty")]
    Empty,

    #[error("domain '{0}' is longer than 253 characters")]
    TooLong(String),

    #[error("domain '{domain}' has an invalid label '{label}'")]
    InvalidLabel { domain: String, label: String },

    #[error("domain '{domain}' contains invalid character '{ch}'")]
    InvalidCharacter { domain: String, ch: char },
}

/// A normalized host string
///
/// Built from user input by stripping an `http://`/`https://` scheme and
/// trailing slashes, trimming whitespace and lower-casing. Two domains are
/// equal when their normalized forms are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Normalize and validate a raw entry
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = normalize(raw);
        validate(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Domain::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Strip scheme and trailing slashes, trim, lower-case
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme.trim_end_matches('/').to_string()
}

fn validate(domain: &str) -> Result<(), DomainError> {
    if domain.is_empty() {
        return Err(DomainError::Empty);
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(DomainError::TooLong(domain.to_string()));
    }
    if let Some(ch) = domain
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(DomainError::InvalidCharacter {
            domain: domain.to_string(),
            ch,
        });
    }

    for label in domain.split('.') {
        let bad = label.is_empty()
            || label.len() > MAX_LABEL_LEN
            || label.starts_with('-')
            || label.ends_with('-');
        if bad {
            return Err(DomainError::InvalidLabel {
                domain: domain.to_string(),
                label: label.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_slash_and_case() {
        assert_eq!(Domain::parse("https://YouTube.com/").unwrap().as_str(), "youtube.com");
        assert_eq!(Domain::parse("http://github.com").unwrap().as_str(), "github.com");
        assert_eq!(Domain::parse("  Notion.SO  ").unwrap().as_str(), "notion.so");
        assert_eq!(Domain::parse("HTTPS://x.com//").unwrap().as_str(), "x.com");
    }

    #[test]
    fn equality_is_over_normalized_form() {
        assert_eq!(
            Domain::parse("Example.com").unwrap(),
            Domain::parse("https://example.com/").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_entries() {
        assert_eq!(Domain::parse("   "), Err(DomainError::Empty));
        assert_eq!(Domain::parse("https://"), Err(DomainError::Empty));
        assert!(matches!(
            Domain::parse("example.com/path"),
            Err(DomainError::InvalidCharacter { ch: '/', .. })
        ));
        assert!(matches!(
            Domain::parse("exa mple.com"),
            Err(DomainError::InvalidCharacter { ch: ' ', .. })
        ));
        assert!(matches!(
            Domain::parse("example..com"),
            Err(DomainError::InvalidLabel { .. })
        ));
        assert!(matches!(
            Domain::parse("-example.com"),
            Err(DomainError::InvalidLabel { .. })
        ));
        assert!(matches!(
            Domain::parse(&"a".repeat(300)),
            Err(DomainError::TooLong(_))
        ));
    }

    #[test]
    fn deserialize_normalizes() {
        let domain: Domain = serde_json::from_str("\"https://GitHub.com/\"").unwrap();
        assert_eq!(domain.as_str(), "github.com");
        assert!(serde_json::from_str::<Domain>("\"bad domain\"").is_err());
    }
}

//! Relative location entries
//!
//! A package configuration stores each boss or chest placement as a single
//! line of the form `"<content key>:<x>,<y>,<z>"`.

use std::fmt;
use dungeon_math::{Vec3, VectorParseError};

/// A decoded `(content key, offset)` pair
#[derive(Clone, Debug, PartialEq)]
pub struct RelativeEntry {
    /// Catalog filename of the boss or chest placed here
    pub key: String,
    /// Offset from the anchor, in the unrotated template frame
    pub offset: Vec3,
}

impl RelativeEntry {
    pub fn new(key: impl Into<String>, offset: Vec3) -> Self {
        Self {
            key: key.into(),
            offset,
        }
    }

    /// Decode a raw `"key:x,y,z"` line
    pub fn parse(raw: &str) -> Result<Self, EntryError> {
        let (key, vector) = raw.split_once(':').ok_or(EntryError::MissingSeparator)?;
        if key.is_empty() {
            return Err(EntryError::EmptyKey);
        }
        let offset = vector.parse::<Vec3>()?;
        Ok(Self::new(key, offset))
    }

    /// Encode back into the `"key:x,y,z"` form
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.offset)
    }
}

/// The content key of a raw line, without decoding its vector
///
/// Returns `None` for blank lines and lines whose key portion is empty.
/// A line with no separator at all is treated as a bare key.
pub fn content_key(raw: &str) -> Option<&str> {
    let key = raw.split(':').next().unwrap_or_default();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Error decoding a relative entry line
#[derive(Debug, Clone, PartialEq)]
pub enum EntryError {
    /// No `:` between key and vector
    MissingSeparator,
    /// Nothing before the `:`
    EmptyKey,
    /// The vector part did not decode
    Vector(VectorParseError),
}

impl From<VectorParseError> for EntryError {
    fn from(e: VectorParseError) -> Self {
        EntryError::Vector(e)
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::MissingSeparator => write!(f, "missing ':' between key and vector"),
            EntryError::EmptyKey => write!(f, "empty content key"),
            EntryError::Vector(e) => write!(f, "invalid vector: {}", e),
        }
    }
}

impl std::error::Error for EntryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EntryError::Vector(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let entry = RelativeEntry::parse("lich_king.yml:10,-2.5,3").unwrap();
        assert_eq!(entry.key, "lich_king.yml");
        assert_eq!(entry.offset, Vec3::new(10.0, -2.5, 3.0));
    }

    #[test]
    fn test_encode_parses_back() {
        let entry = RelativeEntry::new("chest.yml", Vec3::new(0.25, 64.0, -17.125));
        let raw = entry.encode();
        assert_eq!(raw, "chest.yml:0.25,64,-17.125");
        assert_eq!(RelativeEntry::parse(&raw).unwrap(), entry);
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            RelativeEntry::parse("boss.yml 1,2,3"),
            Err(EntryError::MissingSeparator)
        );
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(RelativeEntry::parse(":1,2,3"), Err(EntryError::EmptyKey));
    }

    #[test]
    fn test_bad_vector() {
        let err = RelativeEntry::parse("boss.yml:1,x,3").unwrap_err();
        assert!(matches!(err, EntryError::Vector(VectorParseError::InvalidNumber(_))));
        assert!(err.to_string().contains("invalid vector"));
    }

    #[test]
    fn test_extra_colon_is_rejected() {
        assert!(RelativeEntry::parse("boss.yml:1,2,3:4").is_err());
    }

    #[test]
    fn test_content_key() {
        assert_eq!(content_key("boss.yml:1,2,3"), Some("boss.yml"));
        assert_eq!(content_key("boss.yml:garbage"), Some("boss.yml"));
        assert_eq!(content_key("bare_key"), Some("bare_key"));
        assert_eq!(content_key(":1,2,3"), None);
        assert_eq!(content_key(""), None);
    }
}

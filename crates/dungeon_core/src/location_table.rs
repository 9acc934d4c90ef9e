//! Relative location tables
//!
//! Each dungeon package keeps one table for bosses and one for treasure
//! chests, mapping a content key to its offset in the template frame.

use std::collections::BTreeMap;
use std::fmt;

use dungeon_math::Vec3;

use crate::entry::{EntryError, RelativeEntry};

/// Which kind of content a table holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Boss,
    Chest,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Boss => write!(f, "boss"),
            ContentKind::Chest => write!(f, "treasure chest"),
        }
    }
}

/// A raw line that was skipped while building a table
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedEntry {
    /// The line exactly as it appeared in configuration
    pub raw: String,
    /// Why it was skipped
    pub error: EntryError,
}

/// Content key to relative offset, for one kind of content
#[derive(Clone, Debug)]
pub struct RelativeLocationTable {
    kind: ContentKind,
    locations: BTreeMap<String, Vec3>,
    rejected: Vec<RejectedEntry>,
}

impl RelativeLocationTable {
    /// Create an empty table
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            locations: BTreeMap::new(),
            rejected: Vec::new(),
        }
    }

    /// Build a table from raw `"key:x,y,z"` lines
    ///
    /// Lines that fail to decode are logged against `source_file`, recorded
    /// in [`rejected`](Self::rejected), and skipped. A later line with the
    /// same key replaces an earlier one.
    pub fn from_raw<S: AsRef<str>>(kind: ContentKind, source_file: &str, raw_entries: &[S]) -> Self {
        let mut table = Self::new(kind);

        for raw in raw_entries {
            let raw = raw.as_ref();
            match RelativeEntry::parse(raw) {
                Ok(entry) => {
                    table.locations.insert(entry.key, entry.offset);
                }
                Err(error) => {
                    log::warn!(
                        "Failed to read {} entry '{}' in dungeon package {}: {}",
                        kind,
                        raw,
                        source_file,
                        error
                    );
                    table.rejected.push(RejectedEntry {
                        raw: raw.to_string(),
                        error,
                    });
                }
            }
        }

        table
    }

    /// The kind of content in this table
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Look up the offset for a content key
    pub fn get(&self, key: &str) -> Option<Vec3> {
        self.locations.get(key).copied()
    }

    /// Check if a content key has a location
    pub fn contains_key(&self, key: &str) -> bool {
        self.locations.contains_key(key)
    }

    /// Insert or replace a location, returning the previous offset
    pub fn insert(&mut self, key: impl Into<String>, offset: Vec3) -> Option<Vec3> {
        self.locations.insert(key.into(), offset)
    }

    /// Remove a location by key
    pub fn remove(&mut self, key: &str) -> Option<Vec3> {
        self.locations.remove(key)
    }

    /// Iterate over `(key, offset)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec3)> {
        self.locations.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of decoded locations
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Lines skipped at construction
    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_entries() {
        let raw = ["a.yml:1,2,3", "b.yml:-4,5.5,6"];
        let table = RelativeLocationTable::from_raw(ContentKind::Boss, "crypt.ron", &raw);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a.yml"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(table.get("b.yml"), Some(Vec3::new(-4.0, 5.5, 6.0)));
        assert!(table.rejected().is_empty());
    }

    #[test]
    fn test_malformed_entry_is_skipped_and_recorded() {
        let raw = ["a.yml:1,2,3", "broken.yml:1,nope,3", "b.yml:4,5,6"];
        let table = RelativeLocationTable::from_raw(ContentKind::Chest, "crypt.ron", &raw);

        assert_eq!(table.len(), 2);
        assert!(table.contains_key("a.yml"));
        assert!(table.contains_key("b.yml"));
        assert!(!table.contains_key("broken.yml"));

        assert_eq!(table.rejected().len(), 1);
        assert_eq!(table.rejected()[0].raw, "broken.yml:1,nope,3");
    }

    #[test]
    fn test_empty_key_and_missing_separator_are_skipped() {
        let raw = [":1,2,3", "no_separator", "", "ok.yml:0,0,0"];
        let table = RelativeLocationTable::from_raw(ContentKind::Boss, "crypt.ron", &raw);

        assert_eq!(table.len(), 1);
        assert_eq!(table.rejected().len(), 3);
        assert_eq!(table.rejected()[0].error, EntryError::EmptyKey);
        assert_eq!(table.rejected()[1].error, EntryError::MissingSeparator);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let raw = ["a.yml:1,1,1", "a.yml:2,2,2"];
        let table = RelativeLocationTable::from_raw(ContentKind::Boss, "crypt.ron", &raw);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a.yml"), Some(Vec3::new(2.0, 2.0, 2.0)));
        assert!(table.rejected().is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut table = RelativeLocationTable::new(ContentKind::Chest);
        assert!(table.is_empty());

        assert_eq!(table.insert("c.yml", Vec3::X), None);
        assert_eq!(table.insert("c.yml", Vec3::Y), Some(Vec3::X));
        assert_eq!(table.remove("c.yml"), Some(Vec3::Y));
        assert!(table.is_empty());
    }

    #[test]
    fn test_iter_is_key_ordered() {
        let raw = ["z.yml:0,0,0", "a.yml:0,0,0", "m.yml:0,0,0"];
        let table = RelativeLocationTable::from_raw(ContentKind::Boss, "crypt.ron", &raw);
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a.yml", "m.yml", "z.yml"]);
    }
}

//! Boss and treasure chest catalogs
//!
//! Catalog definitions are keyed by the filename they were loaded from; that
//! filename is the content key used in package relative-location lines.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use dungeon_math::Vec3;

use crate::registry::PackageId;
use crate::world::TreasureChest;

/// A definition that can live in a [`Catalog`]
pub trait CatalogEntry: DeserializeOwned {
    /// Content key of this definition
    fn filename(&self) -> &str;
    /// Assign the content key after loading from disk
    fn set_filename(&mut self, filename: String);
}

/// Full definition of a boss
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossDefinition {
    #[serde(skip)]
    pub filename: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Difficulty level
    pub level: i32,
}

impl BossDefinition {
    pub fn new(filename: impl Into<String>, level: i32) -> Self {
        let filename = filename.into();
        Self {
            name: filename.clone(),
            filename,
            level,
        }
    }
}

impl CatalogEntry for BossDefinition {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn set_filename(&mut self, filename: String) {
        self.filename = filename;
    }
}

/// Full definition of a treasure chest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChestDefinition {
    #[serde(skip)]
    pub filename: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Minimum player level allowed to open the chest
    #[serde(default)]
    pub minimum_level: i32,
}

impl ChestDefinition {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            name: filename.clone(),
            filename,
            minimum_level: 0,
        }
    }

    /// Instantiate a live chest of this definition at `location`
    pub fn place(&self, location: Vec3, owner: Option<PackageId>) -> TreasureChest {
        TreasureChest::new(&self.filename, location).with_owner(owner)
    }
}

impl CatalogEntry for ChestDefinition {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn set_filename(&mut self, filename: String) {
        self.filename = filename;
    }
}

/// Definitions keyed by filename
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: HashMap<String, T>,
}

/// Catalog of boss definitions
pub type BossCatalog = Catalog<BossDefinition>;
/// Catalog of treasure chest definitions
pub type ChestCatalog = Catalog<ChestDefinition>;

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.ron` file in `dir`
    ///
    /// Files that fail to read or parse are logged and skipped; only a
    /// failure to list the directory itself is an error.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();

        for dir_entry in fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ron") {
                continue;
            }

            let filename = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            let parsed = fs::read_to_string(&path)
                .map_err(CatalogError::from)
                .and_then(|contents| ron::from_str::<T>(&contents).map_err(CatalogError::from));

            match parsed {
                Ok(mut definition) => {
                    definition.set_filename(filename);
                    catalog.insert(definition);
                }
                Err(e) => {
                    log::warn!("Skipping catalog file {}: {}", path.display(), e);
                }
            }
        }

        log::info!("Loaded {} definitions from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    /// Add a definition, replacing any with the same filename
    pub fn insert(&mut self, definition: T) -> Option<T> {
        self.entries.insert(definition.filename().to_string(), definition)
    }

    /// Add a definition (builder form)
    pub fn with(mut self, definition: T) -> Self {
        self.insert(definition);
        self
    }

    /// Look up a definition by content key
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Error loading a catalog
#[derive(Debug)]
pub enum CatalogError {
    /// IO error reading the directory or a file
    Io(io::Error),
    /// Invalid RON in a definition file
    Parse(ron::error::SpannedError),
}

impl From<io::Error> for CatalogError {
    fn from(e: io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<ron::error::SpannedError> for CatalogError {
    fn from(e: ron::error::SpannedError) -> Self {
        CatalogError::Parse(e)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "IO error: {}", e),
            CatalogError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

//! Dungeon package configuration
//!
//! Provides [`PackageConfig`] for loading/saving package files in RON.
//! The relative boss and chest lists are kept in their raw `"key:x,y,z"`
//! form so that hand-edited files survive a load/save cycle untouched.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use dungeon_math::{Vec3, Yaw};

use crate::entry::RelativeEntry;
use crate::transform::PackageTransform;

bitflags! {
    /// Which parts of a configuration changed since the last flush
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ConfigChanges: u8 {
        const NONE = 0;
        /// Boss location list changed
        const BOSSES = 1 << 0;
        /// Chest location list changed
        const CHESTS = 1 << 1;
        /// Anchor or rotation changed
        const PLACEMENT = 1 << 2;
        /// Enabled flag changed
        const STATE = 1 << 3;
    }
}

/// Persistent configuration for one dungeon package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// File name this configuration was loaded from; identifies the package
    #[serde(skip)]
    pub filename: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Structure file pasted by the base package
    #[serde(default)]
    pub structure: Option<String>,
    /// Whether the package was installed when last saved
    #[serde(default)]
    pub enabled: bool,
    /// World-space anchor; absent until the package has been placed
    #[serde(default)]
    pub anchor_point: Option<Vec3>,
    /// Paste rotation in degrees about the vertical axis
    #[serde(default)]
    pub rotation: f64,
    /// Raw `"boss_file:x,y,z"` lines
    #[serde(default)]
    pub relative_boss_locations: Vec<String>,
    /// Raw `"chest_file:x,y,z"` lines
    #[serde(default)]
    pub relative_treasure_chest_locations: Vec<String>,
    #[serde(skip)]
    changes: ConfigChanges,
}

impl PackageConfig {
    /// Create an empty configuration for the given file name
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            name: filename.clone(),
            filename,
            structure: None,
            enabled: false,
            anchor_point: None,
            rotation: 0.0,
            relative_boss_locations: Vec::new(),
            relative_treasure_chest_locations: Vec::new(),
            changes: ConfigChanges::NONE,
        }
    }

    /// Load a configuration from a RON file
    ///
    /// The file name (without directories) becomes [`filename`](Self::filename).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config: Self = ron::from_str(&contents)?;
        config.filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if config.name.is_empty() {
            config.name = config.filename.clone();
        }
        Ok(config)
    }

    /// Save the configuration to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigSaveError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Set the structure file
    pub fn with_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    /// Set anchor and rotation
    pub fn with_placement(mut self, anchor: Vec3, rotation_degrees: f64) -> Self {
        self.anchor_point = Some(anchor);
        self.rotation = rotation_degrees;
        self
    }

    /// Append a raw boss line
    pub fn with_boss(mut self, raw: impl Into<String>) -> Self {
        self.relative_boss_locations.push(raw.into());
        self
    }

    /// Append a raw chest line
    pub fn with_chest(mut self, raw: impl Into<String>) -> Self {
        self.relative_treasure_chest_locations.push(raw.into());
        self
    }

    /// Mark the package as installed at load time
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Placement transform, if an anchor has been set
    pub fn transform(&self) -> Option<PackageTransform> {
        self.anchor_point
            .map(|anchor| PackageTransform::new(anchor, Yaw::from_degrees(self.rotation)))
    }

    /// Move the package to a new anchor and rotation
    pub fn set_placement(&mut self, anchor: Vec3, rotation_degrees: f64) {
        self.anchor_point = Some(anchor);
        self.rotation = rotation_degrees;
        self.changes |= ConfigChanges::PLACEMENT;
    }

    /// Record whether the package is installed
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.changes |= ConfigChanges::STATE;
        }
    }

    /// Append a boss placement
    pub fn add_relative_boss_location(&mut self, boss_file: &str, offset: Vec3) {
        self.relative_boss_locations
            .push(RelativeEntry::new(boss_file, offset).encode());
        self.changes |= ConfigChanges::BOSSES;
    }

    /// Remove every boss line for `boss_file` whose offset is within
    /// `tolerance` of `offset`
    ///
    /// Returns the number of lines removed. Lines that do not decode are kept.
    pub fn remove_relative_boss_location(
        &mut self,
        boss_file: &str,
        offset: Vec3,
        tolerance: f64,
    ) -> usize {
        let before = self.relative_boss_locations.len();
        self.relative_boss_locations.retain(|raw| match RelativeEntry::parse(raw) {
            Ok(entry) => !(entry.key == boss_file && entry.offset.approx_eq(offset, tolerance)),
            Err(_) => true,
        });
        let removed = before - self.relative_boss_locations.len();
        if removed > 0 {
            self.changes |= ConfigChanges::BOSSES;
        }
        removed
    }

    /// Append a treasure chest placement
    pub fn add_relative_treasure_chest(&mut self, chest_file: &str, offset: Vec3) {
        self.relative_treasure_chest_locations
            .push(RelativeEntry::new(chest_file, offset).encode());
        self.changes |= ConfigChanges::CHESTS;
    }

    /// Pending changes since the last [`take_changes`](Self::take_changes)
    pub fn changes(&self) -> ConfigChanges {
        self.changes
    }

    /// Return and clear pending changes
    pub fn take_changes(&mut self) -> ConfigChanges {
        std::mem::take(&mut self.changes)
    }
}

/// Error loading a package configuration
#[derive(Debug)]
pub enum ConfigLoadError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
}

impl From<io::Error> for ConfigLoadError {
    fn from(e: io::Error) -> Self {
        ConfigLoadError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ConfigLoadError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigLoadError::Parse(e)
    }
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Io(e) => write!(f, "IO error: {}", e),
            ConfigLoadError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

/// Error saving a package configuration
#[derive(Debug)]
pub enum ConfigSaveError {
    /// IO error (permission denied, disk full, etc.)
    Io(io::Error),
    /// Serialization error
    Serialize(ron::Error),
}

impl From<io::Error> for ConfigSaveError {
    fn from(e: io::Error) -> Self {
        ConfigSaveError::Io(e)
    }
}

impl From<ron::Error> for ConfigSaveError {
    fn from(e: ron::Error) -> Self {
        ConfigSaveError::Serialize(e)
    }
}

impl std::fmt::Display for ConfigSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSaveError::Io(e) => write!(f, "IO error: {}", e),
            ConfigSaveError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigSaveError {}

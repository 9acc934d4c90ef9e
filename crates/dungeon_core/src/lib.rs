//! Core types for dungeon packages
//!
//! A dungeon package is a structure placed in the world at an anchor point
//! and yaw rotation, populated with bosses and treasure chests whose
//! positions are stored relative to that anchor:
//!
//! - [`RelativeEntry`] - One `"key:x,y,z"` configuration line
//! - [`RelativeLocationTable`] - Decoded content key to offset table
//! - [`PackageTransform`] - Relative to absolute coordinate mapping
//! - [`PackageConfig`] - Persistent package configuration (RON)
//! - [`ContentRegistry`] - Which package owns which content key
//! - [`BossCatalog`] / [`ChestCatalog`] - Content definitions by filename
//! - [`World`] - Live bosses and chests, addressed by generational keys
//! - [`LevelBounds`] - Difficulty range of a package's bosses
//! - [`BasePackage`] - Structure paste/remove contract
//! - [`DungeonPackage`] - Install/uninstall lifecycle and mutation API
//! - [`PackageManager`] - Every loaded package plus the shared registry

mod base_package;
mod catalog;
mod entry;
mod level;
mod location_table;
mod package;
mod package_config;
mod package_manager;
mod registry;
mod transform;
mod world;

pub use base_package::{BasePackage, DryRunEngine, StructureEngine, StructureError, StructurePackage};
pub use catalog::{BossCatalog, BossDefinition, Catalog, CatalogEntry, CatalogError, ChestCatalog, ChestDefinition};
pub use entry::{content_key, EntryError, RelativeEntry};
pub use level::LevelBounds;
pub use location_table::{ContentKind, RejectedEntry, RelativeLocationTable};
pub use package::{DungeonContext, DungeonPackage, PackageError, PackageState, LOCATION_TOLERANCE};
pub use package_config::{ConfigChanges, ConfigLoadError, ConfigSaveError, PackageConfig};
pub use package_manager::PackageManager;
pub use registry::{CollisionPolicy, ContentRegistry, PackageId, RegistryError};
pub use transform::{to_absolute, to_relative, PackageTransform};
pub use world::{BossEntity, BossKey, ChestKey, RemovalReason, TreasureChest, World};

// Re-export the math types for convenience
pub use dungeon_math::{Vec3, VectorParseError, Yaw};

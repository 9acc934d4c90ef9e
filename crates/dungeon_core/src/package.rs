//! Dungeon packages
//!
//! A [`DungeonPackage`] decorates a [`BasePackage`] with boss and treasure
//! chest content. Content positions are kept relative to the package anchor
//! and moved into world space when the package is installed.
//!
//! # Lifecycle
//!
//! ```text
//! Uninstalled -> Installing -> Installed -> Uninstalling -> Uninstalled
//! ```
//!
//! The base package is always consulted first; if it fails, the dungeon
//! package makes no changes of its own.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use dungeon_math::Vec3;

use crate::base_package::BasePackage;
use crate::catalog::{BossCatalog, BossDefinition, ChestCatalog, ChestDefinition};
use crate::entry::{content_key, RelativeEntry};
use crate::level::LevelBounds;
use crate::location_table::{ContentKind, RelativeLocationTable};
use crate::package_config::{ConfigChanges, ConfigLoadError, ConfigSaveError, PackageConfig};
use crate::registry::{ContentRegistry, PackageId, RegistryError};
use crate::transform::PackageTransform;
use crate::world::{BossEntity, BossKey, ChestKey, RemovalReason, World};

/// How close a recomputed offset must be to a stored one to count as the same entry
pub const LOCATION_TOLERANCE: f64 = 1e-3;

/// Install state of a package
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageState {
    Uninstalled,
    Installing,
    Installed,
    Uninstalling,
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageState::Uninstalled => write!(f, "uninstalled"),
            PackageState::Installing => write!(f, "installing"),
            PackageState::Installed => write!(f, "installed"),
            PackageState::Uninstalling => write!(f, "uninstalling"),
        }
    }
}

/// Everything an install needs from the rest of the system
pub struct DungeonContext<'a> {
    /// Where bosses spawn and chests are placed
    pub world: &'a mut World,
    /// Boss definitions by content key
    pub bosses: &'a BossCatalog,
    /// Chest definitions by content key
    pub chests: &'a ChestCatalog,
}

impl<'a> DungeonContext<'a> {
    pub fn new(world: &'a mut World, bosses: &'a BossCatalog, chests: &'a ChestCatalog) -> Self {
        Self { world, bosses, chests }
    }
}

/// A structure package populated with bosses and treasure chests
pub struct DungeonPackage {
    id: PackageId,
    config: PackageConfig,
    base: Box<dyn BasePackage>,
    state: PackageState,
    boss_locations: RelativeLocationTable,
    chest_locations: RelativeLocationTable,
    attached_bosses: Vec<BossKey>,
    attached_chests: Vec<ChestKey>,
    level_bounds: Option<LevelBounds>,
}

impl DungeonPackage {
    /// Build a package from its configuration
    ///
    /// Relative entries that fail to decode are logged and left out of the
    /// location tables; construction itself never fails.
    pub fn new(config: PackageConfig, base: Box<dyn BasePackage>) -> Self {
        let boss_locations = RelativeLocationTable::from_raw(
            ContentKind::Boss,
            &config.filename,
            &config.relative_boss_locations,
        );
        let chest_locations = RelativeLocationTable::from_raw(
            ContentKind::Chest,
            &config.filename,
            &config.relative_treasure_chest_locations,
        );
        let state = if base.is_installed() {
            PackageState::Installed
        } else {
            PackageState::Uninstalled
        };

        Self {
            id: PackageId::new(config.filename.as_str()),
            config,
            base,
            state,
            boss_locations,
            chest_locations,
            attached_bosses: Vec::new(),
            attached_chests: Vec::new(),
            level_bounds: None,
        }
    }

    // --- Registration and discovery ---

    /// Load-time registration of every content key this package places
    ///
    /// Runs before any world content exists. Keys are taken from the raw
    /// configuration lines, so an entry with a malformed vector still claims
    /// its key. Returns the number of distinct keys registered.
    pub fn base_initialization(&mut self, registry: &mut ContentRegistry) -> usize {
        self.base.base_initialization();

        let keys: BTreeSet<&str> = self
            .config
            .relative_boss_locations
            .iter()
            .chain(&self.config.relative_treasure_chest_locations)
            .filter_map(|raw| content_key(raw))
            .collect();

        let mut registered = 0;
        for key in keys {
            match registry.register(key, &self.id) {
                Ok(_) => registered += 1,
                Err(e) => log::warn!("Dungeon package {}: {}", self.id, e),
            }
        }
        registered
    }

    /// Attach content that is already live in the world
    ///
    /// Only does anything for packages that were installed when loaded.
    /// Bosses and chests whose definition matches one of this package's
    /// content keys, and that are not owned by another package, are attached.
    pub fn initialize_content(&mut self, world: &mut World) {
        self.base.initialize_content();
        if !self.is_installed() {
            return;
        }
        self.state = PackageState::Installed;

        self.discover_bosses(world);
        self.requalify(world);
        self.discover_chests(world);

        log::info!(
            "Dungeon package {} found {} bosses and {} chests already in the world",
            self.id,
            self.attached_bosses.len(),
            self.attached_chests.len()
        );
    }

    fn discover_bosses(&mut self, world: &mut World) {
        let found: Vec<BossKey> = world
            .bosses()
            .filter(|(key, boss)| {
                self.boss_locations.contains_key(boss.definition_key())
                    && boss.owner().map_or(true, |owner| *owner == self.id)
                    && !self.attached_bosses.contains(key)
            })
            .map(|(key, _)| key)
            .collect();

        for key in found {
            world.claim_boss(key, &self.id);
            self.attached_bosses.push(key);
        }
    }

    fn discover_chests(&mut self, world: &mut World) {
        let found: Vec<ChestKey> = world
            .chests()
            .filter(|(key, chest)| {
                self.chest_locations.contains_key(chest.definition_key())
                    && chest.owner().map_or(true, |owner| *owner == self.id)
                    && !self.attached_chests.contains(key)
            })
            .map(|(key, _)| key)
            .collect();

        for key in found {
            world.claim_chest(key, &self.id);
            self.attached_chests.push(key);
        }
    }

    fn requalify(&mut self, world: &World) {
        self.level_bounds = LevelBounds::qualify(world, &self.attached_bosses);
    }

    // --- Install / uninstall ---

    /// Install the structure and spawn its content
    ///
    /// Returns `false`, with nothing spawned, if the package is not
    /// uninstalled, has no anchor, or the base package fails. Bosses and
    /// chests missing from their catalogs are skipped with a warning.
    pub fn install(&mut self, requester: &str, paste: bool, ctx: &mut DungeonContext<'_>) -> bool {
        if self.state != PackageState::Uninstalled {
            log::warn!("{} tried to install {} while it is {}", requester, self.id, self.state);
            return false;
        }
        let Some(placement) = self.config.transform() else {
            log::warn!("Dungeon package {} has no anchor point and cannot be installed", self.id);
            return false;
        };

        self.state = PackageState::Installing;
        if !self.base.install(requester, paste, &placement) {
            self.state = PackageState::Uninstalled;
            return false;
        }

        self.install_bosses(&placement, ctx.world, ctx.bosses);
        self.install_chests(&placement, ctx.world, ctx.chests);
        self.requalify(ctx.world);
        self.config.set_enabled(true);
        self.state = PackageState::Installed;

        log::info!(
            "Dungeon package {} installed with {} bosses and {} chests",
            self.id,
            self.attached_bosses.len(),
            self.attached_chests.len()
        );
        true
    }

    fn install_bosses(&mut self, placement: &PackageTransform, world: &mut World, catalog: &BossCatalog) {
        for (key, offset) in self.boss_locations.iter() {
            let Some(definition) = catalog.get(key) else {
                log::warn!("Failed to get boss {} in dungeon package {}", key, self.id);
                continue;
            };
            let location = placement.to_absolute(offset);
            let boss = BossEntity::new(definition, location).with_owner(Some(self.id.clone()));
            self.attached_bosses.push(world.spawn_boss(boss));
        }
    }

    // Chest orientation is not rotated with the package.
    fn install_chests(&mut self, placement: &PackageTransform, world: &mut World, catalog: &ChestCatalog) {
        for (key, offset) in self.chest_locations.iter() {
            let Some(definition) = catalog.get(key) else {
                log::warn!("Failed to get treasure chest {} in dungeon package {}", key, self.id);
                continue;
            };
            let location = placement.to_absolute(offset);
            let chest = definition.place(location, Some(self.id.clone()));
            self.attached_chests.push(world.place_chest(chest));
        }
    }

    /// Remove the structure and every attached boss and chest
    ///
    /// Returns `false`, leaving everything in place, if the package is not
    /// installed or the base package fails. Registry entries are untouched.
    pub fn uninstall(&mut self, requester: &str, world: &mut World) -> bool {
        if self.state != PackageState::Installed {
            log::warn!("{} tried to uninstall {} while it is {}", requester, self.id, self.state);
            return false;
        }
        let Some(placement) = self.config.transform() else {
            log::warn!("Dungeon package {} has no anchor point and cannot be uninstalled", self.id);
            return false;
        };

        self.state = PackageState::Uninstalling;
        if !self.base.uninstall(requester, &placement) {
            self.state = PackageState::Installed;
            return false;
        }

        for key in self.attached_bosses.drain(..) {
            world.remove_boss(key, RemovalReason::RemoveCommand);
        }
        for key in self.attached_chests.drain(..) {
            world.remove_chest(key);
        }
        self.level_bounds = None;
        self.config.set_enabled(false);
        self.state = PackageState::Uninstalled;

        log::info!("Dungeon package {} uninstalled", self.id);
        true
    }

    // --- Mutation ---

    /// Delete the configuration entry for a live boss
    ///
    /// The entry is found by recomputing the boss's offset from its spawn
    /// location. The live boss and its attachment are left alone. Returns
    /// the number of configuration lines removed.
    pub fn remove_boss(&mut self, world: &World, boss: BossKey) -> Result<usize, PackageError> {
        let placement = self.placement()?;
        let entity = world.boss(boss).ok_or(PackageError::UnknownBoss)?;
        let key = entity.definition_key();
        let offset = placement.to_relative(entity.spawn_location());

        let removed = self
            .config
            .remove_relative_boss_location(key, offset, LOCATION_TOLERANCE);
        if removed > 0 {
            self.resync_boss_location(key);
        }
        Ok(removed)
    }

    // The table keeps the last decodable line per key, as on load.
    fn resync_boss_location(&mut self, key: &str) {
        let remaining = self
            .config
            .relative_boss_locations
            .iter()
            .filter_map(|raw| RelativeEntry::parse(raw).ok())
            .filter(|entry| entry.key == key)
            .last();
        match remaining {
            Some(entry) => {
                self.boss_locations.insert(key, entry.offset);
            }
            None => {
                self.boss_locations.remove(key);
            }
        }
    }

    /// Persist a boss placement at a world location
    ///
    /// Configuration only: nothing is spawned or attached. Returns the
    /// stored relative offset.
    pub fn add_boss(&mut self, definition: &BossDefinition, location: Vec3) -> Result<Vec3, PackageError> {
        let offset = self.placement()?.to_relative(location);
        self.config.add_relative_boss_location(&definition.filename, offset);
        self.boss_locations.insert(definition.filename.as_str(), offset);
        Ok(offset)
    }

    /// Persist a treasure chest placement at a world location
    ///
    /// Configuration only: nothing is placed or attached.
    pub fn add_chest(&mut self, chest_key: &str, location: Vec3) -> Result<Vec3, PackageError> {
        let offset = self.placement()?.to_relative(location);
        self.config.add_relative_treasure_chest(chest_key, offset);
        self.chest_locations.insert(chest_key, offset);
        Ok(offset)
    }

    /// Persist a boss placement, spawn it, and attach it
    pub fn attach_boss(
        &mut self,
        definition: &BossDefinition,
        location: Vec3,
        world: &mut World,
    ) -> Result<BossKey, PackageError> {
        self.require_installed()?;
        self.add_boss(definition, location)?;

        let boss = BossEntity::new(definition, location).with_owner(Some(self.id.clone()));
        let key = world.spawn_boss(boss);
        self.attached_bosses.push(key);
        self.requalify(world);
        Ok(key)
    }

    /// Persist a chest placement, place it, and attach it
    pub fn attach_chest(
        &mut self,
        definition: &ChestDefinition,
        location: Vec3,
        world: &mut World,
    ) -> Result<ChestKey, PackageError> {
        self.require_installed()?;
        self.add_chest(&definition.filename, location)?;

        let key = world.place_chest(definition.place(location, Some(self.id.clone())));
        self.attached_chests.push(key);
        Ok(key)
    }

    /// Move an uninstalled package to a new anchor and rotation
    pub fn set_placement(&mut self, anchor: Vec3, rotation_degrees: f64) -> Result<(), PackageError> {
        if self.state != PackageState::Uninstalled {
            return Err(PackageError::AlreadyInstalled(self.id.clone()));
        }
        self.config.set_placement(anchor, rotation_degrees);
        Ok(())
    }

    fn placement(&self) -> Result<PackageTransform, PackageError> {
        self.config
            .transform()
            .ok_or_else(|| PackageError::MissingAnchor(self.id.clone()))
    }

    fn require_installed(&self) -> Result<(), PackageError> {
        if self.state == PackageState::Installed {
            Ok(())
        } else {
            Err(PackageError::NotInstalled(self.id.clone()))
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    /// Display name from configuration
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// Return and clear configuration changes awaiting a flush
    pub fn take_config_changes(&mut self) -> ConfigChanges {
        self.config.take_changes()
    }

    pub fn state(&self) -> PackageState {
        self.state
    }

    pub fn is_installed(&self) -> bool {
        self.base.is_installed()
    }

    /// Current anchor and rotation, if placed
    pub fn transform(&self) -> Option<PackageTransform> {
        self.config.transform()
    }

    pub fn boss_locations(&self) -> &RelativeLocationTable {
        &self.boss_locations
    }

    pub fn chest_locations(&self) -> &RelativeLocationTable {
        &self.chest_locations
    }

    pub fn attached_bosses(&self) -> &[BossKey] {
        &self.attached_bosses
    }

    pub fn attached_chests(&self) -> &[ChestKey] {
        &self.attached_chests
    }

    /// Level range of the attached bosses; `None` when no bosses are attached
    pub fn level_bounds(&self) -> Option<LevelBounds> {
        self.level_bounds
    }

    pub fn lowest_level(&self) -> Option<i32> {
        self.level_bounds.map(|b| b.lowest)
    }

    pub fn highest_level(&self) -> Option<i32> {
        self.level_bounds.map(|b| b.highest)
    }
}

/// Error type for package operations
#[derive(Debug)]
pub enum PackageError {
    /// IO error (directory missing, permission denied, etc.)
    Io(io::Error),
    /// A package configuration failed to load
    Load(ConfigLoadError),
    /// A package configuration failed to save
    Save(ConfigSaveError),
    /// Content registration was rejected
    Registry(RegistryError),
    /// No package with this filename is loaded
    NotLoaded(String),
    /// The package has no anchor point
    MissingAnchor(PackageId),
    /// The operation needs an installed package
    NotInstalled(PackageId),
    /// The operation needs an uninstalled package
    AlreadyInstalled(PackageId),
    /// The boss key no longer resolves in the world
    UnknownBoss,
}

impl From<io::Error> for PackageError {
    fn from(e: io::Error) -> Self {
        PackageError::Io(e)
    }
}

impl From<ConfigLoadError> for PackageError {
    fn from(e: ConfigLoadError) -> Self {
        PackageError::Load(e)
    }
}

impl From<ConfigSaveError> for PackageError {
    fn from(e: ConfigSaveError) -> Self {
        PackageError::Save(e)
    }
}

impl From<RegistryError> for PackageError {
    fn from(e: RegistryError) -> Self {
        PackageError::Registry(e)
    }
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageError::Io(e) => write!(f, "IO error: {}", e),
            PackageError::Load(e) => write!(f, "Load error: {}", e),
            PackageError::Save(e) => write!(f, "Save error: {}", e),
            PackageError::Registry(e) => write!(f, "Registry error: {}", e),
            PackageError::NotLoaded(name) => write!(f, "Package not loaded: {}", name),
            PackageError::MissingAnchor(id) => write!(f, "Package {} has no anchor point", id),
            PackageError::NotInstalled(id) => write!(f, "Package {} is not installed", id),
            PackageError::AlreadyInstalled(id) => write!(f, "Package {} is installed", id),
            PackageError::UnknownBoss => write!(f, "Boss is no longer in the world"),
        }
    }
}

impl std::error::Error for PackageError {}

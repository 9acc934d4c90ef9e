//! Package management
//!
//! The PackageManager owns every loaded dungeon package together with the
//! content registry they share:
//! - Load package configurations from a directory of RON files
//! - Run load-time registration and world discovery across all packages
//! - Install and uninstall packages by filename
//! - Resolve which package owns a piece of content
//! - Save configurations that changed
//!
//! # Example
//! ```ignore
//! let mut manager = PackageManager::new();
//! manager.load_dir("packages", |config| {
//!     Box::new(StructurePackage::new(config, Box::new(DryRunEngine)))
//! })?;
//! manager.base_initialize();
//! manager.initialize_content(&mut world);
//!
//! let mut ctx = DungeonContext::new(&mut world, &bosses, &chests);
//! manager.install("crypt.ron", "admin", true, &mut ctx)?;
//! manager.flush("packages")?;
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use dungeon_math::Vec3;

use crate::base_package::BasePackage;
use crate::catalog::{BossDefinition, ChestDefinition};
use crate::package::{DungeonContext, DungeonPackage, PackageError};
use crate::package_config::PackageConfig;
use crate::registry::{CollisionPolicy, ContentRegistry};
use crate::world::{BossKey, ChestKey, World};

/// Owns loaded packages and the content registry
#[derive(Default)]
pub struct PackageManager {
    /// Packages by filename; ordered so registration is deterministic
    packages: BTreeMap<String, DungeonPackage>,
    registry: ContentRegistry,
}

impl PackageManager {
    /// Create an empty manager with the default collision policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manager with a specific collision policy
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            packages: BTreeMap::new(),
            registry: ContentRegistry::with_policy(policy),
        }
    }

    // --- Loading ---

    /// Load every `.ron` package configuration in `dir`
    ///
    /// `make_base` builds the base package for each configuration. Files
    /// that fail to parse are logged and skipped. Returns how many packages
    /// were loaded.
    pub fn load_dir<P, F>(&mut self, dir: P, mut make_base: F) -> Result<usize, PackageError>
    where
        P: AsRef<Path>,
        F: FnMut(&PackageConfig) -> Box<dyn BasePackage>,
    {
        let dir = dir.as_ref();
        let mut loaded = 0;

        for dir_entry in fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ron") {
                continue;
            }

            match PackageConfig::load(&path) {
                Ok(config) => {
                    let base = make_base(&config);
                    self.add_package(DungeonPackage::new(config, base));
                    loaded += 1;
                }
                Err(e) => {
                    log::warn!("Skipping dungeon package {}: {}", path.display(), e);
                }
            }
        }

        log::info!("Loaded {} dungeon packages from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Add a package, replacing any with the same filename
    ///
    /// A replaced package's registry entries are dropped.
    pub fn add_package(&mut self, package: DungeonPackage) -> Option<DungeonPackage> {
        let previous = self.packages.insert(package.id().to_string(), package);
        if let Some(old) = &previous {
            self.registry.unregister_package(old.id());
        }
        previous
    }

    /// Remove a package and its registry entries
    ///
    /// Live content stays in the world; uninstall first to remove it.
    pub fn remove_package(&mut self, filename: &str) -> Option<DungeonPackage> {
        let package = self.packages.remove(filename)?;
        let dropped = self.registry.unregister_package(package.id());
        log::debug!("Removed dungeon package {} ({} registry entries)", filename, dropped);
        Some(package)
    }

    // --- Lifecycle ---

    /// Run load-time registration for every package
    ///
    /// Returns the total number of content keys registered.
    pub fn base_initialize(&mut self) -> usize {
        let mut registered = 0;
        for package in self.packages.values_mut() {
            registered += package.base_initialization(&mut self.registry);
        }
        log::info!(
            "Registered {} content keys across {} dungeon packages",
            registered,
            self.packages.len()
        );
        registered
    }

    /// Attach already-live content to installed packages
    pub fn initialize_content(&mut self, world: &mut World) {
        for package in self.packages.values_mut() {
            package.initialize_content(world);
        }
    }

    /// Install a package by filename
    pub fn install(
        &mut self,
        filename: &str,
        requester: &str,
        paste: bool,
        ctx: &mut DungeonContext<'_>,
    ) -> Result<bool, PackageError> {
        Ok(self.package_mut(filename)?.install(requester, paste, ctx))
    }

    /// Uninstall a package by filename
    pub fn uninstall(&mut self, filename: &str, requester: &str, world: &mut World) -> Result<bool, PackageError> {
        Ok(self.package_mut(filename)?.uninstall(requester, world))
    }

    // --- Ownership ---

    /// Package that registered a content key
    pub fn owner_of(&self, content_key: &str) -> Option<&DungeonPackage> {
        self.registry
            .lookup(content_key)
            .and_then(|id| self.packages.get(id.as_str()))
    }

    /// Package a live boss belongs to
    ///
    /// Uses the boss's own owner when it has one, otherwise the registry
    /// entry for its definition.
    pub fn owner_of_boss(&self, world: &World, boss: BossKey) -> Option<&DungeonPackage> {
        let entity = world.boss(boss)?;
        match entity.owner() {
            Some(id) => self.packages.get(id.as_str()),
            None => self.owner_of(entity.definition_key()),
        }
    }

    // --- Mutation ---

    /// Register and persist a boss placement in a package
    pub fn add_boss(
        &mut self,
        filename: &str,
        definition: &BossDefinition,
        location: Vec3,
    ) -> Result<Vec3, PackageError> {
        self.with_registered(filename, &definition.filename, |package| {
            package.add_boss(definition, location)
        })
    }

    /// Register and persist a treasure chest placement in a package
    pub fn add_chest(&mut self, filename: &str, chest_key: &str, location: Vec3) -> Result<Vec3, PackageError> {
        self.with_registered(filename, chest_key, |package| package.add_chest(chest_key, location))
    }

    /// Register, persist, spawn, and attach a boss
    pub fn attach_boss(
        &mut self,
        filename: &str,
        definition: &BossDefinition,
        location: Vec3,
        world: &mut World,
    ) -> Result<BossKey, PackageError> {
        self.with_registered(filename, &definition.filename, |package| {
            package.attach_boss(definition, location, world)
        })
    }

    /// Register, persist, place, and attach a treasure chest
    pub fn attach_chest(
        &mut self,
        filename: &str,
        definition: &ChestDefinition,
        location: Vec3,
        world: &mut World,
    ) -> Result<ChestKey, PackageError> {
        self.with_registered(filename, &definition.filename, |package| {
            package.attach_chest(definition, location, world)
        })
    }

    /// Register `key` for a package, then run `op` on it
    ///
    /// A collision rejected by the registry stops before `op` runs. If `op`
    /// fails, the key goes back to its previous owner.
    fn with_registered<T>(
        &mut self,
        filename: &str,
        key: &str,
        op: impl FnOnce(&mut DungeonPackage) -> Result<T, PackageError>,
    ) -> Result<T, PackageError> {
        let package = self.packages
            .get_mut(filename)
            .ok_or_else(|| PackageError::NotLoaded(filename.to_string()))?;
        let previous = self.registry.register(key, package.id())?;

        op(package).map_err(|e| {
            self.registry.restore(key, previous);
            e
        })
    }

    /// Delete the configuration entry of a live boss from its owning package
    ///
    /// Returns the number of lines removed; zero if no package owns the boss.
    pub fn remove_boss(&mut self, world: &World, boss: BossKey) -> Result<usize, PackageError> {
        let owner = self
            .owner_of_boss(world, boss)
            .map(|package| package.id().to_string());
        match owner {
            Some(filename) => self.package_mut(&filename)?.remove_boss(world, boss),
            None if world.boss(boss).is_none() => Err(PackageError::UnknownBoss),
            None => Ok(0),
        }
    }

    // --- Persistence ---

    /// Save every package whose configuration changed into `dir`
    ///
    /// Returns the number of files written. Stops at the first failure;
    /// packages not yet saved keep their pending changes.
    pub fn flush<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, PackageError> {
        let dir = dir.as_ref();
        let mut saved = 0;

        for (filename, package) in self.packages.iter_mut() {
            if package.config().changes().is_empty() {
                continue;
            }
            package.config().save(dir.join(filename))?;
            let changes = package.take_config_changes();
            log::debug!("Saved dungeon package {} ({:?})", filename, changes);
            saved += 1;
        }

        if saved > 0 {
            log::info!("Saved {} dungeon packages to {}", saved, dir.display());
        }
        Ok(saved)
    }

    // --- Accessors ---

    /// Get a package by filename
    pub fn get(&self, filename: &str) -> Option<&DungeonPackage> {
        self.packages.get(filename)
    }

    /// Get a mutable package by filename
    pub fn get_mut(&mut self, filename: &str) -> Option<&mut DungeonPackage> {
        self.packages.get_mut(filename)
    }

    /// Iterate over packages in filename order
    pub fn packages(&self) -> impl Iterator<Item = &DungeonPackage> {
        self.packages.values()
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn package_mut(&mut self, filename: &str) -> Result<&mut DungeonPackage, PackageError> {
        self.packages
            .get_mut(filename)
            .ok_or_else(|| PackageError::NotLoaded(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_package::{DryRunEngine, StructurePackage};
    use crate::catalog::{BossCatalog, ChestCatalog};
    use crate::world::BossEntity;

    fn dry_run(config: &PackageConfig) -> Box<dyn BasePackage> {
        Box::new(StructurePackage::new(config, Box::new(DryRunEngine)))
    }

    fn package(config: PackageConfig) -> DungeonPackage {
        let base = dry_run(&config);
        DungeonPackage::new(config, base)
    }

    fn crypt() -> PackageConfig {
        PackageConfig::new("crypt.ron")
            .with_structure("crypt.schem")
            .with_placement(Vec3::new(0.0, 64.0, 0.0), 0.0)
            .with_boss("lich.yml:0,0,0")
            .with_chest("gold.yml:1,0,0")
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("dungeon_core_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_base_initialize_and_owner_lookup() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.add_package(package(PackageConfig::new("tower.ron").with_boss("golem.yml:0,5,0")));

        assert_eq!(manager.base_initialize(), 3);
        assert_eq!(manager.owner_of("lich.yml").unwrap().id().as_str(), "crypt.ron");
        assert_eq!(manager.owner_of("golem.yml").unwrap().id().as_str(), "tower.ron");
        assert!(manager.owner_of("dragon.yml").is_none());
    }

    #[test]
    fn test_collision_reject_keeps_first_owner() {
        let mut manager = PackageManager::with_policy(CollisionPolicy::Reject);
        manager.add_package(package(crypt()));
        manager.add_package(package(PackageConfig::new("tower.ron").with_boss("lich.yml:0,5,0")));

        // crypt.ron sorts first and claims the key
        assert_eq!(manager.base_initialize(), 2);
        assert_eq!(manager.owner_of("lich.yml").unwrap().id().as_str(), "crypt.ron");
    }

    #[test]
    fn test_remove_package_unregisters() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.base_initialize();

        assert!(manager.remove_package("crypt.ron").is_some());
        assert!(manager.registry().is_empty());
        assert!(manager.remove_package("crypt.ron").is_none());
    }

    #[test]
    fn test_install_unknown_package() {
        let mut manager = PackageManager::new();
        let mut world = World::new();
        let (bosses, chests) = (BossCatalog::new(), ChestCatalog::new());
        let mut ctx = DungeonContext::new(&mut world, &bosses, &chests);

        let result = manager.install("missing.ron", "admin", true, &mut ctx);
        assert!(matches!(result, Err(PackageError::NotLoaded(_))));
    }

    #[test]
    fn test_install_and_owner_of_boss() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.base_initialize();

        let mut world = World::new();
        let bosses = BossCatalog::new().with(BossDefinition::new("lich.yml", 4));
        let chests = ChestCatalog::new().with(ChestDefinition::new("gold.yml"));
        let mut ctx = DungeonContext::new(&mut world, &bosses, &chests);
        assert!(manager.install("crypt.ron", "admin", true, &mut ctx).unwrap());

        let boss = manager.get("crypt.ron").unwrap().attached_bosses()[0];
        assert_eq!(manager.owner_of_boss(&world, boss).unwrap().id().as_str(), "crypt.ron");

        // A stray boss with a registered definition resolves through the registry
        let stray = world.spawn_boss(BossEntity::new(&BossDefinition::new("lich.yml", 4), Vec3::ZERO));
        assert_eq!(manager.owner_of_boss(&world, stray).unwrap().id().as_str(), "crypt.ron");

        assert!(manager.uninstall("crypt.ron", "admin", &mut world).unwrap());
        assert_eq!(world.boss_count(), 1);
    }

    #[test]
    fn test_add_boss_registers_key() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.base_initialize();

        let rat = BossDefinition::new("rat.yml", 1);
        manager.add_boss("crypt.ron", &rat, Vec3::new(2.0, 64.0, 0.0)).unwrap();
        assert_eq!(manager.owner_of("rat.yml").unwrap().id().as_str(), "crypt.ron");
        assert!(manager.get("crypt.ron").unwrap().boss_locations().contains_key("rat.yml"));
    }

    #[test]
    fn test_add_chest_rejected_by_registry() {
        let mut manager = PackageManager::with_policy(CollisionPolicy::Reject);
        manager.add_package(package(crypt()));
        manager.add_package(package(
            PackageConfig::new("tower.ron").with_placement(Vec3::ZERO, 0.0),
        ));
        manager.base_initialize();

        let result = manager.add_chest("tower.ron", "gold.yml", Vec3::ZERO);
        assert!(matches!(result, Err(PackageError::Registry(_))));
        assert!(manager.get("tower.ron").unwrap().chest_locations().is_empty());
    }

    #[test]
    fn test_attach_boss_requires_install() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        let mut world = World::new();

        let rat = BossDefinition::new("rat.yml", 1);
        let result = manager.attach_boss("crypt.ron", &rat, Vec3::ZERO, &mut world);
        assert!(matches!(result, Err(PackageError::NotInstalled(_))));
        assert!(manager.owner_of("rat.yml").is_none());
    }

    #[test]
    fn test_failed_add_leaves_registry_unchanged() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.add_package(package(PackageConfig::new("floating.ron")));
        manager.base_initialize();

        let rat = BossDefinition::new("rat.yml", 1);
        let result = manager.add_boss("floating.ron", &rat, Vec3::ZERO);
        assert!(matches!(result, Err(PackageError::MissingAnchor(_))));
        assert!(manager.owner_of("rat.yml").is_none());
        assert!(manager.get("floating.ron").unwrap().config().relative_boss_locations.is_empty());

        // A key already owned elsewhere goes back to its owner
        let result = manager.add_chest("floating.ron", "gold.yml", Vec3::ZERO);
        assert!(matches!(result, Err(PackageError::MissingAnchor(_))));
        assert_eq!(manager.owner_of("gold.yml").unwrap().id().as_str(), "crypt.ron");
    }

    #[test]
    fn test_remove_boss_through_manager() {
        let mut manager = PackageManager::new();
        manager.add_package(package(crypt()));
        manager.base_initialize();

        let mut world = World::new();
        let bosses = BossCatalog::new().with(BossDefinition::new("lich.yml", 4));
        let chests = ChestCatalog::new();
        let mut ctx = DungeonContext::new(&mut world, &bosses, &chests);
        manager.install("crypt.ron", "admin", false, &mut ctx).unwrap();

        let boss = manager.get("crypt.ron").unwrap().attached_bosses()[0];
        assert_eq!(manager.remove_boss(&world, boss).unwrap(), 1);

        let unowned = world.spawn_boss(BossEntity::new(&BossDefinition::new("rat.yml", 1), Vec3::ZERO));
        assert_eq!(manager.remove_boss(&world, unowned).unwrap(), 0);
    }

    #[test]
    fn test_load_dir_and_flush() {
        let dir = temp_dir("manager_flush");
        crypt().save(dir.join("crypt.ron")).unwrap();
        fs::write(dir.join("broken.ron"), "(name: ").unwrap();

        let mut manager = PackageManager::new();
        assert_eq!(manager.load_dir(&dir, dry_run).unwrap(), 1);
        assert!(manager.get("crypt.ron").is_some());

        // Nothing changed yet
        assert_eq!(manager.flush(&dir).unwrap(), 0);

        manager
            .add_chest("crypt.ron", "silver.yml", Vec3::new(0.0, 64.0, 3.0))
            .unwrap();
        assert_eq!(manager.flush(&dir).unwrap(), 1);
        assert_eq!(manager.flush(&dir).unwrap(), 0);

        let reloaded = PackageConfig::load(dir.join("crypt.ron")).unwrap();
        assert_eq!(reloaded.relative_treasure_chest_locations.len(), 2);

        let _ = fs::remove_dir_all(dir);
    }
}

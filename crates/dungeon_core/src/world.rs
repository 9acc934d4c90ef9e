//! Live entity world
//!
//! Holds the boss and treasure chest instances currently present in the
//! world. Packages never own these; they keep generational keys and resolve
//! them here, so a key to a removed entity simply stops resolving.

use std::fmt;

use slotmap::{new_key_type, SlotMap};

use dungeon_math::Vec3;

use crate::catalog::BossDefinition;
use crate::registry::PackageId;

new_key_type! {
    /// Key to a live boss in the world
    pub struct BossKey;

    /// Key to a live treasure chest in the world
    pub struct ChestKey;
}

/// Why a boss is being removed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalReason {
    /// Removed by an administrative command (uninstall)
    RemoveCommand,
    /// Killed
    Death,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::RemoveCommand => write!(f, "remove command"),
            RemovalReason::Death => write!(f, "death"),
        }
    }
}

/// A boss instance bound to a spawn location
#[derive(Clone, Debug)]
pub struct BossEntity {
    definition_key: String,
    level: i32,
    spawn_location: Vec3,
    owner: Option<PackageId>,
    spawned: bool,
}

impl BossEntity {
    /// Create an unspawned boss from its definition
    pub fn new(definition: &BossDefinition, spawn_location: Vec3) -> Self {
        Self {
            definition_key: definition.filename.clone(),
            level: definition.level,
            spawn_location,
            owner: None,
            spawned: false,
        }
    }

    /// Bind the boss to a package
    pub fn with_owner(mut self, owner: Option<PackageId>) -> Self {
        self.owner = owner;
        self
    }

    /// Catalog filename this boss was built from
    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    /// Difficulty level
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Where the boss (re)spawns
    pub fn spawn_location(&self) -> Vec3 {
        self.spawn_location
    }

    /// Package this boss belongs to, if any
    pub fn owner(&self) -> Option<&PackageId> {
        self.owner.as_ref()
    }

    /// Whether the boss has been spawned into the world
    pub fn is_spawned(&self) -> bool {
        self.spawned
    }
}

/// A treasure chest instance at a location
#[derive(Clone, Debug)]
pub struct TreasureChest {
    definition_key: String,
    location: Vec3,
    owner: Option<PackageId>,
}

impl TreasureChest {
    pub fn new(definition_key: impl Into<String>, location: Vec3) -> Self {
        Self {
            definition_key: definition_key.into(),
            location,
            owner: None,
        }
    }

    /// Bind the chest to a package
    pub fn with_owner(mut self, owner: Option<PackageId>) -> Self {
        self.owner = owner;
        self
    }

    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn owner(&self) -> Option<&PackageId> {
        self.owner.as_ref()
    }
}

/// All live bosses and chests
#[derive(Default)]
pub struct World {
    bosses: SlotMap<BossKey, BossEntity>,
    chests: SlotMap<ChestKey, TreasureChest>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            bosses: SlotMap::with_key(),
            chests: SlotMap::with_key(),
        }
    }

    /// Spawn a boss and return its key
    pub fn spawn_boss(&mut self, mut boss: BossEntity) -> BossKey {
        boss.spawned = true;
        log::debug!(
            "Spawned boss {} (level {}) at {}",
            boss.definition_key, boss.level, boss.spawn_location
        );
        self.bosses.insert(boss)
    }

    /// Remove a boss, returning it if the key was still live
    pub fn remove_boss(&mut self, key: BossKey, reason: RemovalReason) -> Option<BossEntity> {
        let mut boss = self.bosses.remove(key)?;
        boss.spawned = false;
        log::debug!("Removed boss {} ({})", boss.definition_key, reason);
        Some(boss)
    }

    /// Place a chest and return its key
    pub fn place_chest(&mut self, chest: TreasureChest) -> ChestKey {
        log::debug!("Placed chest {} at {}", chest.definition_key, chest.location);
        self.chests.insert(chest)
    }

    /// Remove a chest, returning it if the key was still live
    pub fn remove_chest(&mut self, key: ChestKey) -> Option<TreasureChest> {
        let chest = self.chests.remove(key)?;
        log::debug!("Removed chest {}", chest.definition_key);
        Some(chest)
    }

    pub fn boss(&self, key: BossKey) -> Option<&BossEntity> {
        self.bosses.get(key)
    }

    pub fn chest(&self, key: ChestKey) -> Option<&TreasureChest> {
        self.chests.get(key)
    }

    /// Iterate over live bosses with their keys
    pub fn bosses(&self) -> impl Iterator<Item = (BossKey, &BossEntity)> {
        self.bosses.iter()
    }

    /// Iterate over live chests with their keys
    pub fn chests(&self) -> impl Iterator<Item = (ChestKey, &TreasureChest)> {
        self.chests.iter()
    }

    #[inline]
    pub fn boss_count(&self) -> usize {
        self.bosses.len()
    }

    #[inline]
    pub fn chest_count(&self) -> usize {
        self.chests.len()
    }

    /// Bind an already-live boss to a package if it has no owner yet
    pub(crate) fn claim_boss(&mut self, key: BossKey, owner: &PackageId) {
        if let Some(boss) = self.bosses.get_mut(key) {
            if boss.owner.is_none() {
                boss.owner = Some(owner.clone());
            }
        }
    }

    /// Bind an already-live chest to a package if it has no owner yet
    pub(crate) fn claim_chest(&mut self, key: ChestKey, owner: &PackageId) {
        if let Some(chest) = self.chests.get_mut(key) {
            if chest.owner.is_none() {
                chest.owner = Some(owner.clone());
            }
        }
    }
}

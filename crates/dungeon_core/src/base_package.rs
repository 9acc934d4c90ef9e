//! Base package contract
//!
//! The base package owns the structure itself: pasting it into the world on
//! install and removing it on uninstall. Dungeon packages decorate it with
//! boss and chest content. The paste/removal work is delegated to a
//! [`StructureEngine`], which is the only thing that touches world blocks.

use std::fmt;

use crate::package_config::PackageConfig;
use crate::registry::PackageId;
use crate::transform::PackageTransform;

/// Pastes and removes structures in the world
pub trait StructureEngine {
    /// Whether the engine can find the structure file
    fn has_structure(&self, structure: &str) -> bool;

    /// Paste `structure` at the given placement
    fn paste(&mut self, structure: &str, placement: &PackageTransform) -> Result<(), StructureError>;

    /// Remove a previously pasted `structure`
    fn remove(&mut self, structure: &str, placement: &PackageTransform) -> Result<(), StructureError>;
}

/// Error pasting or removing a structure
#[derive(Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Structure file unknown to the engine
    NotFound(String),
    /// The engine refused or failed the operation
    Failed(String),
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::NotFound(name) => write!(f, "structure not found: {}", name),
            StructureError::Failed(msg) => write!(f, "structure operation failed: {}", msg),
        }
    }
}

impl std::error::Error for StructureError {}

/// The contract a dungeon package builds on
pub trait BasePackage {
    /// Load-time setup, before any world content exists
    fn base_initialization(&mut self) {}

    /// Called once the world is available
    fn initialize_content(&mut self) {}

    /// Place the structure; returns `false` if nothing was installed
    fn install(&mut self, requester: &str, paste: bool, placement: &PackageTransform) -> bool;

    /// Remove the structure; returns `false` if it is still installed
    fn uninstall(&mut self, requester: &str, placement: &PackageTransform) -> bool;

    fn is_installed(&self) -> bool;
}

/// A base package backed by a single structure file
pub struct StructurePackage {
    id: PackageId,
    structure: Option<String>,
    structure_available: bool,
    installed: bool,
    engine: Box<dyn StructureEngine>,
}

impl StructurePackage {
    /// Create from configuration; the installed flag starts as `config.enabled`
    pub fn new(config: &PackageConfig, engine: Box<dyn StructureEngine>) -> Self {
        Self {
            id: PackageId::new(config.filename.as_str()),
            structure: config.structure.clone(),
            structure_available: true,
            installed: config.enabled,
            engine,
        }
    }
}

impl BasePackage for StructurePackage {
    fn base_initialization(&mut self) {
        if let Some(structure) = &self.structure {
            self.structure_available = self.engine.has_structure(structure);
            if !self.structure_available {
                log::warn!(
                    "Structure {} for dungeon package {} was not found",
                    structure, self.id
                );
            }
        }
    }

    fn initialize_content(&mut self) {
        if self.installed && !self.structure_available {
            log::warn!(
                "Dungeon package {} is marked installed but its structure is missing",
                self.id
            );
        }
    }

    fn install(&mut self, requester: &str, paste: bool, placement: &PackageTransform) -> bool {
        if self.installed {
            log::warn!("{} tried to install {}, which is already installed", requester, self.id);
            return false;
        }

        if paste {
            let Some(structure) = self.structure.as_deref() else {
                log::warn!("Dungeon package {} has no structure to paste", self.id);
                return false;
            };
            if !self.structure_available {
                log::warn!("Cannot install {}: structure {} is missing", self.id, structure);
                return false;
            }
            if let Err(e) = self.engine.paste(structure, placement) {
                log::warn!("Failed to paste {} for {}: {}", structure, self.id, e);
                return false;
            }
        }

        self.installed = true;
        log::info!("{} installed {} at {}", requester, self.id, placement.anchor);
        true
    }

    fn uninstall(&mut self, requester: &str, placement: &PackageTransform) -> bool {
        if !self.installed {
            log::warn!("{} tried to uninstall {}, which is not installed", requester, self.id);
            return false;
        }

        if let Some(structure) = self.structure.as_deref() {
            if let Err(e) = self.engine.remove(structure, placement) {
                log::warn!("Failed to remove {} for {}: {}", structure, self.id, e);
                return false;
            }
        }

        self.installed = false;
        log::info!("{} uninstalled {}", requester, self.id);
        true
    }

    fn is_installed(&self) -> bool {
        self.installed
    }
}

/// Engine that only logs what it would do
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunEngine;

impl StructureEngine for DryRunEngine {
    fn has_structure(&self, _structure: &str) -> bool {
        true
    }

    fn paste(&mut self, structure: &str, placement: &PackageTransform) -> Result<(), StructureError> {
        log::info!(
            "[dry run] paste {} at {} rotated {} degrees",
            structure,
            placement.anchor,
            placement.rotation.degrees()
        );
        Ok(())
    }

    fn remove(&mut self, structure: &str, placement: &PackageTransform) -> Result<(), StructureError> {
        log::info!("[dry run] remove {} at {}", structure, placement.anchor);
        Ok(())
    }
}

//! Content registry
//!
//! Maps content keys (boss and chest catalog filenames) to the package that
//! places them. The registry is filled once during base registration and is
//! independent of whether a package is currently installed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a dungeon package (its configuration filename)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What to do when a key is registered by a second package
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Last writer wins, silently
    #[default]
    Overwrite,
    /// Last writer wins, with a warning
    Warn,
    /// First writer keeps the key; the registration fails
    Reject,
}

/// Error registering content
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Key already belongs to another package and the policy is `Reject`
    Collision {
        key: String,
        owner: PackageId,
        rejected: PackageId,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Collision { key, owner, rejected } => write!(
                f,
                "content '{}' already belongs to package {}; not reassigned to {}",
                key, owner, rejected
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Content key → owning package
#[derive(Debug, Default)]
pub struct ContentRegistry {
    entries: HashMap<String, PackageId>,
    policy: CollisionPolicy,
}

impl ContentRegistry {
    /// Create an empty registry with the default (overwrite) policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given collision policy
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    /// Associate `key` with `package`
    ///
    /// Returns the previous owner if the key was already registered.
    /// Re-registering a key for the package that already owns it is never
    /// a collision.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        package: &PackageId,
    ) -> Result<Option<PackageId>, RegistryError> {
        let key = key.into();

        if let Some(owner) = self.entries.get(&key) {
            if owner != package {
                match self.policy {
                    CollisionPolicy::Overwrite => {}
                    CollisionPolicy::Warn => {
                        log::warn!(
                            "Content '{}' was registered by {} and is now claimed by {}",
                            key, owner, package
                        );
                    }
                    CollisionPolicy::Reject => {
                        return Err(RegistryError::Collision {
                            key,
                            owner: owner.clone(),
                            rejected: package.clone(),
                        });
                    }
                }
            }
        }

        Ok(self.entries.insert(key, package.clone()))
    }

    /// Resolve the package that owns `key`
    pub fn lookup(&self, key: &str) -> Option<&PackageId> {
        self.entries.get(key)
    }

    /// All keys owned by `package`
    pub fn keys_for<'a>(&'a self, package: &'a PackageId) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, owner)| *owner == package)
            .map(|(key, _)| key.as_str())
    }

    /// Put `key` back to the owner it had before a [`register`](Self::register)
    pub(crate) fn restore(&mut self, key: &str, previous: Option<PackageId>) {
        match previous {
            Some(owner) => {
                self.entries.insert(key.to_string(), owner);
            }
            None => {
                self.entries.remove(key);
            }
        }
    }

    /// Drop every key owned by `package`, returning how many were removed
    pub fn unregister_package(&mut self, package: &PackageId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, owner| owner != package);
        before - self.entries.len()
    }

    /// Number of registered keys
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

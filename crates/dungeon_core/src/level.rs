//! Difficulty level bounds
//!
//! Informational only: the lowest and highest level among the bosses a
//! package currently has attached.

use std::fmt;

use crate::world::{BossKey, World};

/// Inclusive `lowest..=highest` level range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelBounds {
    pub lowest: i32,
    pub highest: i32,
}

impl LevelBounds {
    /// Bounds of a set of levels, or `None` if the set is empty
    pub fn from_levels(levels: impl IntoIterator<Item = i32>) -> Option<Self> {
        levels.into_iter().fold(None, |bounds, level| {
            Some(match bounds {
                None => Self { lowest: level, highest: level },
                Some(b) => Self {
                    lowest: b.lowest.min(level),
                    highest: b.highest.max(level),
                },
            })
        })
    }

    /// Bounds across the given bosses; keys that no longer resolve are ignored
    pub fn qualify(world: &World, bosses: &[BossKey]) -> Option<Self> {
        Self::from_levels(
            bosses
                .iter()
                .filter_map(|&key| world.boss(key))
                .map(|boss| boss.level()),
        )
    }
}

impl fmt::Display for LevelBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lowest == self.highest {
            write!(f, "{}", self.lowest)
        } else {
            write!(f, "{}-{}", self.lowest, self.highest)
        }
    }
}

//! Dungeon packager
//!
//! Application layer over `dungeon_core`: configuration loading and the
//! pieces the command-line driver shares with tests.

pub mod config;

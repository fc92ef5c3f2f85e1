//! DDR Finder Library
//!
//! Locations API client, the bounds-aware result cache in front of it, and the
//! background loader the terminal viewer drives. Exposed as a library for the
//! binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod loader;
pub mod prefs;
pub mod share;

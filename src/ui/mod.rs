//! UI rendering module for DDR Finder
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod location_detail;
pub mod location_list;

pub use help_overlay::render as render_help_overlay;
pub use location_detail::render as render_location_detail;
pub use location_list::render_location_list;

//! Cache module for avoiding redundant location requests
//!
//! This module provides a bounds cache that remembers which rectangles have
//! already been fetched for each data source and answers covered queries from
//! memory, merging overlapping partial results.

mod bounds_cache;

pub use bounds_cache::{fetch_bounds, BoundsCache, SMALL_BOX_MARGIN, SMALL_BOX_SPAN};

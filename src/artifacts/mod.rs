//! Data structures and algorithms
//!
//! This module contains the core types and algorithms:
//!
//! - `core`: Shared utilities (pager wrapper, clock, debounce scheduler)
//! - `diff`: Line-level edit scripts (Myers' and patience diff) and their
//!   compressed codec
//! - `unified`: Unified-diff wire format (hunks, rendering, parsing,
//!   patching)
//! - `overlay`: Live preview overlays layered over immutable baselines
//! - `version`: Version-graph value types (versions, patches, branches,
//!   tags)

pub mod core;
pub mod diff;
pub mod overlay;
pub mod unified;
pub mod version;

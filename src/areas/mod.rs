//! Core working areas
//!
//! This module contains the stateful components the facade composes:
//!
//! - `overlay_store`: In-memory preview overlays with TTL and baselines
//! - `version_graph`: Immutable version DAG with branches and tags
//! - `bridge`: Boundary to an external persistence backend
//! - `semantic`: Optional structural analyzer seam
//! - `workbench`: High-level coordination and event stream

pub mod bridge;
pub mod overlay_store;
pub mod semantic;
pub mod version_graph;
pub mod workbench;

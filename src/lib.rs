//! Line-level diff engine with overlay previews and a lightweight version
//! graph
//!
//! The crate is split into three layers:
//!
//! - [`artifacts`]: value types and algorithms (edit scripts, the compressed
//!   wire envelope, unified-diff hunks, overlays, versions)
//! - [`areas`]: stateful components (overlay store, version graph,
//!   persistence bridge, workbench facade)
//! - [`commands`]: CLI entry points over the unified wire format
//!
//! Most callers only need the [`Workbench`] facade.

pub mod areas;
pub mod artifacts;
pub mod commands;

pub use areas::workbench::{CoreEvent, PreviewOptions, Workbench, WorkbenchOptions};

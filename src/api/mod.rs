//! Family Tree Viewer WASM API
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros, serde conversions and error mapping
//! - `browser`: `fetch`, clock and download implementations of the viewer's I/O traits
//! - `viewer`: the `FamilyTreeViewer` class exported to JavaScript

pub mod helpers;

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod viewer;

#[cfg(target_arch = "wasm32")]
pub use viewer::FamilyTreeViewer;

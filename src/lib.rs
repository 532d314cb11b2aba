//! Family Tree Viewer WASM Module
//!
//! Interactive viewer for an SVG family tree: pan and zoom with mouse, wheel
//! or touch, focus and highlight members, fill member nodes from person
//! records, and export the tree as a standalone SVG file.
//!
//! The browser is reached only through the traits in [`graphic`],
//! [`controller`] and [`export`], so everything except the `api` bindings
//! runs natively against [`graphic::MemorySurface`].

pub mod api;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod export;
pub mod graphic;
pub mod models;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use controller::{ViewerState, ViewportController};
pub use error::{Result, ViewerError};
pub use models::*;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();
    log::info!("Family Tree Viewer WASM module initialized");
}

#[cfg(feature = "console_log")]
fn init_logging() {
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        crate::wasm_warn!("logger already initialized: {}", e);
    }
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}

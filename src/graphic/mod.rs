//! Tree graphic access
//!
//! The controller never touches the DOM directly. Everything it needs from
//! the displayed graphic goes through [`GraphicSurface`], which is backed by
//! the live browser DOM in the page and by an in-memory SVG tree elsewhere.

pub mod memory;
pub mod svg_tree;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use memory::MemorySurface;
pub use svg_tree::SvgTree;

use kurbo::{Affine, Rect};

use crate::error::Result;
use crate::models::Camera;

/// Element provider for one displayed tree graphic
pub trait GraphicSurface {
    /// Replace the displayed graphic with `markup`
    fn mount(&mut self, markup: &str) -> Result<()>;

    /// Replace the displayed content with a static message
    fn show_error(&mut self, message: &str);

    fn is_mounted(&self) -> bool;

    fn contains(&self, id: &str) -> bool;

    fn has_class(&self, id: &str, class: &str) -> bool;

    /// Add `class` to the element; false if the element is missing
    fn add_class(&mut self, id: &str, class: &str) -> bool;

    /// Remove `class` from the element; false if the element is missing
    fn remove_class(&mut self, id: &str, class: &str) -> bool;

    /// Ids of every element carrying `class`, in document order
    fn ids_with_class(&self, class: &str) -> Vec<String>;

    /// Bounding box in the element's local user space
    fn bbox(&self, id: &str) -> Option<Rect>;

    /// Local-to-global transform of the element
    fn ctm(&self, id: &str) -> Option<Affine>;

    /// Apply the camera to the graphic with the given CSS transition
    fn apply_transform(&mut self, camera: &Camera, transition: &str);

    /// Flush pending style so a re-added class restarts its animation
    fn force_reflow(&mut self, _id: &str) {}

    /// Point the member's `.img-container` image at `href`
    fn set_member_image(&mut self, id: &str, href: &str) -> bool;

    /// Set the text of the first `tspan` under the member's `part_class` element
    fn set_member_text(&mut self, id: &str, part_class: &str, text: &str) -> bool;

    /// Current markup of the whole graphic, camera styling included
    fn snapshot(&self) -> Result<String>;
}

//! Models module for the family tree viewer
//!
//! Camera and gesture state, SVG geometry helpers and the person records
//! shown in the tree.

pub mod camera;
pub mod gesture;
pub mod geometry;
pub mod member;

// Re-export commonly used types
pub use camera::Camera;
pub use gesture::{GestureState, PointerInput};
pub use member::{DisplayFields, PersonRecord, SearchOutcome};
